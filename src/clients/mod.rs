pub mod groq;
pub mod gsheet;
pub mod serpapi;

pub use groq::GroqClient;
pub use gsheet::SheetClient;
pub use serpapi::SerpClient;
