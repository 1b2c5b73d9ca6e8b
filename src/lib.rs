pub mod clients;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use clients::{GroqClient, SerpClient, SheetClient};
pub use config::{CliConfig, Credentials, JobConfig, LocalStorage};
pub use core::{etl::EtlEngine, pipeline::ExtractionPipeline};
pub use utils::error::{EtlError, Result};
