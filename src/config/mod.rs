pub mod cli;
pub mod job;

use crate::utils::error::{EtlError, Result};
use clap::Parser;
use std::path::Path;

pub use cli::LocalStorage;
pub use job::JobConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "entity-enrich")]
#[command(about = "Enrich a table of entities with web search + LLM answers")]
pub struct CliConfig {
    /// TOML job file (overrides the source/column/template flags)
    #[arg(long)]
    pub job: Option<String>,

    /// Path to the input CSV file
    #[arg(long, conflicts_with = "sheet_url")]
    pub csv: Option<String>,

    /// Google Sheets share URL (first worksheet is read)
    #[arg(long)]
    pub sheet_url: Option<String>,

    /// Column holding the entity to search for
    #[arg(long)]
    pub column: Option<String>,

    /// Search query template, e.g. "Where is {entity} headquartered?"
    #[arg(long)]
    pub template: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Delay after each successful search request
    #[arg(long, default_value = "1000")]
    pub delay_ms: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// 啟動時一次讀入的 API 憑證，缺一不可
#[derive(Debug, Clone)]
pub struct Credentials {
    pub serpapi_key: String,
    pub groq_api_key: String,
    pub google_creds_path: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let serpapi_key = Self::non_empty_var("SERPAPI_KEY");
        let groq_api_key = Self::non_empty_var("GROQ_API_KEY");
        let google_creds_path =
            Self::non_empty_var("GOOGLE_CREDS_PATH").filter(|p| Path::new(p).exists());

        let missing = Self::missing_items(&serpapi_key, &groq_api_key, &google_creds_path);
        if !missing.is_empty() {
            return Err(EtlError::ConfigError {
                message: format!("Missing API keys: {}", missing.join(", ")),
            });
        }

        Ok(Self {
            serpapi_key: serpapi_key.unwrap_or_default(),
            groq_api_key: groq_api_key.unwrap_or_default(),
            google_creds_path: google_creds_path.unwrap_or_default(),
        })
    }

    fn non_empty_var(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn missing_items(
        serpapi_key: &Option<String>,
        groq_api_key: &Option<String>,
        google_creds_path: &Option<String>,
    ) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if serpapi_key.is_none() {
            missing.push("SERPAPI_KEY");
        }
        if groq_api_key.is_none() {
            missing.push("GROQ_API_KEY");
        }
        if google_creds_path.is_none() {
            missing.push("GOOGLE_CREDS_PATH");
        }
        missing
    }
}
