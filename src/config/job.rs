use crate::config::CliConfig;
use crate::core::ConfigProvider;
use crate::domain::model::DataSource;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub source: SourceSection,
    pub extract: ExtractSection,
    pub search: Option<SearchSection>,
    pub load: LoadSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// "csv" 或 "google-sheet"
    pub r#type: String,
    pub path: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractSection {
    pub entity_column: String,
    pub query_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    pub output_path: String,
}

impl JobConfig {
    /// 從 TOML 檔案載入工作設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析工作設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        let config: JobConfig =
            toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 直接用 CLI 旗標組出同一份設定
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let (source_type, path, url) = match (&cli.csv, &cli.sheet_url) {
            (Some(p), _) => ("csv", Some(p.clone()), None),
            (None, Some(u)) => ("google-sheet", None, Some(u.clone())),
            (None, None) => {
                return Err(EtlError::MissingConfigError {
                    field: "--csv or --sheet-url".to_string(),
                })
            }
        };

        let entity_column = validate_required_field("--column", &cli.column)?.clone();
        let query_template = validate_required_field("--template", &cli.template)?.clone();

        let config = JobConfig {
            job: JobSection {
                name: "cli".to_string(),
                description: None,
            },
            source: SourceSection {
                r#type: source_type.to_string(),
                path,
                url,
            },
            extract: ExtractSection {
                entity_column,
                query_template,
            },
            search: Some(SearchSection {
                delay_ms: Some(cli.delay_ms),
            }),
            load: LoadSection {
                output_path: cli.output_path.clone(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${API_KEY})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    fn validate_config(&self) -> Result<()> {
        match self.source.r#type.as_str() {
            "csv" => {
                let path = validate_required_field("source.path", &self.source.path)?;
                validate_path("source.path", path)?;
            }
            "google-sheet" => {
                let url = validate_required_field("source.url", &self.source.url)?;
                validate_url("source.url", url)?;
            }
            other => {
                return Err(EtlError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: "Supported source types: csv, google-sheet".to_string(),
                })
            }
        }

        validate_non_empty_string("extract.entity_column", &self.extract.entity_column)?;
        validate_non_empty_string("extract.query_template", &self.extract.query_template)?;
        validate_path("load.output_path", &self.load.output_path)?;

        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn source(&self) -> DataSource {
        match self.source.r#type.as_str() {
            "csv" => DataSource::Csv {
                path: self.source.path.clone().unwrap_or_default(),
            },
            _ => DataSource::GoogleSheet {
                url: self.source.url.clone().unwrap_or_default(),
            },
        }
    }

    fn entity_column(&self) -> &str {
        &self.extract.entity_column
    }

    fn query_template(&self) -> &str {
        &self.extract.query_template
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn search_delay(&self) -> Duration {
        let delay_ms = self
            .search
            .as_ref()
            .and_then(|s| s.delay_ms)
            .unwrap_or(DEFAULT_DELAY_MS);
        Duration::from_millis(delay_ms)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_a_basic_csv_job() {
        let toml_content = r#"
[job]
name = "company-countries"
description = "Look up the country for each company"

[source]
type = "csv"
path = "./companies.csv"

[extract]
entity_column = "company"
query_template = "Where is {entity} headquartered?"

[load]
output_path = "./output"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.job.name, "company-countries");
        assert_eq!(
            config.source(),
            DataSource::Csv {
                path: "./companies.csv".to_string()
            }
        );
        assert_eq!(config.entity_column(), "company");
        assert_eq!(config.search_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn parses_a_sheet_job_with_delay_override() {
        let toml_content = r#"
[job]
name = "sheet-job"

[source]
type = "google-sheet"
url = "https://docs.google.com/spreadsheets/d/abc123/edit"

[extract]
entity_column = "Entity"
query_template = "Where is {entity}?"

[search]
delay_ms = 250

[load]
output_path = "./output"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.search_delay(), Duration::from_millis(250));
        assert!(matches!(config.source(), DataSource::GoogleSheet { .. }));
    }

    #[test]
    fn substitutes_environment_variables() {
        std::env::set_var("TEST_SHEET_URL", "https://docs.google.com/spreadsheets/d/env1/edit");

        let toml_content = r#"
[job]
name = "env-job"

[source]
type = "google-sheet"
url = "${TEST_SHEET_URL}"

[extract]
entity_column = "Entity"
query_template = "Where is {entity}?"

[load]
output_path = "./output"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.source.url.as_deref(),
            Some("https://docs.google.com/spreadsheets/d/env1/edit")
        );

        std::env::remove_var("TEST_SHEET_URL");
    }

    #[test]
    fn rejects_unknown_source_type() {
        let toml_content = r#"
[job]
name = "bad"

[source]
type = "ftp"
path = "./x"

[extract]
entity_column = "Entity"
query_template = "Where is {entity}?"

[load]
output_path = "./output"
"#;

        assert!(JobConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn rejects_csv_job_without_path() {
        let toml_content = r#"
[job]
name = "bad"

[source]
type = "csv"

[extract]
entity_column = "Entity"
query_template = "Where is {entity}?"

[load]
output_path = "./output"
"#;

        let result = JobConfig::from_toml_str(toml_content);
        assert!(matches!(result, Err(EtlError::MissingConfigError { .. })));
    }

    #[test]
    fn from_cli_requires_column_and_template() {
        let cli = CliConfig {
            job: None,
            csv: Some("./companies.csv".to_string()),
            sheet_url: None,
            column: None,
            template: Some("Where is {entity}?".to_string()),
            output_path: "./output".to_string(),
            delay_ms: 1000,
            verbose: false,
        };

        let result = JobConfig::from_cli(&cli);
        assert!(matches!(result, Err(EtlError::MissingConfigError { .. })));
    }

    #[test]
    fn from_cli_requires_a_source() {
        let cli = CliConfig {
            job: None,
            csv: None,
            sheet_url: None,
            column: Some("company".to_string()),
            template: Some("Where is {entity}?".to_string()),
            output_path: "./output".to_string(),
            delay_ms: 1000,
            verbose: false,
        };

        let result = JobConfig::from_cli(&cli);
        assert!(matches!(result, Err(EtlError::MissingConfigError { .. })));
    }

    #[test]
    fn from_cli_builds_a_validated_job() {
        let cli = CliConfig {
            job: None,
            csv: Some("./companies.csv".to_string()),
            sheet_url: None,
            column: Some("company".to_string()),
            template: Some("Where is {entity}?".to_string()),
            output_path: "./output".to_string(),
            delay_ms: 500,
            verbose: false,
        };

        let config = JobConfig::from_cli(&cli).unwrap();
        assert_eq!(config.entity_column(), "company");
        assert_eq!(config.search_delay(), Duration::from_millis(500));
    }

    #[test]
    fn loads_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[job]
name = "file-job"

[source]
type = "csv"
path = "./input.csv"

[extract]
entity_column = "Entity"
query_template = "Where is {entity}?"

[load]
output_path = "./output"
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = JobConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name, "file-job");
    }
}
