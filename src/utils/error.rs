use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Config,
    Auth,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::AuthError { .. } => ErrorCategory::Auth,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Config,
            EtlError::ProcessingError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::AuthError { .. } => ErrorSeverity::Critical,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) => format!("無法連線到遠端 API: {}", e),
            EtlError::CsvError(e) => format!("CSV 資料格式有誤: {}", e),
            EtlError::IoError(e) => format!("檔案讀寫失敗: {}", e),
            EtlError::SerializationError(e) => format!("資料序列化失敗: {}", e),
            EtlError::AuthError { message } => format!("憑證驗證失敗: {}", message),
            EtlError::MissingConfigError { field } => {
                format!("缺少必要設定: {}", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值不正確 ({}): {}", field, reason)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the API base URLs, then rerun.",
            ErrorCategory::Data => "Inspect the input file (or API response) for malformed rows.",
            ErrorCategory::Config => "Fix the flagged configuration value (see --help or the job file).",
            ErrorCategory::Auth => "Verify the API keys and the service-account credential file.",
            ErrorCategory::Io => "Check the output directory exists and is writable.",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
