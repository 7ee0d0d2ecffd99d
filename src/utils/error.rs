use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Record query failed: {message}")]
    QueryFailure { message: String },

    #[error("Invalid birthdate '{value}' on contact {contact_id}: {reason}")]
    DateParseFailure {
        contact_id: String,
        value: String,
        reason: String,
    },

    #[error("Sending to contact {contact_id} failed: {message}")]
    SendFailure { contact_id: String, message: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    RecordStore,
    Transport,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NotifierError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NotifierError::QueryFailure { .. } => ErrorCategory::RecordStore,
            NotifierError::SendFailure { .. } => ErrorCategory::Transport,
            NotifierError::DateParseFailure { .. }
            | NotifierError::SerializationError(_) => ErrorCategory::Data,
            NotifierError::Timeout { .. } | NotifierError::ApiError(_) => ErrorCategory::Transport,
            NotifierError::IoError(_) => ErrorCategory::System,
            NotifierError::ConfigError { .. }
            | NotifierError::MissingConfigError { .. }
            | NotifierError::InvalidConfigValueError { .. }
            | NotifierError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆生日格式錯誤只會跳過該聯絡人
            NotifierError::DateParseFailure { .. } => ErrorSeverity::Low,
            NotifierError::QueryFailure { .. }
            | NotifierError::SendFailure { .. }
            | NotifierError::Timeout { .. }
            | NotifierError::ApiError(_) => ErrorSeverity::Medium,
            NotifierError::SerializationError(_) => ErrorSeverity::High,
            NotifierError::ConfigError { .. }
            | NotifierError::MissingConfigError { .. }
            | NotifierError::InvalidConfigValueError { .. }
            | NotifierError::ConfigValidationError { .. } => ErrorSeverity::High,
            NotifierError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NotifierError::QueryFailure { .. } => {
                "Could not read contacts from the record store".to_string()
            }
            NotifierError::SendFailure { contact_id, .. } => {
                format!("A birthday email to contact {} could not be sent", contact_id)
            }
            NotifierError::Timeout { operation, .. } => {
                format!("The {} call did not answer in time", operation)
            }
            NotifierError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            NotifierError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line arguments or the TOML configuration file"
            }
            ErrorCategory::RecordStore => {
                "Verify the API endpoint, the access token and that the caller may read contacts"
            }
            ErrorCategory::Transport => {
                "Verify that the initiating user may create and send emails, then run again"
            }
            ErrorCategory::Data => "Inspect the offending record in the record store",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;
