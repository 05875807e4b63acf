use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    HttpError(reqwest::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Upstream returned status {status} for {url}")]
    UpstreamStatusError { status: u16, url: String },

    #[error("Unexpected response shape: {message}")]
    ResponseShapeError { message: String },

    #[error("Model request failed: {message}")]
    ModelError { message: String },

    #[error("Model '{model}' is not available")]
    ModelUnavailableError { model: String },
}

/// Request URLs can carry API keys in the query string, so they are dropped
/// before the error is stored or displayed.
impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        AdvisorError::HttpError(e.without_url())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Model,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdvisorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdvisorError::HttpError(_) | AdvisorError::UpstreamStatusError { .. } => {
                ErrorCategory::Network
            }
            AdvisorError::CsvError(_)
            | AdvisorError::SerializationError(_)
            | AdvisorError::ResponseShapeError { .. } => ErrorCategory::Data,
            AdvisorError::ModelError { .. } | AdvisorError::ModelUnavailableError { .. } => {
                ErrorCategory::Model
            }
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AdvisorError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Short message suitable for showing to the person at the terminal.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AdvisorError::HttpError(e) if e.is_timeout() => {
                "The request timed out before the service answered".to_string()
            }
            AdvisorError::HttpError(_) => "Could not reach the remote service".to_string(),
            AdvisorError::UpstreamStatusError { status, .. } => {
                format!("The remote service answered with status {}", status)
            }
            AdvisorError::ModelUnavailableError { model } => {
                format!("The language model '{}' is not available", model)
            }
            AdvisorError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AdvisorError::HttpError(_) => "Check your network connection or raise --timeout-secs",
            AdvisorError::UpstreamStatusError { status: 401 | 403, .. } => {
                "Check that the API key is valid"
            }
            AdvisorError::UpstreamStatusError { status: 429, .. } => {
                "The quota is exhausted; wait a moment and try again"
            }
            AdvisorError::UpstreamStatusError { .. } => "Try again later or switch --source",
            AdvisorError::ResponseShapeError { .. } => {
                "The endpoint may not match the selected --source kind"
            }
            AdvisorError::ModelError { .. } | AdvisorError::ModelUnavailableError { .. } => {
                "Check GEMINI_API_KEY and the --model name"
            }
            AdvisorError::MissingConfigError { .. } => {
                "Set the value in the environment or in the configuration file"
            }
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            AdvisorError::CsvError(_) | AdvisorError::IoError(_) => {
                "Check that the export path is writable"
            }
            AdvisorError::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = AdvisorError::MissingConfigError {
            field: "SERPAPI_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_quota_status_has_specific_suggestion() {
        let err = AdvisorError::UpstreamStatusError {
            status: 429,
            url: "http://localhost".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("quota"));
    }
}
