use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Certificate error in {path}: {message}")]
    CertificateError { path: String, message: String },

    #[error("Icon set does not contain an image for '{icon}' (expected {path})")]
    MissingIcon { icon: String, path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Certificate,
    Io,
    Output,
    Presentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ComplianceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ComplianceError::ConfigError { .. }
            | ComplianceError::ConfigValidationError { .. }
            | ComplianceError::InvalidConfigValueError { .. }
            | ComplianceError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ComplianceError::CertificateError { .. } => ErrorCategory::Certificate,
            ComplianceError::IoError(_) => ErrorCategory::Io,
            ComplianceError::SerializationError(_) | ComplianceError::CsvError(_) => {
                ErrorCategory::Output
            }
            ComplianceError::MissingIcon { .. } => ErrorCategory::Presentation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Certificate => ErrorSeverity::Low,
            ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Presentation => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ComplianceError::IoError(_) => {
                "Check that the certificate directories exist and are readable"
            }
            ComplianceError::SerializationError(_) | ComplianceError::CsvError(_) => {
                "Try a different --format or check the output path"
            }
            ComplianceError::ConfigError { .. } | ComplianceError::ConfigValidationError { .. } => {
                "Check the configuration file syntax"
            }
            ComplianceError::InvalidConfigValueError { .. } => {
                "Correct the highlighted configuration value"
            }
            ComplianceError::MissingConfigError { .. } => {
                "Add the missing setting to the configuration file or command line"
            }
            ComplianceError::CertificateError { .. } => {
                "Remove or replace the damaged certificate file"
            }
            ComplianceError::MissingIcon { .. } => {
                "Point --icon-dir at a directory containing valid, partial, invalid and unknown icons"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ComplianceError::IoError(e) => format!("Could not access certificate data: {}", e),
            ComplianceError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComplianceError>;
