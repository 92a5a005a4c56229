//! Error types for the seishdr configuration system

use seishdr_common::{ErrorSeverity, Severity};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError { source: Box<figment::Error> },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },

    /// Configuration file format not supported
    #[error("Unsupported configuration file format: {format}")]
    UnsupportedFormat { format: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}

impl Severity for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ConfigError::FileNotFound { .. } => ErrorSeverity::Error,
            ConfigError::ParseError { .. } => ErrorSeverity::Error,
            ConfigError::ValidationError { .. } => ErrorSeverity::Error,
            ConfigError::UnsupportedFormat { .. } => ErrorSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::validation("leap-second dates must increase");
        assert_eq!(
            err.to_string(),
            "Configuration validation failed: leap-second dates must increase"
        );
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigError::UnsupportedFormat {
            format: "ini".into(),
        };
        assert!(err.to_string().contains("ini"));
        assert!(!err.is_fatal());
    }
}
