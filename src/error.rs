//! Error types for the food quality tracker
//!
//! This module provides the error taxonomy using thiserror for structured
//! error definitions and anyhow for propagation at the binary edge.
//!
//! Only [`QualityError::Validation`] is meant to reach the person submitting a
//! quality check. Gateway and mirror failures are caught by their owning
//! component and degrade to display text or warnings.

use thiserror::Error;

/// Field-level rejection raised at the record store boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending input field
    pub field: &'static str,

    /// Human readable reason
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Main error type for food quality operations
#[derive(Error, Debug)]
pub enum QualityError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Summarization gateway failed (credential, network, timeout, body)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Spreadsheet mirror failed
    #[error("Mirror write error: {0}")]
    Mirror(String),

    /// Operation not allowed for the current request context
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl QualityError {
    /// True for the errors a submitter can fix by changing input
    pub fn is_validation(&self) -> bool {
        matches!(self, QualityError::Validation(_))
    }
}

/// Result type alias for food quality operations
pub type Result<T> = std::result::Result<T, QualityError>;

impl From<rusqlite::Error> for QualityError {
    fn from(err: rusqlite::Error) -> Self {
        QualityError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to QualityError
impl From<anyhow::Error> for QualityError {
    fn from(err: anyhow::Error) -> Self {
        QualityError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err =
            QualityError::Validation(ValidationError::new("score", "must be between 1 and 10"));
        assert_eq!(
            err.to_string(),
            "Validation error: invalid score: must be between 1 and 10"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_error_conversion() {
        let sql_err = rusqlite::Error::InvalidQuery;
        let err: QualityError = sql_err.into();
        assert!(matches!(err, QualityError::Database(_)));
        assert!(!err.is_validation());
    }
}
