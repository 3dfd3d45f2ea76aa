//! Error types for htrmopo.
//!
//! Structural document problems and repository failures are errors.
//! Schema violations are not: the validator returns them as values so a
//! caller working through many records can continue past a bad one. They
//! only appear here when a convenience layer has to turn an `Invalid`
//! result into a failure.

use crate::schema::SchemaViolation;
use thiserror::Error;

/// Main error type for the htrmopo library.
#[derive(Debug, Error)]
pub enum MopoError {
    // Document structure errors
    #[error("Document has no front matter block")]
    NoFrontMatter,

    #[error("Front matter opened on line {line} is never closed")]
    UnterminatedFrontMatter { line: usize },

    #[error("Malformed metadata: {message}")]
    MalformedMetadata { message: String },

    // Content errors
    #[error("Metadata for {identifier} is invalid ({} violation(s))", .violations.len())]
    InvalidMetadata {
        identifier: String,
        violations: Vec<SchemaViolation>,
    },

    #[error("Normalization contract violated: {message}")]
    Normalization { message: String },

    // Repository errors
    #[error("Not a valid repository identifier: {0}")]
    InvalidIdentifier(String),

    #[error("No metadata found for {identifier}")]
    RecordNotFound { identifier: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for htrmopo operations.
pub type Result<T> = std::result::Result<T, MopoError>;

impl From<serde_json::Error> for MopoError {
    fn from(err: serde_json::Error) -> Self {
        MopoError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for MopoError {
    fn from(err: serde_yaml::Error) -> Self {
        MopoError::Yaml {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(feature = "zenodo-client")]
impl From<reqwest::Error> for MopoError {
    fn from(err: reqwest::Error) -> Self {
        MopoError::Network {
            message: err.to_string(),
            cause: err.url().map(|u| u.to_string()),
        }
    }
}

impl MopoError {
    /// Structural document errors. Callers usually fall back to another
    /// schema version or reject the document.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            MopoError::NoFrontMatter
                | MopoError::UnterminatedFrontMatter { .. }
                | MopoError::MalformedMetadata { .. }
        )
    }

    /// Misuse of the normalizer. Indicates a bug in the caller, not a
    /// problem with the author's document.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, MopoError::Normalization { .. })
    }

    /// Check if this error may go away on another attempt.
    ///
    /// Nothing in this crate retries; this is a hint for the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MopoError::Network { .. } | MopoError::RateLimited { .. }
        )
    }

    /// Violations carried by an `InvalidMetadata` error.
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            MopoError::InvalidMetadata { violations, .. } => violations,
            _ => &[],
        }
    }
}
