//! Error types for proofpix-core.
//!
//! This module defines the central error type [`CoreError`] used by every
//! collaborator trait, along with the [`CoreResult<T>`] type alias.
//!
//! # Examples
//!
//! ```rust
//! use proofpix_core::CoreError;
//!
//! let error = CoreError::DimensionMismatch {
//!     expected: 1408,
//!     actual: 768,
//! };
//! assert!(error.to_string().contains("1408"));
//! ```

use thiserror::Error;

/// Top-level error type for collaborator and configuration failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document or blob that must exist was not found.
    ///
    /// # When This Occurs
    ///
    /// - Partial update of a document that was never written
    /// - Verification of an asset id that has no document
    #[error("Not found: {collection}/{id}")]
    NotFound {
        /// Collection or bucket prefix that was searched
        collection: String,
        /// Identifier that was not found
        id: String,
    },

    /// Embedding vector dimension does not match the system dimension.
    ///
    /// `Constraint: embedding.len() == 1408`
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension provided
        actual: usize,
    },

    /// A field value failed validation constraints.
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Blob or document storage failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON or binary encoding failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An external collaborator (analysis model, embedding model, log
    /// server) returned an error or an unusable response.
    #[error("Collaborator '{collaborator}' failed: {message}")]
    CollaboratorError {
        /// Which collaborator failed
        collaborator: String,
        /// Description of the failure
        message: String,
    },

    /// An external call exceeded its deadline.
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Deadline in seconds
        seconds: u64,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Create a collaborator error with context.
    pub fn collaborator(collaborator: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::CollaboratorError {
            collaborator: collaborator.into(),
            message: message.to_string(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// True for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::StorageError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("assets", "a-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: assets/a-1");
    }

    #[test]
    fn test_collaborator_helper() {
        let err = CoreError::collaborator("embedder", "HTTP 503");
        let msg = err.to_string();
        assert!(msg.contains("embedder"));
        assert!(msg.contains("HTTP 503"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = parse_err.into();
        assert!(matches!(err, CoreError::SerializationError(_)));
    }
}
