//! Storage error types.

use proofpix_core::CoreError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open.
    #[error("Failed to open database at '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// Collection has no column family.
    #[error("Column family '{name}' not found")]
    ColumnFamilyNotFound { name: String },

    /// Write operation failed.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Read operation failed.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Document not found by id.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Blob path is absolute or escapes the store root.
    #[error("Invalid blob path: '{0}'")]
    InvalidPath(String),

    /// Stored bytes are not a JSON object.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected failure, e.g. a panicked blocking task.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { collection, id } => CoreError::NotFound { collection, id },
            StorageError::Serialization(msg) => CoreError::SerializationError(msg),
            StorageError::InvalidPath(path) => CoreError::ValidationError {
                field: "path".into(),
                message: format!("invalid blob path '{}'", path),
            },
            other => CoreError::StorageError(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_open_failed() {
        let error = StorageError::OpenFailed {
            path: "/tmp/test".to_string(),
            message: "permission denied".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let core: CoreError = StorageError::NotFound {
            collection: "assets".into(),
            id: "a1".into(),
        }
        .into();
        assert!(core.is_not_found());
    }

    #[test]
    fn test_other_errors_map_to_core_storage_error() {
        let core: CoreError = StorageError::WriteFailed("disk full".into()).into();
        assert!(matches!(core, CoreError::StorageError(ref m) if m.contains("disk full")));
    }
}
