//! Index error types.
//!
//! Contract violations (wrong dimension, non-finite components, use before an
//! index is installed) are reported, never silently repaired.

use thiserror::Error;

/// Index operation errors with context for debugging.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Vector or query length differs from the index dimension.
    #[error("INDEX ERROR: Dimension mismatch - expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured index dimension
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// A vector component is NaN or infinite.
    #[error("INDEX ERROR: Non-finite component at position {position} for '{external_id}'")]
    NonFiniteComponent {
        /// Id of the offending vector (empty for queries)
        external_id: String,
        /// Component position
        position: usize,
    },

    /// No index has been loaded or built yet.
    ///
    /// Call `load`, `build` or `load_or_build` first.
    #[error("INDEX ERROR: No index to operate on - load or build one first")]
    NoIndex,

    /// Snapshot bytes do not start with the expected magic.
    #[error("INDEX ERROR: Unrecognized snapshot format at {path}: {message}")]
    FormatRejected {
        /// Blob path of the snapshot
        path: String,
        /// What was found instead
        message: String,
    },

    /// Snapshot decoded but violates index invariants.
    #[error("INDEX ERROR: Corrupted snapshot: {message}")]
    CorruptedSnapshot {
        /// Which invariant failed
        message: String,
    },

    /// Blob or document storage failed.
    #[error("INDEX ERROR: Storage operation failed - {context}: {message}")]
    StorageError {
        /// What operation was attempted
        context: String,
        /// Underlying error message
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("INDEX ERROR: Serialization error - {context}: {message}")]
    SerializationError {
        /// What was being serialized
        context: String,
        /// Underlying error message
        message: String,
    },
}

impl IndexError {
    /// Create a storage error with context.
    pub fn storage(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::StorageError {
            context: context.into(),
            message: error.to_string(),
        }
    }

    /// Create a serialization error with context.
    pub fn serialization(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::SerializationError {
            context: context.into(),
            message: error.to_string(),
        }
    }

    /// Create a corrupted-snapshot error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::CorruptedSnapshot {
            message: message.into(),
        }
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = IndexError::DimensionMismatch {
            expected: 1408,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("1408"));
        assert!(msg.contains("768"));
    }

    #[test]
    fn test_helpers_keep_context() {
        let err = IndexError::storage("uploading snapshot", "bucket unavailable");
        assert!(err.to_string().contains("uploading snapshot"));
        assert!(err.to_string().contains("bucket unavailable"));

        let err = IndexError::corrupted("sequence gap at 3");
        assert!(matches!(err, IndexError::CorruptedSnapshot { .. }));
    }
}
