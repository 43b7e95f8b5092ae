//! Certificate error types.

use thiserror::Error;

/// Errors from certificate generation and badge rendering.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// No asset was supplied.
    #[error("CERTIFICATE ERROR: asset is required")]
    MissingAsset,

    /// Certificate JSON encoding failed.
    #[error("CERTIFICATE ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// PNG encoding failed.
    #[error("CERTIFICATE ERROR: badge encoding failed: {0}")]
    Badge(#[from] image::ImageError),
}

/// Result type for certificate operations.
pub type CertificateResult<T> = Result<T, CertificateError>;

impl From<CertificateError> for proofpix_core::CoreError {
    fn from(err: CertificateError) -> Self {
        match err {
            CertificateError::Serialization(e) => Self::SerializationError(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
