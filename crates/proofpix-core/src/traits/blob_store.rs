//! Object storage trait.

use async_trait::async_trait;

use crate::error::CoreResult;

/// Flat namespace of byte blobs addressed by `/`-separated paths.
///
/// # Errors
///
/// A missing object is not an error for [`get`](BlobStore::get); it returns
/// `Ok(None)`. Any other failure is reported as
/// [`CoreError::StorageError`](crate::CoreError::StorageError).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the bytes stored at `path`, or `None` if nothing is there.
    async fn get(&self, path: &str) -> CoreResult<Option<Vec<u8>>>;

    /// Store `bytes` at `path`, replacing any previous object.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> CoreResult<()>;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}
