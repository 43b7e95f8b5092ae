//! Document storage trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Document, Fields};

/// Collections of keyed JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>>;

    /// Write a document, overwriting any existing one with the same id.
    async fn set(&self, collection: &str, doc: Document) -> CoreResult<()>;

    /// Merge `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) if no document
    /// with `id` exists.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CoreResult<()>;

    /// Every document in the collection, in ascending id order.
    async fn scan(&self, collection: &str) -> CoreResult<Vec<Document>>;
}
