//! Model collaborators.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::EmbeddingVector;

/// Vision model that judges whether an image is authentic.
///
/// The returned text is expected to contain a `Confidence Score:` line and a
/// `Justification:` paragraph, but callers must tolerate anything.
#[async_trait]
pub trait AuthenticityAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> CoreResult<String>;
}

/// Multimodal model producing a fixed-dimension image embedding.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Embed the image. Implementations should return
    /// [`EMBEDDING_DIM`](crate::types::EMBEDDING_DIM) components; callers
    /// validate the length.
    async fn embed(&self, image: &[u8]) -> CoreResult<EmbeddingVector>;
}
