//! Canned model collaborators.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{CoreError, CoreResult};
use crate::traits::{AuthenticityAnalyzer, ImageEmbedder};
use crate::types::{EmbeddingVector, EMBEDDING_DIM};

/// Analyzer that returns a fixed response or a fixed error.
#[derive(Debug)]
pub struct StubAnalyzer {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticityAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> CoreResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(|msg| CoreError::collaborator("analyzer", msg))
    }
}

#[derive(Debug, Clone)]
enum EmbedMode {
    Fixed(EmbeddingVector),
    FromImage,
    Failing(String),
}

/// Embedder returning a fixed vector, an image-derived vector, or an error.
#[derive(Debug)]
pub struct StubEmbedder {
    mode: EmbedMode,
    calls: AtomicUsize,
}

impl StubEmbedder {
    /// Always return `vector`, whatever its length.
    pub fn fixed(vector: EmbeddingVector) -> Self {
        Self::with_mode(EmbedMode::Fixed(vector))
    }

    /// Always return the same [`EMBEDDING_DIM`] vector derived from `seed`.
    pub fn deterministic(seed: u64) -> Self {
        Self::fixed(seeded_vector(seed))
    }

    /// Derive the vector from the image bytes, so identical images embed
    /// identically and different images almost surely differ.
    pub fn from_image() -> Self {
        Self::with_mode(EmbedMode::FromImage)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(EmbedMode::Failing(message.into()))
    }

    fn with_mode(mode: EmbedMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageEmbedder for StubEmbedder {
    async fn embed(&self, image: &[u8]) -> CoreResult<EmbeddingVector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            EmbedMode::Fixed(v) => Ok(v.clone()),
            EmbedMode::FromImage => Ok(seeded_vector(fnv1a(image))),
            EmbedMode::Failing(msg) => Err(CoreError::collaborator("embedder", msg)),
        }
    }
}

/// Pseudo-random vector in [-1, 1) from a 64-bit LCG.
pub(crate) fn seeded_vector(seed: u64) -> EmbeddingVector {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..EMBEDDING_DIM)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x100000001b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_embedder_has_system_dimension() {
        let embedder = StubEmbedder::deterministic(7);
        let a = embedder.embed(b"x").await.unwrap();
        let b = embedder.embed(b"y").await.unwrap();
        assert_eq!(a.len(), EMBEDDING_DIM);
        assert_eq!(a, b);
        assert!(a.iter().all(|x| (-1.0..1.0).contains(x)));
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_image_embedder_distinguishes_images() {
        let embedder = StubEmbedder::from_image();
        let a1 = embedder.embed(b"image-a").await.unwrap();
        let a2 = embedder.embed(b"image-a").await.unwrap();
        let b = embedder.embed(b"image-b").await.unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[tokio::test]
    async fn test_failing_analyzer_counts_calls() {
        let analyzer = StubAnalyzer::failing("quota exceeded");
        let err = analyzer.analyze(b"img").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(analyzer.calls(), 1);
    }
}
