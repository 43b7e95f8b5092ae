//! Badge rendering trait.

use crate::error::CoreResult;

/// Renders a small image summarizing an authenticity score.
pub trait BadgeRenderer: Send + Sync {
    /// Encoded image bytes for `score` (0..=100).
    fn render(&self, score: u8) -> CoreResult<Vec<u8>>;

    /// MIME type of the bytes returned by [`render`](BadgeRenderer::render).
    fn content_type(&self) -> &'static str {
        "image/png"
    }
}
