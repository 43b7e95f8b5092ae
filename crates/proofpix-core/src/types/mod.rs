//! Core domain types.

mod asset;
mod document;
mod paths;
mod transparency;
mod vector;

pub use asset::{Asset, AssetStatus};
pub use document::{Document, Fields};
pub use paths::{
    badge_path, certificate_path, upload_path, validate_path_segment,
    DEFAULT_INDEX_SNAPSHOT_PATH,
};
pub use transparency::{InclusionProof, LogLeaf};
pub use vector::VectorEntry;

/// Embedding vector type. Always [`EMBEDDING_DIM`] long once validated.
pub type EmbeddingVector = Vec<f32>;

/// System-wide embedding dimension produced by the multimodal embedder.
pub const EMBEDDING_DIM: usize = 1408;

/// Document-store collection holding asset records.
pub const ASSETS_COLLECTION: &str = "assets";
