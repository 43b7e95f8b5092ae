//! ProofPix Core Library
//!
//! Provides the domain types, collaborator traits, configuration, and stub
//! implementations shared by the fingerprinting pipeline and the vector-index
//! manager.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`Asset`, `Document`, `LogLeaf`, `InclusionProof`)
//! - Collaborator traits (`BlobStore`, `DocumentStore`, `AuthenticityAnalyzer`,
//!   `ImageEmbedder`, `TransparencyLog`, `BadgeRenderer`)
//! - Error types and result aliases
//! - Configuration structures
//!
//! # Example
//!
//! ```
//! use proofpix_core::types::{upload_path, EMBEDDING_DIM};
//!
//! assert_eq!(EMBEDDING_DIM, 1408);
//! assert_eq!(upload_path("user-1", "asset-9"), "uploads/user-1/asset-9.jpg");
//! ```

pub mod config;
pub mod error;
pub mod stubs;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use types::{
    Asset, AssetStatus, Document, EmbeddingVector, InclusionProof, LogLeaf, VectorEntry,
};
