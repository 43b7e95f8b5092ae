//! Collaborator traits consumed by the pipeline and the index manager.
//!
//! # Traits
//!
//! - [`BlobStore`]: object storage for uploads, certificates, badges and
//!   index snapshots
//! - [`DocumentStore`]: keyed JSON documents grouped in collections
//! - [`AuthenticityAnalyzer`]: vision model returning free-form analysis text
//! - [`ImageEmbedder`]: multimodal embedding model
//! - [`TransparencyLog`]: append-only log service
//! - [`BadgeRenderer`]: score badge image

mod analysis;
mod badge;
mod blob_store;
mod document_store;
mod transparency_log;

pub use analysis::{AuthenticityAnalyzer, ImageEmbedder};
pub use badge::BadgeRenderer;
pub use blob_store::BlobStore;
pub use document_store::DocumentStore;
pub use transparency_log::TransparencyLog;
