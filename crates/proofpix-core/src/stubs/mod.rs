//! In-memory implementations of the collaborator traits.
//!
//! # TEST ONLY
//!
//! All stub exports are gated with `#[cfg(any(test, feature = "test-utils"))]`.
//! Production code cannot import them unless the `test-utils` feature is
//! enabled, and that feature must never be enabled in release builds: the
//! stores keep everything in process memory and the model stubs return
//! canned answers.
//!
//! Every stub counts its calls and supports failure injection so tests can
//! assert exactly which collaborators a pipeline touched.
//!
//! ```ignore
//! // [dev-dependencies]
//! // proofpix-core = { workspace = true, features = ["test-utils"] }
//!
//! use proofpix_core::stubs::{InMemoryBlobStore, StubEmbedder};
//!
//! let blobs = InMemoryBlobStore::new();
//! let embedder = StubEmbedder::deterministic(7);
//! ```

#[cfg(any(test, feature = "test-utils"))]
mod badge_stub;
#[cfg(any(test, feature = "test-utils"))]
mod memory_blob_store;
#[cfg(any(test, feature = "test-utils"))]
mod memory_document_store;
#[cfg(any(test, feature = "test-utils"))]
mod model_stub;
#[cfg(any(test, feature = "test-utils"))]
mod transparency_log_stub;

#[cfg(any(test, feature = "test-utils"))]
pub use badge_stub::StubBadgeRenderer;
#[cfg(any(test, feature = "test-utils"))]
pub use memory_blob_store::InMemoryBlobStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory_document_store::InMemoryDocumentStore;
#[cfg(any(test, feature = "test-utils"))]
pub use model_stub::{StubAnalyzer, StubEmbedder};
#[cfg(any(test, feature = "test-utils"))]
pub use transparency_log_stub::InMemoryTransparencyLog;
