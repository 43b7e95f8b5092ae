//! Append-only transparency log trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{InclusionProof, LogLeaf};

/// Append-only Merkle log. The log service owns the tree; callers only
/// append leaves and relay proofs.
#[async_trait]
pub trait TransparencyLog: Send + Sync {
    /// Append a leaf and return its assigned index.
    async fn append_leaf(&self, leaf_value: &[u8]) -> CoreResult<LogLeaf>;

    /// Inclusion proof for the leaf at `leaf_index` against the current tree.
    async fn inclusion_proof(&self, leaf_index: u64) -> CoreResult<InclusionProof>;
}
