//! In-memory [`TransparencyLog`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{CoreError, CoreResult};
use crate::traits::TransparencyLog;
use crate::types::{InclusionProof, LogLeaf};

/// Vec-backed log. Proofs carry one placeholder hash per level so tests can
/// check they are relayed, not that they verify.
#[derive(Debug, Default)]
pub struct InMemoryTransparencyLog {
    leaves: Mutex<Vec<Vec<u8>>>,
    fail_appends: AtomicBool,
}

impl InMemoryTransparencyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    /// Snapshot of every appended leaf value.
    pub fn leaves(&self) -> Vec<Vec<u8>> {
        self.leaves.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.leaves.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransparencyLog for InMemoryTransparencyLog {
    async fn append_leaf(&self, leaf_value: &[u8]) -> CoreResult<LogLeaf> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(CoreError::collaborator("transparency_log", "injected append failure"));
        }
        let mut leaves = self.leaves.lock();
        let leaf_index = leaves.len() as u64;
        leaves.push(leaf_value.to_vec());
        Ok(LogLeaf {
            leaf_value: leaf_value.to_vec(),
            leaf_index,
        })
    }

    async fn inclusion_proof(&self, leaf_index: u64) -> CoreResult<InclusionProof> {
        let tree_size = self.leaves.lock().len() as u64;
        if leaf_index >= tree_size {
            return Err(CoreError::not_found("leaves", leaf_index.to_string()));
        }
        let depth = 64 - (tree_size.saturating_sub(1)).leading_zeros();
        Ok(InclusionProof {
            leaf_index,
            tree_size,
            hashes: (0..depth).map(|level| vec![level as u8; 32]).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_sequential_indices() {
        let log = InMemoryTransparencyLog::new();
        assert_eq!(log.append_leaf(b"a").await.unwrap().leaf_index, 0);
        assert_eq!(log.append_leaf(b"b").await.unwrap().leaf_index, 1);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_inclusion_proof_bounds() {
        let log = InMemoryTransparencyLog::new();
        assert!(log.inclusion_proof(0).await.unwrap_err().is_not_found());

        for i in 0..5u8 {
            log.append_leaf(&[i]).await.unwrap();
        }
        let proof = log.inclusion_proof(2).await.unwrap();
        assert_eq!(proof.tree_size, 5);
        assert_eq!(proof.hashes.len(), 3);
    }
}
