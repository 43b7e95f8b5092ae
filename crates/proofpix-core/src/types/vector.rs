use serde::{Deserialize, Serialize};

use super::EmbeddingVector;

/// One indexed embedding.
///
/// `sequence_id` is the 0-based append position in the index and never
/// changes once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub sequence_id: u64,
    pub external_id: String,
    pub vector: EmbeddingVector,
}
