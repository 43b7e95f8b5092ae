//! Exact flat vector index.
//!
//! Vectors are stored contiguously in insertion order, so a vector's
//! position is its `sequence_id`. Search is a full scan computing squared
//! Euclidean distance; results are ordered by ascending distance and ties
//! are broken by ascending `sequence_id`.

use std::cmp::Ordering;
use std::collections::HashMap;

use proofpix_core::types::VectorEntry;
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Flat squared-L2 index with an append-only id map.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    /// `len() * dimension` components, row-major.
    data: Vec<f32>,
    /// `sequence_id -> external_id`.
    ids: Vec<String>,
    /// First `sequence_id` assigned to each external id.
    first_seen: HashMap<String, u64>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            ids: Vec::new(),
            first_seen: HashMap::new(),
        }
    }

    /// Pre-size storage for `capacity` vectors.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(dimension.saturating_mul(capacity)),
            ids: Vec::with_capacity(capacity),
            first_seen: HashMap::with_capacity(capacity),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append a vector and return its `sequence_id` (the size before insertion).
    ///
    /// # Errors
    ///
    /// - [`IndexError::DimensionMismatch`] if `vector.len() != dimension`
    /// - [`IndexError::NonFiniteComponent`] if any component is NaN or infinite
    ///
    /// The index is unchanged on error.
    pub fn add(&mut self, external_id: &str, vector: &[f32]) -> IndexResult<u64> {
        self.check_vector(external_id, vector)?;

        let sequence_id = self.ids.len() as u64;
        self.data.extend_from_slice(vector);
        self.ids.push(external_id.to_string());
        self.first_seen
            .entry(external_id.to_string())
            .or_insert(sequence_id);

        debug!(sequence_id, external_id, "vector appended");
        Ok(sequence_id)
    }

    /// The `k` nearest vectors as `(squared_distance, sequence_id)`.
    ///
    /// Returns fewer than `k` results when the index holds fewer vectors, and
    /// nothing when `k == 0` or the index is empty.
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<(f32, u64)>> {
        self.check_vector("", query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, u64)> = self
            .data
            .chunks_exact(self.dimension.max(1))
            .enumerate()
            .map(|(seq, row)| (squared_l2(query, row), seq as u64))
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_hits);
            scored.truncate(k);
        }
        scored.sort_unstable_by(compare_hits);
        Ok(scored)
    }

    /// First `sequence_id` assigned to `external_id`, if indexed.
    pub fn sequence_of(&self, external_id: &str) -> Option<u64> {
        self.first_seen.get(external_id).copied()
    }

    pub fn external_id(&self, sequence_id: u64) -> Option<&str> {
        self.ids.get(sequence_id as usize).map(String::as_str)
    }

    pub fn vector(&self, sequence_id: u64) -> Option<&[f32]> {
        if sequence_id as usize >= self.len() {
            return None;
        }
        let start = sequence_id as usize * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Iterate `(sequence_id, external_id, vector)` in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str, &[f32])> + '_ {
        self.ids
            .iter()
            .zip(self.data.chunks_exact(self.dimension.max(1)))
            .enumerate()
            .map(|(seq, (id, row))| (seq as u64, id.as_str(), row))
    }

    /// Owned copy of every entry.
    pub fn entries(&self) -> Vec<VectorEntry> {
        self.iter()
            .map(|(sequence_id, external_id, vector)| VectorEntry {
                sequence_id,
                external_id: external_id.to_string(),
                vector: vector.to_vec(),
            })
            .collect()
    }

    fn check_vector(&self, external_id: &str, vector: &[f32]) -> IndexResult<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if let Some(position) = vector.iter().position(|x| !x.is_finite()) {
            return Err(IndexError::NonFiniteComponent {
                external_id: external_id.to_string(),
                position,
            });
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn compare_hits(a: &(f32, u64), b: &(f32, u64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(vectors: &[(&str, [f32; 2])]) -> VectorIndex {
        let mut index = VectorIndex::new(2);
        for (id, v) in vectors {
            index.add(id, v).unwrap();
        }
        index
    }

    #[test]
    fn test_sequence_ids_are_append_positions() {
        let mut index = VectorIndex::new(2);
        assert_eq!(index.add("a", &[0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add("b", &[1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.add("c", &[2.0, 0.0]).unwrap(), 2);
        assert_eq!(index.external_id(1), Some("b"));
        assert_eq!(index.vector(2), Some(&[2.0, 0.0][..]));
        assert_eq!(index.vector(3), None);
    }

    #[test]
    fn test_search_orders_by_distance_then_sequence() {
        println!("=== TEST: search ordering with ties ===");
        let index = index_with(&[
            ("far", [10.0, 0.0]),
            ("tie-1", [1.0, 0.0]),
            ("near", [0.0, 0.5]),
            ("tie-2", [-1.0, 0.0]),
        ]);

        let hits = index.search(&[0.0, 0.0], 4).unwrap();
        println!("AFTER: hits={:?}", hits);
        assert_eq!(hits, vec![(0.25, 2), (1.0, 1), (1.0, 3), (100.0, 0)]);
        println!("RESULT: PASS");
    }

    #[test]
    fn test_search_truncates_to_k_with_ties_at_the_boundary() {
        let index = index_with(&[
            ("a", [1.0, 0.0]),
            ("b", [0.0, 1.0]),
            ("c", [-1.0, 0.0]),
            ("d", [0.0, -1.0]),
        ]);
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits, vec![(1.0, 0), (1.0, 1)]);
    }

    #[test]
    fn test_search_k_larger_than_len() {
        let index = index_with(&[("a", [1.0, 1.0])]);
        let hits = index.search(&[1.0, 1.0], 10).unwrap();
        assert_eq!(hits, vec![(0.0, 0)]);
    }

    #[test]
    fn test_search_empty_and_k_zero() {
        let empty = VectorIndex::new(2);
        assert!(empty.search(&[0.0, 0.0], 5).unwrap().is_empty());

        let index = index_with(&[("a", [1.0, 1.0])]);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_leaves_index_unchanged() {
        let mut index = index_with(&[("a", [1.0, 1.0])]);
        let err = index.add("bad", &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(index.len(), 1);
        assert_eq!(index.sequence_of("bad"), None);
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_non_finite_components_rejected() {
        let mut index = VectorIndex::new(2);
        let err = index.add("nan", &[0.0, f32::NAN]).unwrap_err();
        assert!(matches!(err, IndexError::NonFiniteComponent { position: 1, .. }));
        assert!(index.add("inf", &[f32::INFINITY, 0.0]).is_err());
        assert!(index.is_empty());
        assert!(index.search(&[f32::NAN, 0.0], 1).is_err());
    }

    #[test]
    fn test_sequence_of_tracks_first_occurrence() {
        let mut index = VectorIndex::new(2);
        index.add("dup", &[0.0, 0.0]).unwrap();
        index.add("other", &[1.0, 0.0]).unwrap();
        index.add("dup", &[2.0, 0.0]).unwrap();
        assert_eq!(index.sequence_of("dup"), Some(0));
        assert_eq!(index.sequence_of("other"), Some(1));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_entries_copy_everything_in_order() {
        let index = index_with(&[("a", [1.0, 2.0]), ("b", [3.0, 4.0])]);
        let entries = index.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].sequence_id, 1);
        assert_eq!(entries[1].external_id, "b");
        assert_eq!(entries[1].vector, vec![3.0, 4.0]);
    }
}
