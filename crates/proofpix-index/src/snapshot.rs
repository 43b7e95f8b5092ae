//! Binary index snapshot codec.
//!
//! # Format
//!
//! ```text
//! b"PPXFLAT1" ++ bincode((dimension: usize, entries: Vec<(u64, String, Vec<f32>)>))
//! ```
//!
//! Vectors round-trip bit-for-bit. Decoding rejects an unknown magic, a
//! dimension other than the expected one, entries whose sequence ids are not
//! exactly `0..N` in order, and vectors of the wrong length.

use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::flat::VectorIndex;

/// Leading bytes of every snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 8] = b"PPXFLAT1";

/// Content type used when uploading snapshots.
pub const SNAPSHOT_CONTENT_TYPE: &str = "application/octet-stream";

/// Serialize `index` into a snapshot.
pub fn encode(index: &VectorIndex) -> IndexResult<Vec<u8>> {
    // Borrowed rows encode identically to the owned (u64, String, Vec<f32>) tuples.
    let entries: Vec<(u64, &str, &[f32])> = index.iter().collect();
    let payload = (index.dimension(), entries);

    let mut bytes = Vec::with_capacity(
        SNAPSHOT_MAGIC.len() + index.len() * (index.dimension() * 4 + 48),
    );
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bincode::serialize_into(&mut bytes, &payload)
        .map_err(|e| IndexError::serialization("serializing index snapshot", e))?;

    debug!(vectors = index.len(), bytes = bytes.len(), "encoded index snapshot");
    Ok(bytes)
}

/// Decode a snapshot read from `path` into a fresh index.
///
/// `path` is only used for error context.
pub fn decode(bytes: &[u8], expected_dimension: usize, path: &str) -> IndexResult<VectorIndex> {
    let body = bytes
        .strip_prefix(SNAPSHOT_MAGIC.as_slice())
        .ok_or_else(|| IndexError::FormatRejected {
            path: path.to_string(),
            message: format!(
                "expected magic {:?}, found {:?}",
                String::from_utf8_lossy(SNAPSHOT_MAGIC),
                String::from_utf8_lossy(&bytes[..bytes.len().min(SNAPSHOT_MAGIC.len())])
            ),
        })?;

    let (dimension, entries): (usize, Vec<(u64, String, Vec<f32>)>) =
        bincode::deserialize(body)
            .map_err(|e| IndexError::serialization("deserializing index snapshot", e))?;

    if dimension != expected_dimension {
        return Err(IndexError::DimensionMismatch {
            expected: expected_dimension,
            actual: dimension,
        });
    }

    let mut index = VectorIndex::with_capacity(dimension, entries.len());
    for (position, (sequence_id, external_id, vector)) in entries.into_iter().enumerate() {
        if sequence_id != position as u64 {
            return Err(IndexError::corrupted(format!(
                "entry {} has sequence_id {}",
                position, sequence_id
            )));
        }
        if vector.len() != dimension {
            return Err(IndexError::corrupted(format!(
                "entry {} has {} components, expected {}",
                position,
                vector.len(),
                dimension
            )));
        }
        index.add(&external_id, &vector)?;
    }

    debug!(vectors = index.len(), path, "decoded index snapshot");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(3);
        index.add("a", &[0.1, -0.2, 1e-30]).unwrap();
        index.add("b", &[f32::MAX, f32::MIN_POSITIVE, -0.0]).unwrap();
        index.add("a", &[1.0, 2.0, 3.0]).unwrap();
        index
    }

    fn raw_snapshot(dimension: usize, entries: Vec<(u64, String, Vec<f32>)>) -> Vec<u8> {
        let mut bytes = SNAPSHOT_MAGIC.to_vec();
        bincode::serialize_into(&mut bytes, &(dimension, entries)).unwrap();
        bytes
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        println!("=== TEST: snapshot round trip ===");
        let index = sample_index();
        let bytes = encode(&index).unwrap();
        assert!(bytes.starts_with(SNAPSHOT_MAGIC));

        let restored = decode(&bytes, 3, "mem").unwrap();
        println!("BEFORE: {} vectors, AFTER: {} vectors", index.len(), restored.len());
        assert_eq!(restored.len(), index.len());
        for (before, after) in index.iter().zip(restored.iter()) {
            assert_eq!(before.0, after.0);
            assert_eq!(before.1, after.1);
            let before_bits: Vec<u32> = before.2.iter().map(|x| x.to_bits()).collect();
            let after_bits: Vec<u32> = after.2.iter().map(|x| x.to_bits()).collect();
            assert_eq!(before_bits, after_bits);
        }
        assert_eq!(restored.sequence_of("a"), Some(0));
        println!("RESULT: PASS");
    }

    #[test]
    fn test_empty_index_round_trips() {
        let bytes = encode(&VectorIndex::new(4)).unwrap();
        let restored = decode(&bytes, 4, "mem").unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.dimension(), 4);
    }

    #[test]
    fn test_rejects_unknown_magic() {
        let mut bytes = encode(&sample_index()).unwrap();
        bytes[0..8].copy_from_slice(b"FAISSIDX");
        assert!(matches!(
            decode(&bytes, 3, "index/latest.flat"),
            Err(IndexError::FormatRejected { .. })
        ));
        assert!(matches!(
            decode(b"PPX", 3, "short"),
            Err(IndexError::FormatRejected { .. })
        ));
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let bytes = encode(&sample_index()).unwrap();
        assert!(matches!(
            decode(&bytes, 1408, "mem"),
            Err(IndexError::DimensionMismatch {
                expected: 1408,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rejects_sequence_gap() {
        let bytes = raw_snapshot(
            2,
            vec![(0, "a".into(), vec![0.0, 0.0]), (2, "b".into(), vec![1.0, 1.0])],
        );
        assert!(matches!(
            decode(&bytes, 2, "mem"),
            Err(IndexError::CorruptedSnapshot { .. })
        ));
    }

    #[test]
    fn test_rejects_short_vector() {
        let bytes = raw_snapshot(2, vec![(0, "a".into(), vec![0.0])]);
        assert!(matches!(
            decode(&bytes, 2, "mem"),
            Err(IndexError::CorruptedSnapshot { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_body() {
        let bytes = encode(&sample_index()).unwrap();
        let truncated = &bytes[..bytes.len() - 5];
        assert!(matches!(
            decode(truncated, 3, "mem"),
            Err(IndexError::SerializationError { .. })
        ));
    }
}
