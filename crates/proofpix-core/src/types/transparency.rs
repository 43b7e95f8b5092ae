//! Transparency-log records.

use serde::{Deserialize, Serialize};

/// A leaf appended to the transparency log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLeaf {
    /// SHA-256 digest of the certificate bytes.
    #[serde(with = "hex_bytes")]
    pub leaf_value: Vec<u8>,
    pub leaf_index: u64,
}

/// Merkle inclusion proof relayed verbatim from the log service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    #[serde(with = "hex_list")]
    pub hashes: Vec<Vec<u8>>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(list.len()))?;
        for bytes in list {
            seq.serialize_element(&hex::encode(bytes))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_hashes_serialize_as_hex() {
        let proof = InclusionProof {
            leaf_index: 3,
            tree_size: 8,
            hashes: vec![vec![0xab, 0xcd], vec![0x01]],
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["hashes"][0], "abcd");
        assert_eq!(json["hashes"][1], "01");

        let back: InclusionProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn test_leaf_rejects_bad_hex() {
        let result: Result<LogLeaf, _> =
            serde_json::from_str(r#"{"leaf_value":"zz","leaf_index":1}"#);
        assert!(result.is_err());
    }
}
