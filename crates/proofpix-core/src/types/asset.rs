//! Asset record persisted once analysis and embedding both succeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::EmbeddingVector;
use crate::error::{CoreError, CoreResult};

/// Lifecycle status of an asset record.
///
/// Records are only ever written after a successful analysis, so the only
/// status the pipeline produces is [`AssetStatus::Completed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Completed,
}

/// A user-submitted image after fingerprinting.
///
/// Serialized with snake_case field names into the `assets` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
    /// Verbatim text returned by the analysis model.
    pub raw_analysis: String,
    /// Authenticity score, 0..=100.
    pub originality_score: u8,
    pub narrative: String,
    pub embedding: EmbeddingVector,
    /// Leaf index in the transparency log, once recorded.
    #[serde(default)]
    pub transparency_log_position: Option<u64>,
}

impl Asset {
    /// Field name for the transparency log position, used in partial updates.
    pub const LOG_POSITION_FIELD: &'static str = "transparency_log_position";

    /// Convert into a storable document keyed by the asset id.
    pub fn to_document(&self) -> CoreResult<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(Document::new(self.id.clone(), fields)),
            other => Err(CoreError::SerializationError(format!(
                "asset serialized to non-object JSON: {}",
                other
            ))),
        }
    }

    /// Reconstruct an asset from a stored document.
    pub fn from_document(doc: &Document) -> CoreResult<Self> {
        let value = serde_json::Value::Object(doc.fields.clone());
        Ok(serde_json::from_value(value)?)
    }
}
