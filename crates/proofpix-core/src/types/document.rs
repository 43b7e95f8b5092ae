//! Schemaless document as stored by a [`DocumentStore`](crate::traits::DocumentStore).

use serde::{Deserialize, Serialize};

/// Top-level field map of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A keyed JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a top-level field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Overlay `patch` onto this document, replacing fields with the same name.
    pub fn merge(&mut self, patch: Fields) {
        for (key, value) in patch {
            self.fields.insert(key, value);
        }
    }
}
