//! Verification of an asset's transparency-log inclusion.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use proofpix_core::traits::{DocumentStore, TransparencyLog};
use proofpix_core::types::ASSETS_COLLECTION;
use proofpix_core::{Asset, CoreError, InclusionProof};

/// Where an asset stands with respect to the transparency log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// No asset record exists.
    NotFound,
    /// The record exists but no leaf index has been recorded yet.
    PendingInclusion,
    /// The certificate digest is in the log.
    Included {
        leaf_index: u64,
        proof: InclusionProof,
    },
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("asset {asset_id} has a log position but no transparency log is configured")]
    LogNotConfigured { asset_id: String },

    #[error("asset {asset_id} has an invalid log position: {value}")]
    InvalidPosition { asset_id: String, value: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Answers "is this asset's certificate in the log?".
#[derive(Clone)]
pub struct Verifier {
    documents: Arc<dyn DocumentStore>,
    transparency_log: Option<Arc<dyn TransparencyLog>>,
}

impl Verifier {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        transparency_log: Option<Arc<dyn TransparencyLog>>,
    ) -> Self {
        Self {
            documents,
            transparency_log,
        }
    }

    pub async fn verify(&self, asset_id: &str) -> Result<Verification, VerifyError> {
        let Some(doc) = self.documents.get(ASSETS_COLLECTION, asset_id).await? else {
            return Ok(Verification::NotFound);
        };

        let leaf_index = match doc.field(Asset::LOG_POSITION_FIELD) {
            None | Some(serde_json::Value::Null) => return Ok(Verification::PendingInclusion),
            Some(value) => value.as_u64().ok_or_else(|| VerifyError::InvalidPosition {
                asset_id: asset_id.to_string(),
                value: value.to_string(),
            })?,
        };

        let log = self
            .transparency_log
            .as_ref()
            .ok_or_else(|| VerifyError::LogNotConfigured {
                asset_id: asset_id.to_string(),
            })?;

        let proof = log.inclusion_proof(leaf_index).await?;
        debug!(asset_id, leaf_index, tree_size = proof.tree_size, "inclusion proof fetched");
        Ok(Verification::Included { leaf_index, proof })
    }
}
