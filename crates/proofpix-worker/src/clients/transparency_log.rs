//! Client for the transparency log's JSON gateway.
//!
//! ```text
//! POST {server}/v1/logs/{log_id}/leaves               {"leaf_value": hex}
//!      -> {"leaf_index": n}
//! GET  {server}/v1/logs/{log_id}/leaves/{index}/proof
//!      -> {"leaf_index": n, "tree_size": m, "hashes": [hex, ...]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use proofpix_core::config::TransparencyLogConfig;
use proofpix_core::traits::TransparencyLog;
use proofpix_core::types::{InclusionProof, LogLeaf};
use proofpix_core::CoreResult;

use super::{build_http_client, check_status, ClientError, ClientResult};

const COLLABORATOR: &str = "transparency_log";

#[derive(Debug, Serialize)]
struct AppendRequest {
    leaf_value: String,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    leaf_index: u64,
}

/// [`TransparencyLog`] reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransparencyLog {
    http: Client,
    server: String,
    log_id: String,
}

impl HttpTransparencyLog {
    pub fn new(http: Client, server: impl Into<String>, log_id: impl Into<String>) -> Self {
        let server: String = server.into();
        Self {
            http,
            server: server.trim_end_matches('/').to_string(),
            log_id: log_id.into(),
        }
    }

    /// `Ok(None)` when the log section is not configured.
    pub fn from_config(
        config: &TransparencyLogConfig,
        timeout: Duration,
    ) -> ClientResult<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }
        let (Some(server), Some(log_id)) = (&config.server_addr, &config.log_id) else {
            return Ok(None);
        };
        let http = build_http_client(timeout)?;
        Ok(Some(Self::new(http, server.clone(), log_id.clone())))
    }

    fn leaves_url(&self) -> String {
        format!("{}/v1/logs/{}/leaves", self.server, self.log_id)
    }

    async fn append(&self, leaf_value: &[u8]) -> ClientResult<LogLeaf> {
        let body = AppendRequest {
            leaf_value: hex::encode(leaf_value),
        };
        let url = self.leaves_url();
        let response = self.http.post(&url).json(&body).send().await?;
        let response = check_status(response, &url).await?;
        let appended: AppendResponse = response.json().await?;

        debug!(leaf_index = appended.leaf_index, "leaf appended");
        Ok(LogLeaf {
            leaf_value: leaf_value.to_vec(),
            leaf_index: appended.leaf_index,
        })
    }

    async fn proof(&self, leaf_index: u64) -> ClientResult<InclusionProof> {
        let url = format!("{}/{}/proof", self.leaves_url(), leaf_index);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, &format!("leaf {}", leaf_index)).await?;
        let proof: InclusionProof = response.json().await?;
        if proof.leaf_index != leaf_index {
            return Err(ClientError::MalformedResponse(format!(
                "requested proof for leaf {}, got leaf {}",
                leaf_index, proof.leaf_index
            )));
        }
        Ok(proof)
    }
}

#[async_trait]
impl TransparencyLog for HttpTransparencyLog {
    async fn append_leaf(&self, leaf_value: &[u8]) -> CoreResult<LogLeaf> {
        self.append(leaf_value)
            .await
            .map_err(|e| e.into_core(COLLABORATOR))
    }

    async fn inclusion_proof(&self, leaf_index: u64) -> CoreResult<InclusionProof> {
        self.proof(leaf_index)
            .await
            .map_err(|e| e.into_core(COLLABORATOR))
    }
}
