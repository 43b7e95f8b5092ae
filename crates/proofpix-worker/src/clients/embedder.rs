//! Multimodal embedding model client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use proofpix_core::config::CollaboratorConfig;
use proofpix_core::traits::ImageEmbedder;
use proofpix_core::{CoreResult, EmbeddingVector};

use super::{build_http_client, check_status, with_auth, ClientError, ClientResult};

const COLLABORATOR: &str = "embedder";

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
}

#[derive(Debug, Serialize)]
struct Instance {
    image: ImagePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    bytes_base64_encoded: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    image_embedding: Option<Vec<f32>>,
}

/// [`ImageEmbedder`] backed by a `predict` endpoint.
///
/// The vector is returned as received; the pipeline checks its length
/// against the index dimension.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpEmbedder {
    pub fn new(http: Client, endpoint: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_token,
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> ClientResult<Self> {
        if config.embedder_endpoint.is_empty() {
            return Err(ClientError::Config("embedder_endpoint is empty".to_string()));
        }
        let http = build_http_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            http,
            config.embedder_endpoint.clone(),
            config.api_token.clone(),
        ))
    }

    async fn predict(&self, image: &[u8]) -> ClientResult<EmbeddingVector> {
        let body = PredictRequest {
            instances: vec![Instance {
                image: ImagePayload {
                    bytes_base64_encoded: BASE64.encode(image),
                },
            }],
        };

        let request = with_auth(self.http.post(&self.endpoint), self.api_token.as_deref());
        let response = request.json(&body).send().await?;
        let response = check_status(response, &self.endpoint).await?;
        let parsed: PredictResponse = response.json().await?;

        let embedding = parsed
            .predictions
            .into_iter()
            .next()
            .and_then(|p| p.image_embedding)
            .ok_or_else(|| {
                ClientError::MalformedResponse("no imageEmbedding in first prediction".to_string())
            })?;

        debug!(dimension = embedding.len(), "embedding received");
        Ok(embedding)
    }
}

#[async_trait]
impl ImageEmbedder for HttpEmbedder {
    async fn embed(&self, image: &[u8]) -> CoreResult<EmbeddingVector> {
        self.predict(image).await.map_err(|e| e.into_core(COLLABORATOR))
    }
}
