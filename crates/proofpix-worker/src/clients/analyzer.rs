//! Vision model client for authenticity analysis.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use proofpix_core::config::CollaboratorConfig;
use proofpix_core::traits::AuthenticityAnalyzer;
use proofpix_core::CoreResult;

use super::{build_http_client, check_status, with_auth, ClientError, ClientResult};

const COLLABORATOR: &str = "analyzer";
const IMAGE_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// [`AuthenticityAnalyzer`] backed by a generative vision model endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    http: Client,
    endpoint: String,
    api_token: Option<String>,
    prompt: String,
}

impl HttpAnalyzer {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        api_token: Option<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_token,
            prompt: prompt.into(),
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> ClientResult<Self> {
        if config.analyzer_endpoint.is_empty() {
            return Err(ClientError::Config("analyzer_endpoint is empty".to_string()));
        }
        let http = build_http_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            http,
            config.analyzer_endpoint.clone(),
            config.api_token.clone(),
            config.analysis_prompt.clone(),
        ))
    }

    async fn generate(&self, image: &[u8]) -> ClientResult<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text { text: &self.prompt },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: IMAGE_MIME_TYPE,
                            data: BASE64.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig::default(),
        };

        let request = with_auth(self.http.post(&self.endpoint), self.api_token.as_deref());
        let response = request.json(&body).send().await?;
        let response = check_status(response, &self.endpoint).await?;
        let parsed: GenerateResponse = response.json().await?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ClientError::MalformedResponse("no text in first candidate".to_string())
            })?;

        debug!(chars = text.len(), "analysis received");
        Ok(text)
    }
}

#[async_trait]
impl AuthenticityAnalyzer for HttpAnalyzer {
    async fn analyze(&self, image: &[u8]) -> CoreResult<String> {
        self.generate(image)
            .await
            .map_err(|e| e.into_core(COLLABORATOR))
    }
}
