//! HTTP implementations of the collaborator traits.
//!
//! - [`HttpAnalyzer`] - generative vision model (`generateContent` style API)
//! - [`HttpEmbedder`] - multimodal embedding model (`predict` style API)
//! - [`HttpTransparencyLog`] - JSON gateway in front of the Merkle log
//!
//! Every client shares the same request shape: JSON body, optional bearer
//! token, a reqwest-level timeout, and non-2xx responses surfaced with their
//! body as [`ClientError::Api`].

mod analyzer;
mod embedder;
mod transparency_log;

pub use analyzer::HttpAnalyzer;
pub use embedder::HttpEmbedder;
pub use transparency_log::HttpTransparencyLog;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use thiserror::Error;

use proofpix_core::CoreError;

/// Errors from the HTTP collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Convert into the core error for `collaborator`.
    ///
    /// 404s keep their not-found meaning so callers can tell a missing
    /// record from a failing service.
    pub fn into_core(self, collaborator: &str) -> CoreError {
        match self {
            Self::NotFound(what) => CoreError::not_found(collaborator, what),
            other => CoreError::collaborator(collaborator, other),
        }
    }
}

/// Shared reqwest client with a whole-request timeout.
pub fn build_http_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))
}

fn with_auth(request: RequestBuilder, api_token: Option<&str>) -> RequestBuilder {
    match api_token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

/// Fail on any non-2xx status, keeping the response body for diagnostics.
async fn check_status(response: Response, what: &str) -> ClientResult<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_meaning() {
        let err = ClientError::NotFound("leaf 7".into()).into_core("transparency_log");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_api_error_becomes_collaborator_error() {
        let err = ClientError::Api {
            status: 503,
            body: "overloaded".into(),
        }
        .into_core("analyzer");
        match err {
            CoreError::CollaboratorError {
                collaborator,
                message,
            } => {
                assert_eq!(collaborator, "analyzer");
                assert!(message.contains("503"));
                assert!(message.contains("overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
