//! Sub-configuration structures for ProofPix components.
//!
//! This module contains all the individual configuration structs
//! that make up the main `Config` structure.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{DEFAULT_INDEX_SNAPSHOT_PATH, EMBEDDING_DIM};

/// Prompt sent to the authenticity model with every image.
pub const DEFAULT_ANALYSIS_PROMPT: &str = "You are an expert photography analyst. Analyze this image for any signs of AI generation, such as unnatural patterns, surreal details, warped text, or inconsistent lighting. Based on your analysis, provide a confidence score from 0.0 (definitely AI-generated) to 1.0 (definitely a real photograph) and a brief justification for your score.";

/// Trigger server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Blob and document storage locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the filesystem blob store.
    #[serde(default = "default_blob_root")]
    pub blob_root: String,
    /// RocksDB directory for asset documents.
    #[serde(default = "default_document_path")]
    pub document_path: String,
}

fn default_blob_root() -> String {
    "./data/blobs".to_string()
}

fn default_document_path() -> String {
    "./data/documents".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_root: default_blob_root(),
            document_path: default_document_path(),
        }
    }
}

/// Vector index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Blob path of the persisted snapshot.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Periodic snapshot interval. 0 disables periodic saves; a final save
    /// still happens at shutdown.
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
}

fn default_dimension() -> usize {
    EMBEDDING_DIM
}

fn default_snapshot_path() -> String {
    DEFAULT_INDEX_SNAPSHOT_PATH.to_string()
}

fn default_snapshot_interval_secs() -> u64 {
    300
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            snapshot_path: default_snapshot_path(),
            snapshot_interval_secs: default_snapshot_interval_secs(),
        }
    }
}

/// Pipeline and worker-pool limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Maximum pipelines running at once.
    #[serde(default = "default_max_concurrent_assets")]
    pub max_concurrent_assets: usize,
    /// Triggers that may wait for a free worker before `submit` is refused.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Deadline for each collaborator call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Neighbours reported by the observational similarity search.
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,
}

fn default_max_concurrent_assets() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    256
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_similarity_top_k() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_assets: default_max_concurrent_assets(),
            queue_capacity: default_queue_capacity(),
            call_timeout_secs: default_call_timeout_secs(),
            similarity_top_k: default_similarity_top_k(),
        }
    }
}

impl PipelineConfig {
    /// FAIL FAST on zero limits.
    pub fn validate(&self) -> CoreResult<()> {
        let checks = [
            ("pipeline.max_concurrent_assets", self.max_concurrent_assets as u64),
            ("pipeline.queue_capacity", self.queue_capacity as u64),
            ("pipeline.call_timeout_secs", self.call_timeout_secs),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(CoreError::ConfigError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// HTTP endpoints of the analysis and embedding models.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollaboratorConfig {
    #[serde(default)]
    pub analyzer_endpoint: String,
    #[serde(default)]
    pub embedder_endpoint: String,
    /// Bearer token sent to both endpoints when set.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_analysis_prompt")]
    pub analysis_prompt: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_analysis_prompt() -> String {
    DEFAULT_ANALYSIS_PROMPT.to_string()
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            analyzer_endpoint: String::new(),
            embedder_endpoint: String::new(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            analysis_prompt: default_analysis_prompt(),
        }
    }
}

impl CollaboratorConfig {
    /// Both endpoints must be set before the worker can run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.analyzer_endpoint.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "collaborators.analyzer_endpoint is required".into(),
            ));
        }
        if self.embedder_endpoint.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "collaborators.embedder_endpoint is required".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ConfigError(
                "collaborators.request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Transparency log service. Both fields must be set to enable logging.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransparencyLogConfig {
    #[serde(default)]
    pub server_addr: Option<String>,
    #[serde(default)]
    pub log_id: Option<String>,
}

impl TransparencyLogConfig {
    /// Environment variable overriding `log_id`.
    pub const LOG_ID_ENV: &'static str = "TRILLIAN_LOG_ID";
    /// Environment variable overriding `server_addr`.
    pub const SERVER_ADDR_ENV: &'static str = "TRILLIAN_LOG_SERVER_ADDR";

    /// True when both the server address and log id are non-empty.
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.server_addr) && set(&self.log_id)
    }

    /// Apply `TRILLIAN_LOG_ID` / `TRILLIAN_LOG_SERVER_ADDR` from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(Self::LOG_ID_ENV) {
            self.log_id = Some(id);
        }
        if let Some(addr) = lookup(Self::SERVER_ADDR_ENV) {
            self.server_addr = Some(addr);
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
