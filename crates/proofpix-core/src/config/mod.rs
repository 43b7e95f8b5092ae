//! Configuration management for the ProofPix worker.

mod sub_configs;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::EMBEDDING_DIM;

pub use sub_configs::{
    CollaboratorConfig, IndexConfig, LoggingConfig, PipelineConfig, ServerConfig, StorageConfig,
    TransparencyLogConfig, DEFAULT_ANALYSIS_PROMPT,
};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
    #[serde(default)]
    pub transparency_log: TransparencyLogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order:
    /// 1. config/default.toml (base settings)
    /// 2. config/{PROOFPIX_ENV}.toml (environment-specific)
    /// 3. Environment variables with PROOFPIX__ prefix
    /// 4. `TRILLIAN_LOG_ID` / `TRILLIAN_LOG_SERVER_ADDR`
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("PROOFPIX_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("PROOFPIX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Config = builder.build()?.try_deserialize()?;
        config
            .transparency_log
            .apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults for testing/development.
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// Neither loader validates; call [`Config::validate`] once any
    /// overrides have been applied.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Collaborator endpoints are not checked here; the worker binary calls
    /// [`CollaboratorConfig::validate`] before wiring HTTP clients.
    pub fn validate(&self) -> CoreResult<()> {
        if self.index.dimension == 0 {
            return Err(CoreError::ConfigError(
                "index.dimension must be greater than 0".into(),
            ));
        }
        if self.index.dimension != EMBEDDING_DIM {
            tracing::warn!(
                configured = self.index.dimension,
                expected = EMBEDDING_DIM,
                "index.dimension differs from the embedding model dimension"
            );
        }
        if self.index.snapshot_path.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "index.snapshot_path must not be empty".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(CoreError::ConfigError(
                "server.port must be greater than 0".into(),
            ));
        }

        self.pipeline.validate()?;
        Ok(())
    }
}
