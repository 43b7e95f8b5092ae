//! ProofPix fingerprinting worker.
//!
//! # Usage
//!
//! ```bash
//! # Layered config: config/default.toml, config/$PROOFPIX_ENV.toml, PROOFPIX__* env
//! proofpix-worker
//!
//! # Single config file
//! proofpix-worker --config /etc/proofpix/worker.toml
//!
//! # Override the listen address
//! proofpix-worker --bind 0.0.0.0 --port 9000
//!
//! # Debug logging
//! RUST_LOG=debug proofpix-worker
//! ```
//!
//! Priority: CLI arguments > environment variables > config files > defaults.
//! `TRILLIAN_LOG_ID` and `TRILLIAN_LOG_SERVER_ADDR` enable the transparency
//! log.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use proofpix_certificate::PngBadgeRenderer;
use proofpix_core::config::Config;
use proofpix_core::traits::{BlobStore, DocumentStore, TransparencyLog};
use proofpix_core::types::ASSETS_COLLECTION;
use proofpix_index::{IndexManager, StartupSource};
use proofpix_storage::{FsBlobStore, RocksDbDocumentStore};
use proofpix_worker::clients::{HttpAnalyzer, HttpEmbedder, HttpTransparencyLog};
use proofpix_worker::{
    create_router, AppState, Collaborators, Pipeline, SnapshotScheduler, Verifier, WorkerPool,
};

/// ProofPix fingerprinting worker
#[derive(Parser, Debug)]
#[command(name = "proofpix-worker")]
#[command(version)]
#[command(about = "Fingerprints uploaded images and issues authenticity certificates")]
struct Cli {
    /// Configuration file (skips layered loading)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "PROOFPIX_BIND_ADDRESS")]
    bind: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Root directory of the blob store
    #[arg(long)]
    blob_root: Option<String>,

    /// RocksDB directory of the document store
    #[arg(long)]
    document_path: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(root) = &self.blob_root {
            config.storage.blob_root = root.clone();
        }
        if let Some(path) = &self.document_path {
            config.storage.document_path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config
                .transparency_log
                .apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::load().context("loading layered configuration")?,
    };
    cli.apply_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    config.validate().context("invalid configuration")?;
    config
        .collaborators
        .validate()
        .context("invalid collaborator configuration")?;
    info!("ProofPix worker starting");

    // Storage
    let blobs: Arc<dyn BlobStore> = Arc::new(
        FsBlobStore::open(&config.storage.blob_root)
            .await
            .context("opening blob store")?,
    );
    let documents: Arc<dyn DocumentStore> = Arc::new(
        RocksDbDocumentStore::open(&config.storage.document_path)
            .context("opening document store")?,
    );
    info!(
        blobs = %config.storage.blob_root,
        documents = %config.storage.document_path,
        "storage ready"
    );

    // Index: load the snapshot, or rebuild from asset records and save.
    let index = Arc::new(IndexManager::new(config.index.dimension));
    let source = index
        .load_or_build(
            blobs.as_ref(),
            documents.as_ref(),
            &config.index.snapshot_path,
            ASSETS_COLLECTION,
        )
        .await
        .context("index startup")?;
    match source {
        StartupSource::Loaded { vectors } => info!(vectors, "index loaded from snapshot"),
        StartupSource::Built(report) => info!(
            indexed = report.indexed,
            skipped_missing = report.skipped_missing,
            skipped_invalid = report.skipped_invalid,
            "index rebuilt from documents and saved"
        ),
    }

    // Collaborators
    let analyzer =
        HttpAnalyzer::from_config(&config.collaborators).context("building analyzer client")?;
    let embedder =
        HttpEmbedder::from_config(&config.collaborators).context("building embedder client")?;
    let transparency_log: Option<Arc<dyn TransparencyLog>> = HttpTransparencyLog::from_config(
        &config.transparency_log,
        Duration::from_secs(config.collaborators.request_timeout_secs),
    )
    .context("building transparency log client")?
    .map(|log| Arc::new(log) as Arc<dyn TransparencyLog>);
    if transparency_log.is_none() {
        warn!("transparency log not configured, certificates will not be logged");
    }

    let pipeline = Arc::new(Pipeline::new(
        Collaborators {
            blobs: Arc::clone(&blobs),
            documents: Arc::clone(&documents),
            analyzer: Arc::new(analyzer),
            embedder: Arc::new(embedder),
            transparency_log: transparency_log.clone(),
            badges: Arc::new(PngBadgeRenderer::new()),
        },
        Arc::clone(&index),
        &config.pipeline,
    ));
    let pool = Arc::new(WorkerPool::start(pipeline, &config.pipeline));
    let scheduler = SnapshotScheduler::spawn(
        Arc::clone(&index),
        Arc::clone(&blobs),
        config.index.snapshot_path.clone(),
        Duration::from_secs(config.index.snapshot_interval_secs),
    );

    let router = create_router(AppState {
        pool: Arc::clone(&pool),
        verifier: Arc::new(Verifier::new(Arc::clone(&documents), transparency_log)),
        index: Arc::clone(&index),
    });

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down: draining worker pool");
    pool.shutdown().await;
    scheduler.shutdown().await;
    info!("ProofPix worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
