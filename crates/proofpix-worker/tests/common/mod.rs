//! Shared fixtures for worker integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use proofpix_core::config::PipelineConfig;
use proofpix_core::stubs::{
    InMemoryBlobStore, InMemoryDocumentStore, InMemoryTransparencyLog, StubAnalyzer,
    StubBadgeRenderer, StubEmbedder,
};
use proofpix_core::traits::{AuthenticityAnalyzer, ImageEmbedder, TransparencyLog};
use proofpix_core::types::{upload_path, EMBEDDING_DIM};
use proofpix_index::IndexManager;
use proofpix_worker::{AssetTrigger, Collaborators, Pipeline};

pub const GOOD_ANALYSIS: &str =
    "Confidence Score: 0.93\n\nJustification: Natural sensor noise and consistent shadows.";

pub const USER: &str = "user-1";

/// Stubbed collaborators around a live, empty index.
pub struct Harness {
    pub blobs: Arc<InMemoryBlobStore>,
    pub documents: Arc<InMemoryDocumentStore>,
    pub log: Arc<InMemoryTransparencyLog>,
    pub badges: Arc<StubBadgeRenderer>,
    pub index: Arc<IndexManager>,
    analyzer: Arc<dyn AuthenticityAnalyzer>,
    embedder: Arc<dyn ImageEmbedder>,
    with_log: bool,
    config: PipelineConfig,
}

impl Harness {
    pub fn new(
        analyzer: impl AuthenticityAnalyzer + 'static,
        embedder: impl ImageEmbedder + 'static,
    ) -> Self {
        let index = Arc::new(IndexManager::new(EMBEDDING_DIM));
        index.build(&[]).expect("empty build");
        Self {
            blobs: Arc::new(InMemoryBlobStore::new()),
            documents: Arc::new(InMemoryDocumentStore::new()),
            log: Arc::new(InMemoryTransparencyLog::new()),
            badges: Arc::new(StubBadgeRenderer::new()),
            index,
            analyzer: Arc::new(analyzer),
            embedder: Arc::new(embedder),
            with_log: true,
            config: PipelineConfig::default(),
        }
    }

    /// Analyzer returning [`GOOD_ANALYSIS`] and an image-derived embedder.
    pub fn happy() -> Self {
        Self::new(StubAnalyzer::ok(GOOD_ANALYSIS), StubEmbedder::from_image())
    }

    pub fn without_log(mut self) -> Self {
        self.with_log = false;
        self
    }

    pub fn with_badges(mut self, badges: StubBadgeRenderer) -> Self {
        self.badges = Arc::new(badges);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.config.call_timeout_secs = secs;
        self
    }

    pub fn pipeline(&self) -> Pipeline {
        let transparency_log = if self.with_log {
            Some(Arc::clone(&self.log) as Arc<dyn TransparencyLog>)
        } else {
            None
        };
        Pipeline::new(
            Collaborators {
                blobs: self.blobs.clone(),
                documents: self.documents.clone(),
                analyzer: Arc::clone(&self.analyzer),
                embedder: Arc::clone(&self.embedder),
                transparency_log,
                badges: self.badges.clone(),
            },
            Arc::clone(&self.index),
            &self.config,
        )
    }

    /// Store an upload for `asset_id` and return its trigger.
    pub fn upload(&self, asset_id: &str, bytes: &[u8]) -> AssetTrigger {
        self.blobs.insert(upload_path(USER, asset_id), bytes.to_vec());
        AssetTrigger::new(USER, asset_id)
    }
}
