//! Per-asset fingerprinting pipeline.
//!
//! ```text
//! fetch ─► analyze ∥ embed ─► parse ─► index update ─► commit
//!                                                        │
//!                    badge ◄─ log record ◄─ log append ◄─ certify
//! ```
//!
//! Fetch failure ends the run. The asset record is committed, and the index
//! touched, only when both the analysis and the embedding succeeded. Every
//! stage after the commit is best-effort: failures are logged and recorded
//! in the [`PipelineReport`], never returned to the caller.

mod report;

pub use report::{Outcome, PipelineReport, Stage, StageStatus};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn, Instrument};

use proofpix_certificate::generate;
use proofpix_core::config::PipelineConfig;
use proofpix_core::traits::{
    AuthenticityAnalyzer, BadgeRenderer, BlobStore, DocumentStore, ImageEmbedder, TransparencyLog,
};
use proofpix_core::types::{
    badge_path, certificate_path, upload_path, validate_path_segment, Fields, ASSETS_COLLECTION,
};
use proofpix_core::{Asset, AssetStatus, CoreError, CoreResult, EmbeddingVector};
use proofpix_index::{AddOutcome, IndexManager, SearchHits};

use crate::analysis::parse_or_fallback;

/// Content type of uploaded certificates.
pub const CERTIFICATE_CONTENT_TYPE: &str = "application/json";

/// Request to fingerprint one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetTrigger {
    pub user_id: String,
    pub asset_id: String,
}

impl AssetTrigger {
    pub fn new(user_id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            asset_id: asset_id.into(),
        }
    }

    /// Both ids must be non-empty single path segments.
    pub fn validate(&self) -> CoreResult<()> {
        validate_path_segment("user_id", &self.user_id)?;
        validate_path_segment("asset_id", &self.asset_id)?;
        Ok(())
    }
}

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub blobs: Arc<dyn BlobStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub analyzer: Arc<dyn AuthenticityAnalyzer>,
    pub embedder: Arc<dyn ImageEmbedder>,
    /// `None` disables the log append and leaf-index record stages.
    pub transparency_log: Option<Arc<dyn TransparencyLog>>,
    pub badges: Arc<dyn BadgeRenderer>,
}

/// Runs the fingerprinting stages for one asset at a time; share it behind
/// an `Arc` to run many assets concurrently.
pub struct Pipeline {
    collaborators: Collaborators,
    index: Arc<IndexManager>,
    call_timeout: Duration,
    similarity_top_k: usize,
    collection: String,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("blob_backend", &self.collaborators.blobs.backend_name())
            .field("transparency_log", &self.collaborators.transparency_log.is_some())
            .field("call_timeout", &self.call_timeout)
            .field("similarity_top_k", &self.similarity_top_k)
            .field("collection", &self.collection)
            .finish()
    }
}

/// Longest analysis prefix logged when the rest of the stage failed.
const ANALYSIS_PREVIEW_CHARS: usize = 200;

fn preview(text: &str) -> &str {
    match text.char_indices().nth(ANALYSIS_PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Outputs of the analyze stage when both calls succeeded.
struct Analysis {
    raw_text: String,
    embedding: EmbeddingVector,
}

impl Pipeline {
    pub fn new(
        collaborators: Collaborators,
        index: Arc<IndexManager>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            collaborators,
            index,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            similarity_top_k: config.similarity_top_k,
            collection: ASSETS_COLLECTION.to_string(),
        }
    }

    pub fn index(&self) -> &Arc<IndexManager> {
        &self.index
    }

    /// Run every stage for `trigger`.
    pub async fn run(&self, trigger: AssetTrigger) -> PipelineReport {
        let span = tracing::info_span!(
            "pipeline",
            asset_id = %trigger.asset_id,
            user_id = %trigger.user_id
        );
        self.run_stages(trigger).instrument(span).await
    }

    async fn run_stages(&self, trigger: AssetTrigger) -> PipelineReport {
        let mut report = PipelineReport::new(&trigger.asset_id);

        // 1. Fetch
        let image = match self.fetch(&trigger).await {
            Ok(image) => {
                report.succeed(Stage::Fetch);
                image
            }
            Err(e) => {
                error!(error = %e, "failed to fetch upload");
                report.fail(Stage::Fetch, &e);
                return report.finish(Outcome::FetchFailed);
            }
        };
        info!(bytes = image.len(), "upload fetched");

        // 2. Analyze and embed concurrently
        let analysis = match self.analyze(&image).await {
            Ok(analysis) => {
                report.succeed(Stage::Analyze);
                analysis
            }
            Err(reason) => {
                report.fail(Stage::Analyze, reason);
                return report.finish(Outcome::AnalysisFailed);
            }
        };

        // 3. Parse
        let (parsed, parse_error) = parse_or_fallback(&analysis.raw_text);
        match parse_error {
            None => {
                info!(score = parsed.score, "analysis parsed");
                report.succeed(Stage::Parse);
            }
            Some(e) => {
                warn!(error = %e, "analysis unparseable, using score 0 and raw text");
                report.fail(Stage::Parse, e);
            }
        }
        report.score = Some(parsed.score);

        // 4. Index update
        match self.update_index(&trigger.asset_id, &analysis.embedding).await {
            Ok((similar, outcome)) => {
                report.succeed(Stage::IndexUpdate);
                report.similar = Some(similar);
                report.index_outcome = Some(outcome);
            }
            Err(e) => {
                warn!(error = %e, "index update failed");
                report.fail(Stage::IndexUpdate, e);
            }
        }

        // 5. Commit
        let asset = Asset {
            id: trigger.asset_id.clone(),
            user_id: trigger.user_id.clone(),
            status: AssetStatus::Completed,
            created_at: Utc::now(),
            raw_analysis: analysis.raw_text,
            originality_score: parsed.score,
            narrative: parsed.narrative,
            embedding: analysis.embedding,
            transparency_log_position: None,
        };
        if let Err(e) = self.commit(&asset).await {
            error!(error = %e, "failed to persist asset record");
            report.fail(Stage::Commit, &e);
            return report.finish(Outcome::PersistFailed);
        }
        report.succeed(Stage::Commit);
        info!(score = asset.originality_score, "asset record saved");

        // 6. Certify
        let certificate = match self.certify(&asset, Utc::now()).await {
            Ok(bytes) => {
                report.succeed(Stage::Certify);
                bytes
            }
            Err(e) => {
                warn!(error = %e, "certificate not issued");
                report.fail(Stage::Certify, e);
                return report.finish(Outcome::Completed);
            }
        };

        // 7-8. Transparency log
        if let Some(log) = self.collaborators.transparency_log.as_deref() {
            self.log_certificate(log, &asset.id, &certificate, &mut report)
                .await;
        }

        // 9. Badge
        match self.publish_badge(&asset).await {
            Ok(()) => report.succeed(Stage::Badge),
            Err(e) => {
                warn!(error = %e, "badge not published");
                report.fail(Stage::Badge, e);
            }
        }

        info!(failed = ?report.failed_stages(), "pipeline finished");
        report.finish(Outcome::Completed)
    }

    /// Bound `future` by the per-call timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        future: impl Future<Output = CoreResult<T>>,
    ) -> CoreResult<T> {
        match tokio::time::timeout(self.call_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                operation: operation.to_string(),
                seconds: self.call_timeout.as_secs(),
            }),
        }
    }

    async fn fetch(&self, trigger: &AssetTrigger) -> CoreResult<Vec<u8>> {
        let path = upload_path(&trigger.user_id, &trigger.asset_id);
        self.bounded("fetch upload", self.collaborators.blobs.get(&path))
            .await?
            .ok_or_else(|| CoreError::not_found("uploads", path))
    }

    /// Both calls always run to completion; either failure fails the stage.
    async fn analyze(&self, image: &[u8]) -> Result<Analysis, String> {
        let (analysis, embedding) = tokio::join!(
            self.bounded("analyze", self.collaborators.analyzer.analyze(image)),
            self.bounded("embed", self.collaborators.embedder.embed(image)),
        );

        let analysis = analysis.map_err(|e| {
            error!(error = %e, "authenticity analysis failed");
            format!("analysis: {}", e)
        });
        let embedding = embedding
            .and_then(|v| self.check_embedding(v))
            .map_err(|e| {
                error!(error = %e, "embedding failed");
                format!("embedding: {}", e)
            });

        match (analysis, embedding) {
            (Ok(raw_text), Ok(embedding)) => {
                debug!(chars = raw_text.len(), dimension = embedding.len(), "analysis complete");
                Ok(Analysis {
                    raw_text,
                    embedding,
                })
            }
            (Err(a), Err(e)) => Err(format!("{}; {}", a, e)),
            (Ok(raw_text), Err(reason)) => {
                warn!(
                    chars = raw_text.len(),
                    analysis = %preview(&raw_text),
                    "discarding analysis after embedding failure"
                );
                Err(reason)
            }
            (Err(reason), Ok(embedding)) => {
                warn!(
                    dimension = embedding.len(),
                    "discarding embedding after analysis failure"
                );
                Err(reason)
            }
        }
    }

    fn check_embedding(&self, vector: EmbeddingVector) -> CoreResult<EmbeddingVector> {
        let expected = self.index.dimension();
        if vector.len() != expected {
            return Err(CoreError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(CoreError::ValidationError {
                field: "embedding".to_string(),
                message: "contains NaN or infinite components".to_string(),
            });
        }
        Ok(vector)
    }

    /// Search for near duplicates, then add the embedding unless this asset
    /// is already indexed. Runs on the blocking pool since a flat search
    /// scans every vector.
    async fn update_index(
        &self,
        asset_id: &str,
        embedding: &[f32],
    ) -> Result<(SearchHits, AddOutcome), String> {
        let index = Arc::clone(&self.index);
        let asset_id = asset_id.to_string();
        let embedding = embedding.to_vec();
        let k = self.similarity_top_k;

        let (similar, outcome) = tokio::task::spawn_blocking(move || {
            let similar = index.search(&embedding, k)?;
            let outcome = index.add_if_absent(&asset_id, &embedding)?;
            Ok::<_, proofpix_index::IndexError>((similar, outcome))
        })
        .await
        .map_err(|e| format!("index task failed: {}", e))?
        .map_err(|e| e.to_string())?;

        info!(
            similar = ?similar.external_ids,
            distances = ?similar.distances,
            "similarity search complete"
        );
        match outcome {
            AddOutcome::Added(seq) => info!(sequence_id = seq, "embedding indexed"),
            AddOutcome::AlreadyIndexed(seq) => {
                info!(sequence_id = seq, "embedding already indexed, not re-added")
            }
        }
        Ok((similar, outcome))
    }

    async fn commit(&self, asset: &Asset) -> CoreResult<()> {
        let document = asset.to_document()?;
        self.bounded(
            "save asset",
            self.collaborators.documents.set(&self.collection, document),
        )
        .await
    }

    /// Generate and upload the certificate; returns its exact bytes.
    async fn certify(&self, asset: &Asset, issued_at: DateTime<Utc>) -> CoreResult<Vec<u8>> {
        let certificate = generate(Some(asset), issued_at)?;
        let bytes = certificate.to_json_bytes()?;
        self.bounded(
            "upload certificate",
            self.collaborators.blobs.put(
                &certificate_path(&asset.id),
                bytes.clone(),
                CERTIFICATE_CONTENT_TYPE,
            ),
        )
        .await?;
        info!(bytes = bytes.len(), "certificate uploaded");
        Ok(bytes)
    }

    async fn log_certificate(
        &self,
        log: &dyn TransparencyLog,
        asset_id: &str,
        certificate: &[u8],
        report: &mut PipelineReport,
    ) {
        let digest = Sha256::digest(certificate);
        let leaf = match self.bounded("append leaf", log.append_leaf(&digest)).await {
            Ok(leaf) => leaf,
            Err(e) => {
                warn!(error = %e, "certificate digest not logged");
                report.fail(Stage::LogAppend, e);
                return;
            }
        };
        report.succeed(Stage::LogAppend);
        report.leaf_index = Some(leaf.leaf_index);
        info!(leaf_index = leaf.leaf_index, "certificate digest logged");

        let mut fields = Fields::new();
        fields.insert(
            Asset::LOG_POSITION_FIELD.to_string(),
            serde_json::Value::from(leaf.leaf_index),
        );
        let update = self.collaborators.documents.update(&self.collection, asset_id, fields);
        match self.bounded("record leaf index", update).await {
            Ok(()) => report.succeed(Stage::LogRecord),
            Err(e) => {
                warn!(error = %e, leaf_index = leaf.leaf_index, "leaf index not recorded");
                report.fail(Stage::LogRecord, e);
            }
        }
    }

    async fn publish_badge(&self, asset: &Asset) -> CoreResult<()> {
        let renderer = &self.collaborators.badges;
        let png = renderer.render(asset.originality_score)?;
        self.bounded(
            "upload badge",
            self.collaborators
                .blobs
                .put(&badge_path(&asset.id), png, renderer.content_type()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_capture::LogCapture;
    use proofpix_core::stubs::{
        InMemoryBlobStore, InMemoryDocumentStore, StubAnalyzer, StubBadgeRenderer, StubEmbedder,
    };
    use proofpix_core::types::EMBEDDING_DIM;
    use tracing::Level;

    const ANALYSIS: &str = "Confidence Score: 0.8\n\nJustification: Even grain across the frame.";

    fn pipeline_with(
        analyzer: StubAnalyzer,
        embedder: StubEmbedder,
    ) -> (Pipeline, AssetTrigger) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        blobs.insert(upload_path("u1", "a1"), b"jpeg".to_vec());
        let index = Arc::new(IndexManager::new(EMBEDDING_DIM));
        index.build(&[]).unwrap();
        let pipeline = Pipeline::new(
            Collaborators {
                blobs,
                documents: Arc::new(InMemoryDocumentStore::new()),
                analyzer: Arc::new(analyzer),
                embedder: Arc::new(embedder),
                transparency_log: None,
                badges: Arc::new(StubBadgeRenderer::new()),
            },
            index,
            &PipelineConfig::default(),
        );
        (pipeline, AssetTrigger::new("u1", "a1"))
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        let text = "é".repeat(ANALYSIS_PREVIEW_CHARS + 10);
        assert_eq!(preview(&text).chars().count(), ANALYSIS_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn test_analysis_text_logged_when_embedding_fails() {
        println!("=== TEST: surviving analysis is logged ===");
        let (capture, _guard) = LogCapture::install();
        let (pipeline, trigger) =
            pipeline_with(StubAnalyzer::ok(ANALYSIS), StubEmbedder::failing("quota"));

        let report = pipeline.run(trigger).await;

        assert_eq!(report.outcome, Outcome::AnalysisFailed);
        let events = capture.with_message("discarding analysis after embedding failure");
        println!("AFTER: events={:?}", events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::WARN);
        assert_eq!(events[0].field("analysis"), Some(ANALYSIS));
        assert_eq!(events[0].field("chars"), Some(ANALYSIS.len().to_string().as_str()));
        println!("RESULT: PASS");
    }

    #[tokio::test]
    async fn test_embedding_logged_when_analysis_fails() {
        let (capture, _guard) = LogCapture::install();
        let (pipeline, trigger) =
            pipeline_with(StubAnalyzer::failing("quota"), StubEmbedder::deterministic(3));

        let report = pipeline.run(trigger).await;

        assert_eq!(report.outcome, Outcome::AnalysisFailed);
        let events = capture.with_message("discarding embedding after analysis failure");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].field("dimension"),
            Some(EMBEDDING_DIM.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_nothing_discarded_when_both_succeed() {
        let (capture, _guard) = LogCapture::install();
        let (pipeline, trigger) =
            pipeline_with(StubAnalyzer::ok(ANALYSIS), StubEmbedder::deterministic(3));

        let report = pipeline.run(trigger).await;

        assert_eq!(report.outcome, Outcome::Completed);
        assert!(capture
            .events()
            .iter()
            .all(|e| !e.message.starts_with("discarding")));
    }
}
