//! Concurrent lifecycle manager for the process-wide vector index.
//!
//! # Locking
//!
//! The index and its id map live together behind one
//! `parking_lot::RwLock<Option<VectorIndex>>`:
//!
//! - `search`, `has_index`, `len`, and snapshot encoding take the read lock
//! - `add`, `add_if_absent`, and installing a loaded or built index take
//!   the write lock
//!
//! The lock is never held across an `.await`. Snapshot decoding and index
//! construction happen before the write lock is taken; snapshot uploads
//! happen after the read lock is released.

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use proofpix_core::traits::{BlobStore, DocumentStore};
use proofpix_core::types::{Document, VectorEntry};

use crate::error::{IndexError, IndexResult};
use crate::flat::VectorIndex;
use crate::snapshot::{self, SNAPSHOT_CONTENT_TYPE};

/// Nearest neighbours returned by [`IndexManager::search`].
///
/// `distances[i]` belongs to `external_ids[i]`; both are ordered nearest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub distances: Vec<f32>,
    pub external_ids: Vec<String>,
}

impl SearchHits {
    pub fn len(&self) -> usize {
        self.external_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }
}

/// Result of [`IndexManager::add_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended at this sequence id.
    Added(u64),
    /// Already present at this (first) sequence id; nothing appended.
    AlreadyIndexed(u64),
}

impl AddOutcome {
    pub fn sequence_id(&self) -> u64 {
        match self {
            Self::Added(seq) | Self::AlreadyIndexed(seq) => *seq,
        }
    }
}

/// Counts from [`IndexManager::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub indexed: usize,
    /// Documents without an `embedding` field.
    pub skipped_missing: usize,
    /// Documents whose embedding was malformed or had the wrong dimension.
    pub skipped_invalid: usize,
}

/// Where the startup index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupSource {
    /// Decoded from the persisted snapshot.
    Loaded { vectors: usize },
    /// Rebuilt from the document store and saved.
    Built(BuildReport),
}

/// Embedding fields read from an asset document during a rebuild.
#[derive(Debug, Deserialize)]
struct EmbeddingRecord {
    embedding: Vec<f32>,
    #[serde(rename = "assetId", default)]
    asset_id: Option<String>,
}

impl EmbeddingRecord {
    const EMBEDDING_FIELD: &'static str = "embedding";
    const ASSET_ID_FIELD: &'static str = "assetId";

    /// `Ok(None)` when the document carries no embedding at all.
    fn from_document(doc: &Document) -> Result<Option<Self>, serde_json::Error> {
        let embedding = match doc.field(Self::EMBEDDING_FIELD) {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(value) => value.clone(),
        };
        let mut fields = serde_json::Map::with_capacity(2);
        fields.insert(Self::EMBEDDING_FIELD.to_string(), embedding);
        if let Some(asset_id) = doc.field(Self::ASSET_ID_FIELD) {
            fields.insert(Self::ASSET_ID_FIELD.to_string(), asset_id.clone());
        }
        serde_json::from_value(serde_json::Value::Object(fields)).map(Some)
    }
}

/// Owner of the process-wide vector index.
///
/// Construct once at startup and share as `Arc<IndexManager>`.
#[derive(Debug)]
pub struct IndexManager {
    dimension: usize,
    index: RwLock<Option<VectorIndex>>,
}

impl IndexManager {
    /// Create a manager with no index installed.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            index: RwLock::new(None),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Load the snapshot at `path` and install it.
    ///
    /// A missing snapshot is not an error: nothing is installed and any
    /// current index is kept.
    pub async fn load(&self, blobs: &dyn BlobStore, path: &str) -> IndexResult<()> {
        let bytes = match blobs
            .get(path)
            .await
            .map_err(|e| IndexError::storage(format!("reading snapshot {}", path), e))?
        {
            Some(bytes) => bytes,
            None => {
                info!(path, "no index snapshot found");
                return Ok(());
            }
        };

        let loaded = snapshot::decode(&bytes, self.dimension, path)?;
        let vectors = loaded.len();
        *self.index.write() = Some(loaded);

        info!(path, vectors, "index snapshot loaded");
        Ok(())
    }

    /// Build a fresh index from `documents` in the order given and install it.
    ///
    /// Each document's external id is its `assetId` field when present,
    /// otherwise the document id. Documents without an embedding, or with a
    /// malformed one, are skipped.
    pub fn build(&self, documents: &[Document]) -> IndexResult<BuildReport> {
        let mut report = BuildReport::default();
        let mut fresh = VectorIndex::with_capacity(self.dimension, documents.len());

        for doc in documents {
            let record = match EmbeddingRecord::from_document(doc) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    report.skipped_missing += 1;
                    continue;
                }
                Err(e) => {
                    warn!(doc_id = %doc.id, error = %e, "skipping document with malformed embedding");
                    report.skipped_invalid += 1;
                    continue;
                }
            };

            let external_id = record.asset_id.as_deref().unwrap_or(&doc.id);
            match fresh.add(external_id, &record.embedding) {
                Ok(_) => report.indexed += 1,
                Err(e) => {
                    warn!(doc_id = %doc.id, error = %e, "skipping document with invalid embedding");
                    report.skipped_invalid += 1;
                }
            }
        }

        *self.index.write() = Some(fresh);

        info!(
            indexed = report.indexed,
            skipped_missing = report.skipped_missing,
            skipped_invalid = report.skipped_invalid,
            "index built from documents"
        );
        Ok(report)
    }

    /// Scan `collection` and [`build`](Self::build) from it.
    pub async fn build_from_store(
        &self,
        documents: &dyn DocumentStore,
        collection: &str,
    ) -> IndexResult<BuildReport> {
        let docs = documents
            .scan(collection)
            .await
            .map_err(|e| IndexError::storage(format!("scanning collection {}", collection), e))?;
        self.build(&docs)
    }

    /// Persist the installed index to `path`. Returns the number of vectors
    /// written.
    pub async fn save(&self, blobs: &dyn BlobStore, path: &str) -> IndexResult<usize> {
        let (bytes, vectors) = {
            let guard = self.index.read();
            let index = guard.as_ref().ok_or(IndexError::NoIndex)?;
            (snapshot::encode(index)?, index.len())
        };

        blobs
            .put(path, bytes, SNAPSHOT_CONTENT_TYPE)
            .await
            .map_err(|e| IndexError::storage(format!("writing snapshot {}", path), e))?;

        info!(path, vectors, "index snapshot saved");
        Ok(vectors)
    }

    pub fn has_index(&self) -> bool {
        self.index.read().is_some()
    }

    /// Number of indexed vectors; 0 when no index is installed.
    pub fn len(&self) -> usize {
        self.index.read().as_ref().map_or(0, VectorIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest external ids to `vector`.
    ///
    /// Empty when no index is installed, the index holds no vectors, or
    /// `k == 0`.
    ///
    /// # Errors
    ///
    /// [`IndexError::DimensionMismatch`] when the query length differs from
    /// the manager's dimension, whether or not an index is installed.
    pub fn search(&self, vector: &[f32], k: usize) -> IndexResult<SearchHits> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let guard = self.index.read();
        let index = match guard.as_ref() {
            Some(index) => index,
            None => return Ok(SearchHits::default()),
        };

        let hits = index.search(vector, k)?;
        let mut result = SearchHits {
            distances: Vec::with_capacity(hits.len()),
            external_ids: Vec::with_capacity(hits.len()),
        };
        for (distance, sequence_id) in hits {
            // Every sequence id returned by the index is present in its id map.
            if let Some(id) = index.external_id(sequence_id) {
                result.distances.push(distance);
                result.external_ids.push(id.to_string());
            }
        }
        Ok(result)
    }

    /// Append `vector` under `external_id`; returns its `sequence_id`.
    pub fn add(&self, external_id: &str, vector: &[f32]) -> IndexResult<u64> {
        let mut guard = self.index.write();
        let index = guard.as_mut().ok_or(IndexError::NoIndex)?;
        index.add(external_id, vector)
    }

    /// Append `vector` unless `external_id` is already indexed.
    ///
    /// The check and the append happen under one write lock, so concurrent
    /// redeliveries of the same asset add it once.
    pub fn add_if_absent(&self, external_id: &str, vector: &[f32]) -> IndexResult<AddOutcome> {
        let mut guard = self.index.write();
        let index = guard.as_mut().ok_or(IndexError::NoIndex)?;
        if let Some(existing) = index.sequence_of(external_id) {
            debug!(external_id, sequence_id = existing, "already indexed");
            return Ok(AddOutcome::AlreadyIndexed(existing));
        }
        index.add(external_id, vector).map(AddOutcome::Added)
    }

    /// Copy of every `(sequence_id, external_id, vector)` triple.
    pub fn snapshot_entries(&self) -> Vec<VectorEntry> {
        self.index
            .read()
            .as_ref()
            .map(VectorIndex::entries)
            .unwrap_or_default()
    }

    /// Startup lifecycle: load the snapshot; if there is none, build from
    /// `collection` and save the result to `snapshot_path`.
    pub async fn load_or_build(
        &self,
        blobs: &dyn BlobStore,
        documents: &dyn DocumentStore,
        snapshot_path: &str,
        collection: &str,
    ) -> IndexResult<StartupSource> {
        self.load(blobs, snapshot_path).await?;
        if self.has_index() {
            return Ok(StartupSource::Loaded {
                vectors: self.len(),
            });
        }

        info!(collection, "index snapshot missing, rebuilding from documents");
        let report = self.build_from_store(documents, collection).await?;
        self.save(blobs, snapshot_path).await?;
        Ok(StartupSource::Built(report))
    }
}
