//! RocksDB-backed [`DocumentStore`].
//!
//! ```text
//! RocksDbDocumentStore
//! ├── DB (RocksDB instance)
//! │   └── CF: assets   - asset records, key = asset id, value = JSON object
//! └── Cache (LRU block cache, shared by all collections)
//! ```
//!
//! RocksDB calls are blocking, so every trait method runs on Tokio's
//! blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{Cache, ColumnFamily, IteratorMode, Options, DB};
use tracing::{debug, info};

use proofpix_core::traits::DocumentStore;
use proofpix_core::types::{Document, Fields};
use proofpix_core::CoreResult;

use crate::column_families::get_column_family_descriptors;
use crate::error::{StorageError, StorageResult};

/// Default block cache size (64MB).
pub const DEFAULT_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Default maximum open files.
pub const DEFAULT_MAX_OPEN_FILES: i32 = 1000;

/// Configuration for the RocksDB document store.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum open files (default: 1000).
    pub max_open_files: i32,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Create database if missing (default: true).
    pub create_if_missing: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            block_cache_size: DEFAULT_CACHE_SIZE,
            create_if_missing: true,
        }
    }
}

struct Inner {
    db: DB,
    /// Serializes read-modify-write updates.
    update_lock: Mutex<()>,
    #[allow(dead_code)]
    cache: Cache,
}

/// Document store persisting JSON objects in RocksDB.
///
/// Cheap to clone; clones share the database handle.
#[derive(Clone)]
pub struct RocksDbDocumentStore {
    inner: Arc<Inner>,
    path: String,
}

impl std::fmt::Debug for RocksDbDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbDocumentStore")
            .field("path", &self.path)
            .finish()
    }
}

impl RocksDbDocumentStore {
    /// Open (or create) the database at `path` with default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::open_with_config(path, RocksDbConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: RocksDbConfig,
    ) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let cache = Cache::new_lru_cache(config.block_cache_size);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(config.create_if_missing);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);

        let db = DB::open_cf_descriptors(&db_opts, &path_str, get_column_family_descriptors(&cache))
            .map_err(|e| StorageError::OpenFailed {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        info!(path = %path_str, "document store opened");
        Ok(Self {
            inner: Arc::new(Inner {
                db,
                update_lock: Mutex::new(()),
                cache,
            }),
            path: path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flush memtables of every collection to disk.
    pub fn flush(&self) -> StorageResult<()> {
        for name in crate::cf_names::ALL {
            let cf = self.inner.cf(name)?;
            self.inner
                .db
                .flush_cf(cf)
                .map_err(|e| StorageError::WriteFailed(format!("flush {}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Run `op` against the database on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> StorageResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StorageError::Internal(format!("blocking task failed: {}", e)))?
    }
}

impl Inner {
    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Fields>> {
        let cf = self.cf(collection)?;
        let bytes = self
            .db
            .get_cf(cf, id.as_bytes())
            .map_err(|e| StorageError::ReadFailed(format!("{}/{}: {}", collection, id, e)))?;
        bytes.map(|b| decode_fields(&b)).transpose()
    }

    fn put(&self, collection: &str, id: &str, fields: &Fields) -> StorageResult<()> {
        let cf = self.cf(collection)?;
        let bytes = serde_json::to_vec(fields)?;
        self.db
            .put_cf(cf, id.as_bytes(), bytes)
            .map_err(|e| StorageError::WriteFailed(format!("{}/{}: {}", collection, id, e)))
    }

    fn scan(&self, collection: &str) -> StorageResult<Vec<Document>> {
        let cf = self.cf(collection)?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) =
                item.map_err(|e| StorageError::ReadFailed(format!("scan {}: {}", collection, e)))?;
            let id = String::from_utf8(key.to_vec()).map_err(|e| {
                StorageError::Serialization(format!("non UTF-8 key in {}: {}", collection, e))
            })?;
            docs.push(Document::new(id, decode_fields(&value)?));
        }
        Ok(docs)
    }
}

fn decode_fields(bytes: &[u8]) -> StorageResult<Fields> {
    match serde_json::from_slice(bytes)? {
        serde_json::Value::Object(fields) => Ok(fields),
        other => Err(StorageError::Serialization(format!(
            "stored document is not an object: {}",
            other
        ))),
    }
}

#[async_trait]
impl DocumentStore for RocksDbDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        let doc = self
            .blocking(move |db| {
                Ok(db
                    .get(&collection, &id)?
                    .map(|fields| Document::new(id.clone(), fields)))
            })
            .await?;
        Ok(doc)
    }

    async fn set(&self, collection: &str, doc: Document) -> CoreResult<()> {
        let collection = collection.to_string();
        self.blocking(move |db| {
            let _guard = db.update_lock.lock();
            db.put(&collection, &doc.id, &doc.fields)?;
            debug!(collection = %collection, id = %doc.id, "document set");
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CoreResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.blocking(move |db| {
            let _guard = db.update_lock.lock();
            let mut existing = db
                .get(&collection, &id)?
                .ok_or_else(|| StorageError::NotFound {
                    collection: collection.clone(),
                    id: id.clone(),
                })?;
            for (key, value) in fields {
                existing.insert(key, value);
            }
            db.put(&collection, &id, &existing)?;
            debug!(collection = %collection, id = %id, "document updated");
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn scan(&self, collection: &str) -> CoreResult<Vec<Document>> {
        let collection = collection.to_string();
        Ok(self.blocking(move |db| db.scan(&collection)).await?)
    }
}
