//! In-memory [`BlobStore`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{CoreError, CoreResult};
use crate::traits::BlobStore;

/// HashMap-backed blob store with write-failure injection.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
    failing_prefixes: RwLock<Vec<String>>,
    fail_reads: AtomicBool,
    puts: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a put.
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.objects
            .write()
            .insert(path.into(), (bytes, "application/octet-stream".into()));
    }

    /// Make every `put` under `prefix` fail.
    pub fn fail_writes_under(&self, prefix: impl Into<String>) {
        self.failing_prefixes.write().push(prefix.into());
    }

    /// Make every `get` fail with a storage error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().contains_key(path)
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().get(path).map(|(bytes, _)| bytes.clone())
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.read().get(path).map(|(_, ct)| ct.clone())
    }

    /// Paths currently stored, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of successful `put` calls.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, path: &str) -> CoreResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError(format!("injected read failure: {}", path)));
        }
        Ok(self.object(path))
    }

    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> CoreResult<()> {
        if self
            .failing_prefixes
            .read()
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(CoreError::StorageError(format!(
                "injected write failure: {}",
                path
            )));
        }
        self.objects
            .write()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_and_missing() {
        let store = InMemoryBlobStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);

        store.put("a/b.bin", vec![1, 2, 3], "application/octet-stream").await.unwrap();
        assert_eq!(store.get("a/b.bin").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_write_failure_is_prefix_scoped() {
        let store = InMemoryBlobStore::new();
        store.fail_writes_under("badges/");

        assert!(store.put("badges/x.png", vec![0], "image/png").await.is_err());
        assert!(store.put("certificates/x.json", vec![0], "application/json").await.is_ok());
        assert!(!store.contains("badges/x.png"));
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = InMemoryBlobStore::new();
        store.insert("k", vec![9]);
        store.fail_reads();
        assert!(matches!(store.get("k").await, Err(CoreError::StorageError(_))));
    }
}
