//! In-memory [`DocumentStore`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{CoreError, CoreResult};
use crate::traits::DocumentStore;
use crate::types::{Document, Fields};

type Collection = BTreeMap<String, Fields>;

/// BTreeMap-backed document store. `scan` returns documents in id order.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    fail_sets: AtomicBool,
    fail_updates: AtomicBool,
    sets: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set` fail.
    pub fn fail_sets(&self) {
        self.fail_sets.store(true, Ordering::SeqCst);
    }

    /// Make every `update` fail.
    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(&self, collection: &str, doc: Document) -> CoreResult<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError(format!(
                "injected set failure: {}/{}",
                collection, doc.id
            )));
        }
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id, doc.fields);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CoreResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError(format!(
                "injected update failure: {}/{}",
                collection, id
            )));
        }
        let mut collections = self.collections.write();
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| CoreError::not_found(collection, id))?;
        for (key, value) in fields {
            existing.insert(key, value);
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scan(&self, collection: &str) -> CoreResult<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
