//! In-memory store implementation.
//!
//! Primary store for tests and single-process embeddings. The map lock is
//! held across the transaction closure, which makes `transact` atomic per
//! store rather than per document; that is a stronger guarantee than the
//! trait requires and is acceptable at this scale.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use warden_core::WardenResult;

use crate::store::{Document, DocumentStore, TxDecision, TxFn, TxOutcome};

/// Memory-backed [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<(String, String), Document>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, replacing any existing value.
    pub fn insert(&self, collection: &str, id: &str, doc: Document) {
        self.documents
            .lock()
            .insert((collection.to_string(), id.to_string()), doc);
    }

    /// Number of stored documents, across all collections.
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> WardenResult<Option<Document>> {
        let key = (collection.to_string(), id.to_string());
        Ok(self.documents.lock().get(&key).cloned())
    }

    async fn transact(
        &self,
        collection: &str,
        id: &str,
        tx: TxFn<'_>,
    ) -> WardenResult<TxOutcome> {
        let key = (collection.to_string(), id.to_string());
        let mut documents = self.documents.lock();
        let current = documents.get(&key);
        match tx(current) {
            TxDecision::Write(doc) => {
                documents.insert(key, doc.clone());
                Ok(TxOutcome::Written(doc))
            }
            TxDecision::Abort(error) => Err(error),
            TxDecision::Keep => Ok(TxOutcome::Kept(current.cloned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_core::WardenError;

    #[tokio::test]
    async fn test_get_and_insert() {
        let store = MemoryStore::new();
        assert!(store.get("profiles", "alice").await.unwrap().is_none());

        store.insert("profiles", "alice", json!({"isAdmin": true}));
        let doc = store.get("profiles", "alice").await.unwrap().unwrap();
        assert_eq!(doc["isAdmin"], json!(true));
    }

    #[tokio::test]
    async fn test_transact_write_and_keep() {
        let store = MemoryStore::new();

        let outcome = store
            .transact("counters", "c1", &|current| {
                assert!(current.is_none());
                TxDecision::Write(json!({"count": 1}))
            })
            .await
            .unwrap();
        assert_eq!(outcome, TxOutcome::Written(json!({"count": 1})));

        let outcome = store
            .transact("counters", "c1", &|current| {
                assert_eq!(current.unwrap()["count"], json!(1));
                TxDecision::Keep
            })
            .await
            .unwrap();
        assert_eq!(outcome, TxOutcome::Kept(Some(json!({"count": 1}))));
    }

    #[tokio::test]
    async fn test_transact_abort_leaves_document_untouched() {
        let store = MemoryStore::new();
        store.insert("counters", "c1", json!({"count": 5}));

        let err = store
            .transact("counters", "c1", &|_| {
                TxDecision::Abort(WardenError::resource_exhausted("quota exceeded", 30))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::ResourceExhausted { .. }));

        let doc = store.get("counters", "c1").await.unwrap().unwrap();
        assert_eq!(doc["count"], json!(5));
    }
}
