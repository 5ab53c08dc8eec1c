//! Bounded-deadline store decorator.
//!
//! Every store call must complete within a deadline so a store outage
//! degrades to the callers' failure policy instead of hanging the
//! request. Elapsed deadlines surface as `Internal` store errors, which
//! best-effort callers treat as fail-open.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use warden_core::{WardenError, WardenResult};

use crate::store::{Document, DocumentStore, TxFn, TxOutcome};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(2);

/// Decorator wrapping every call of an inner store in a deadline.
pub struct TimeoutStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S> TimeoutStore<S> {
    /// Wrap `inner` with the default 2 s deadline.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override the deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn get(&self, collection: &str, id: &str) -> WardenResult<Option<Document>> {
        match tokio::time::timeout(self.deadline, self.inner.get(collection, id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(collection, id, "store read exceeded deadline");
                Err(WardenError::internal("store call timed out"))
            }
        }
    }

    async fn transact(
        &self,
        collection: &str,
        id: &str,
        tx: TxFn<'_>,
    ) -> WardenResult<TxOutcome> {
        match tokio::time::timeout(self.deadline, self.inner.transact(collection, id, tx)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(collection, id, "store transaction exceeded deadline");
                Err(WardenError::internal("store call timed out"))
            }
        }
    }
}
