//! Transactional document store seam.
//!
//! The middleware depends on one storage capability: point reads plus an
//! atomic read-check-write step. The transaction closure receives the
//! current document (if any) and decides the outcome; the store guarantees
//! the closure's view and its write are one indivisible step, so N
//! concurrent transactions against one document serialize.

use async_trait::async_trait;
use serde_json::Value;

use warden_core::{WardenError, WardenResult};

/// A stored document. Collections hold JSON objects keyed by id.
pub type Document = Value;

/// Decision returned by a transaction closure.
pub enum TxDecision {
    /// Replace the document with this value.
    Write(Document),
    /// Abort the transaction; the error propagates verbatim to the
    /// caller. This is how domain conditions (quota exhausted) surface
    /// distinguishably from infrastructure failures.
    Abort(WardenError),
    /// Leave the document untouched.
    Keep,
}

/// What a committed transaction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// The document was written with this value.
    Written(Document),
    /// The document was left as-is.
    Kept(Option<Document>),
}

/// Transaction closure type: current document in, decision out.
pub type TxFn<'a> = &'a (dyn Fn(Option<&Document>) -> TxDecision + Send + Sync);

/// Key-value/transactional store the middleware reads and counts through.
///
/// Implementations must make `transact` atomic per `(collection, id)`:
/// the closure's read and the applied decision happen with no interleaved
/// writer. Infrastructure failures are `WardenError::Internal`; an
/// `Abort` decision propagates its embedded error unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get(&self, collection: &str, id: &str) -> WardenResult<Option<Document>>;

    /// Run an atomic read-check-write against one document.
    async fn transact(
        &self,
        collection: &str,
        id: &str,
        tx: TxFn<'_>,
    ) -> WardenResult<TxOutcome>;
}
