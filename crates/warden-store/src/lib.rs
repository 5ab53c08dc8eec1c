//! Warden Store
//!
//! Storage seam for the authorization middleware: a small transactional
//! document-store trait, an in-memory implementation, and a deadline
//! decorator. The rate limiter's counter updates, profile reads, and
//! resource loads all go through this seam; the store's transaction
//! primitive is the stack's only synchronization point.

pub mod memory;
pub mod store;
pub mod timeout;

pub use memory::MemoryStore;
pub use store::{Document, DocumentStore, TxDecision, TxFn, TxOutcome};
pub use timeout::TimeoutStore;
