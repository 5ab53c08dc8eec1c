//! Injected time source.
//!
//! Components that read the clock take a [`TimeProvider`] at construction
//! so windows and expiries are deterministic under test.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Time source returning unix seconds.
pub type TimeProvider = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Provider backed by the system clock.
#[allow(clippy::disallowed_methods)]
pub fn system_time_provider() -> TimeProvider {
    Arc::new(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    })
}

/// Deterministic clock for tests: starts at a fixed instant and advances
/// only when told to.
#[derive(Debug, Clone, Default)]
pub struct TestClock {
    now: Arc<AtomicU64>,
}

impl TestClock {
    /// Create a clock pinned at `start` unix seconds.
    pub fn at(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Advance the clock by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Pin the clock to an absolute instant.
    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::SeqCst);
    }

    /// Current reading.
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Provider view of this clock.
    pub fn provider(&self) -> TimeProvider {
        let now = Arc::clone(&self.now);
        Arc::new(move || now.load(Ordering::SeqCst))
    }
}
