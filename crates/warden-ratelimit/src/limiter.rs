//! Fixed-window rate limiter.
//!
//! Quota is a defense-in-depth control, not a safety invariant: the only
//! condition that blocks a request is an explicit quota-exceeded abort
//! from the counter transaction. Every infrastructure failure along the
//! way is logged and the request allowed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use warden_core::policy::best_effort;
use warden_core::{TimeProvider, UserId, WardenError, WardenResult};
use warden_identity::ProfileDirectory;
use warden_store::{Document, DocumentStore, TxDecision};

use crate::config::RateLimitConfig;

/// Collection holding the rate counters.
pub const RATE_LIMITS_COLLECTION: &str = "rate_limits";

/// Who is consuming quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSubject {
    /// Authenticated caller, keyed by user id.
    User(UserId),
    /// Unauthenticated caller, keyed by client address.
    Ip(String),
}

impl RateSubject {
    /// Counter key prefix for this subject.
    pub fn key(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Ip(addr) => format!("ip:{addr}"),
        }
    }
}

/// Persisted consumption of one subject's quota in one window.
///
/// Never deleted; a record whose window has passed is reinitialized on
/// the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitCounter {
    /// Subject key the counter belongs to.
    pub subject_key: String,
    /// Calls admitted in the current window.
    pub count: u64,
    /// Unix seconds at which the current window opened.
    pub window_start: u64,
    /// Unix seconds of the most recent admitted call.
    pub last_request: u64,
}

/// Fixed-window rate limiter over the transactional store.
pub struct RateLimiter {
    store: Arc<dyn DocumentStore>,
    directory: Arc<dyn ProfileDirectory>,
    now: TimeProvider,
}

impl RateLimiter {
    /// Create a limiter over the given store and directory.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        directory: Arc<dyn ProfileDirectory>,
        now: TimeProvider,
    ) -> Self {
        Self {
            store,
            directory,
            now,
        }
    }

    /// Consume one unit of quota for `subject` under `config`.
    ///
    /// Returns `Ok(())` when the call is admitted, and
    /// `ResourceExhausted` (with a retry-after hint) when the subject's
    /// window is full. Any other failure is resolved fail-open.
    pub async fn consume(
        &self,
        subject: &RateSubject,
        config: &RateLimitConfig,
    ) -> WardenResult<()> {
        // Admin bypass only applies to identity subjects; the lookup is
        // best-effort and a failed lookup limits as a non-admin.
        if config.ignore_admin {
            if let RateSubject::User(user) = subject {
                let is_admin = best_effort(
                    "admin flag lookup",
                    self.directory
                        .profile(user)
                        .await
                        .map(|p| p.is_some_and(|profile| profile.is_admin)),
                    false,
                );
                if is_admin {
                    debug!(subject = %subject.key(), "admin bypass, skipping rate limit");
                    return Ok(());
                }
            }
        }

        let counter_id = format!("{}:{}", subject.key(), config.category.as_str());
        let now = (self.now)();
        let subject_key = subject.key();
        let max_requests = config.max_requests;
        let window_secs = config.window_secs;

        let result = self
            .store
            .transact(RATE_LIMITS_COLLECTION, &counter_id, &move |current: Option<&Document>| {
                let counter = current
                    .cloned()
                    .and_then(|doc| serde_json::from_value::<RateLimitCounter>(doc).ok());

                let updated = match counter {
                    // Fresh window: either no record yet, or the stored
                    // window has fully elapsed.
                    None => RateLimitCounter {
                        subject_key: subject_key.clone(),
                        count: 1,
                        window_start: now,
                        last_request: now,
                    },
                    Some(c) if now > c.window_start + window_secs => RateLimitCounter {
                        subject_key: subject_key.clone(),
                        count: 1,
                        window_start: now,
                        last_request: now,
                    },
                    Some(c) if c.count >= max_requests => {
                        let retry_after =
                            (c.window_start + window_secs).saturating_sub(now);
                        return TxDecision::Abort(WardenError::resource_exhausted(
                            format!(
                                "quota exceeded, retry after {retry_after} seconds"
                            ),
                            retry_after,
                        ));
                    }
                    Some(c) => RateLimitCounter {
                        count: c.count + 1,
                        last_request: now,
                        ..c
                    },
                };

                match serde_json::to_value(&updated) {
                    Ok(doc) => TxDecision::Write(doc),
                    Err(e) => TxDecision::Abort(WardenError::internal(format!(
                        "counter serialization failed: {e}"
                    ))),
                }
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err @ WardenError::ResourceExhausted { .. }) => {
                debug!(counter = counter_id, "quota exceeded");
                Err(err)
            }
            Err(error) => {
                // Fail open: a store outage never blocks traffic.
                warn!(counter = counter_id, error = %error, "rate limit store failed, allowing request");
                Ok(())
            }
        }
    }
}
