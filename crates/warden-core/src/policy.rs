//! Named failure policies for infrastructure checks.
//!
//! Two policies exist and each call site must pick one by name:
//!
//! - [`best_effort`]: the check is defense-in-depth; an infrastructure
//!   failure is logged and replaced with a fallback so the request is
//!   never blocked on it (rate-limit counters, admin-flag lookups).
//! - [`must_succeed`]: the check is safety-critical; an infrastructure
//!   failure surfaces as `Internal` while authorization failures pass
//!   through unchanged (verification-status lookups).

use tracing::warn;

use crate::errors::{WardenError, WardenResult};

/// Resolve a best-effort check: on error, log and substitute `fallback`.
pub fn best_effort<T>(what: &str, result: WardenResult<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(check = what, error = %error, "best-effort check failed, continuing");
            fallback
        }
    }
}

/// Resolve a fail-closed check: authorization failures propagate
/// unchanged, anything else becomes an `Internal` error naming the check.
pub fn must_succeed<T>(what: &str, result: WardenResult<T>) -> WardenResult<T> {
    result.map_err(|error| {
        if error.is_authorization() {
            error
        } else {
            warn!(check = what, error = %error, "fail-closed check failed");
            WardenError::internal(format!("{what} failed"))
        }
    })
}
