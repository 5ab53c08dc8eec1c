//! Warden Ratelimit
//!
//! Fixed-window rate limiting keyed by user id or client address. The
//! counter update is a single atomic transaction against the store, so
//! concurrent requests against a nearly-full window admit exactly up to
//! the ceiling. Everything except an explicit quota abort fails open.

pub mod config;
pub mod limiter;

pub use config::{AbuseCategory, RateLimitConfig};
pub use limiter::{RateLimitCounter, RateLimiter, RateSubject, RATE_LIMITS_COLLECTION};
