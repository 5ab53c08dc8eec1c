//! Abuse categories and limiter configuration.

use serde::{Deserialize, Serialize};

/// Abuse category namespacing the counters.
///
/// One subject consumes independent quota per category, so a burst of
/// media uploads cannot starve the same user's auth flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbuseCategory {
    /// Default bucket for reads and uncategorized calls.
    General,
    /// Sign-in, verification, and password flows.
    Auth,
    /// State-changing business calls.
    Write,
    /// Uploads and other payload-heavy calls.
    Media,
    /// Account deletion, exports, and other rarely-legitimate bursts.
    Sensitive,
}

impl AbuseCategory {
    /// Counter namespace tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Write => "write",
            Self::Media => "media",
            Self::Sensitive => "sensitive",
        }
    }
}

impl std::fmt::Display for AbuseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limiter configuration for one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Category the counter lives under.
    pub category: AbuseCategory,
    /// Maximum calls per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Skip limiting for administrative accounts (identity subjects only).
    pub ignore_admin: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            category: AbuseCategory::General,
            max_requests: 60,
            window_secs: 60,
            ignore_admin: false,
        }
    }
}

impl RateLimitConfig {
    /// Per-category presets for identity-keyed limiting.
    pub fn for_category(category: AbuseCategory) -> Self {
        let (max_requests, window_secs) = match category {
            AbuseCategory::General => (60, 60),
            AbuseCategory::Auth => (10, 300),
            AbuseCategory::Write => (30, 60),
            AbuseCategory::Media => (20, 300),
            AbuseCategory::Sensitive => (5, 3600),
        };
        Self {
            category,
            max_requests,
            window_secs,
            ignore_admin: false,
        }
    }

    /// Stricter defaults for IP-keyed limiting: lower ceiling, longer
    /// window, and never an admin bypass.
    pub fn ip_default(category: AbuseCategory) -> Self {
        let identity = Self::for_category(category);
        Self {
            category,
            max_requests: (identity.max_requests / 2).max(1),
            window_secs: identity.window_secs * 2,
            ignore_admin: false,
        }
    }

    /// Override the ceiling.
    pub fn with_max_requests(mut self, max_requests: u64) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Override the window length.
    pub fn with_window_secs(mut self, window_secs: u64) -> Self {
        self.window_secs = window_secs;
        self
    }

    /// Enable the admin bypass.
    pub fn with_ignore_admin(mut self) -> Self {
        self.ignore_admin = true;
        self
    }
}
