//! Unified error system for Warden
//!
//! One error type for every authorization decision this stack makes. Each
//! variant is a stable kind a transport layer can map to its own codes;
//! messages are human-readable and never carry internal identifiers.

use serde::{Deserialize, Serialize};

/// Unified error type for all Warden operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum WardenError {
    /// No or invalid identity where one is required
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Error message describing the missing identity
        message: String,
    },

    /// Caller is known but not allowed to proceed
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the denial
        message: String,
    },

    /// Resource or profile missing
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// A required request field is absent from the payload
    #[error("Missing parameter: {message}")]
    MissingParameter {
        /// Error message naming the missing field
        message: String,
    },

    /// Quota exceeded; carries the seconds until the window reopens
    #[error("Resource exhausted: {message}")]
    ResourceExhausted {
        /// Error message describing the exhausted quota
        message: String,
        /// Seconds until the current window ends
        retry_after_secs: u64,
    },

    /// Unexpected provider/store failure during a fail-closed check
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal failure
        message: String,
    },
}

impl WardenError {
    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    /// Create a resource exhausted error with a retry hint
    pub fn resource_exhausted(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::ResourceExhausted {
            message: message.into(),
            retry_after_secs,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable kind string for transport-level error mapping
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::PermissionDenied { .. } => "permission-denied",
            Self::NotFound { .. } => "not-found",
            Self::MissingParameter { .. } => "invalid-argument",
            Self::ResourceExhausted { .. } => "resource-exhausted",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether this is a terminal authorization failure.
    ///
    /// Authorization failures propagate to the caller unchanged; anything
    /// else is an infrastructure failure subject to the fail-open or
    /// fail-closed policy of the check that produced it.
    pub fn is_authorization(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

/// Standard Result type for Warden operations
pub type Result<T> = std::result::Result<T, WardenError>;

/// Result alias used across the workspace crates
pub type WardenResult<T> = Result<T>;
