//! Inbound call envelope consumed by the middleware stack.
//!
//! A [`CallRequest`] is the only view this layer has of an RPC call: an
//! optional identity assertion produced by the transport's auth layer,
//! the transport metadata the guards need (peer address, forwarded-for,
//! user agent, cookie and CSRF headers), and the free-form JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{SessionId, UserId};

/// Opaque identity assertion attached to a request by the transport.
///
/// The subject id is stable; the provider-asserted verification flags are
/// hints that may be confirmed against the profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Stable subject id of the caller.
    pub subject: UserId,
    /// Session identifier asserted alongside the identity, if any.
    pub session: Option<SessionId>,
    /// Provider-asserted email verification flag.
    #[serde(default)]
    pub email_verified: bool,
    /// Provider-asserted phone verification flag.
    #[serde(default)]
    pub phone_verified: bool,
}

impl IdentityAssertion {
    /// Create an assertion for a subject with no session and no flags.
    pub fn new(subject: impl Into<UserId>) -> Self {
        Self {
            subject: subject.into(),
            session: None,
            email_verified: false,
            phone_verified: false,
        }
    }

    /// Attach a session identifier.
    pub fn with_session(mut self, session: impl Into<SessionId>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Mark the email as provider-verified.
    pub fn with_email_verified(mut self) -> Self {
        self.email_verified = true;
        self
    }

    /// Mark the phone as provider-verified.
    pub fn with_phone_verified(mut self) -> Self {
        self.phone_verified = true;
        self
    }
}

/// Transport metadata the guards read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportMeta {
    /// Transport-level peer address.
    pub peer_address: Option<String>,
    /// Raw `X-Forwarded-For` header value.
    pub forwarded_for: Option<String>,
    /// Raw `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Raw `Cookie` header value.
    pub cookie_header: Option<String>,
    /// Raw `X-CSRF-Token` header value.
    pub csrf_header: Option<String>,
}

impl TransportMeta {
    /// Resolve the client address: first entry of the forwarded-for
    /// header when present, otherwise the transport peer address.
    pub fn client_address(&self) -> Option<&str> {
        if let Some(forwarded) = self.forwarded_for.as_deref() {
            let first = forwarded.split(',').next().map(str::trim);
            if let Some(addr) = first {
                if !addr.is_empty() {
                    return Some(addr);
                }
            }
        }
        self.peer_address.as_deref()
    }
}

/// One inbound RPC call as seen by the authorization layer.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Identity assertion, when the transport authenticated the caller.
    pub identity: Option<IdentityAssertion>,
    /// Transport metadata.
    pub transport: TransportMeta,
    /// Free-form business payload.
    pub payload: Value,
}

impl CallRequest {
    /// Create a request carrying only a payload.
    pub fn new(payload: Value) -> Self {
        Self {
            identity: None,
            transport: TransportMeta::default(),
            payload,
        }
    }

    /// Attach an identity assertion.
    pub fn with_identity(mut self, identity: IdentityAssertion) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the transport peer address.
    pub fn with_peer_address(mut self, addr: impl Into<String>) -> Self {
        self.transport.peer_address = Some(addr.into());
        self
    }

    /// Set the forwarded-for header value.
    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.transport.forwarded_for = Some(value.into());
        self
    }

    /// Set the user-agent header value.
    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.transport.user_agent = Some(value.into());
        self
    }

    /// Set the cookie header value.
    pub fn with_cookie_header(mut self, value: impl Into<String>) -> Self {
        self.transport.cookie_header = Some(value.into());
        self
    }

    /// Set the CSRF token header value.
    pub fn with_csrf_header(mut self, value: impl Into<String>) -> Self {
        self.transport.csrf_header = Some(value.into());
        self
    }

    /// Subject id from the identity assertion, if any.
    pub fn subject(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|a| &a.subject)
    }

    /// String payload field, if present and a string.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}
