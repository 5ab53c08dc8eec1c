//! Double-submit CSRF guard.
//!
//! A browser client must present the same sealed token in the
//! `X-CSRF-Token` header and the csrf cookie; the token must then
//! independently validate against the binding derived from the current
//! request (caller id when authenticated, hashed session identifier
//! pre-auth) and its own expiry. Non-browser clients are exempt: they do
//! not share cookies with an attacker-controlled page, so the cross-site
//! threat model does not apply to them.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use warden_core::{CallRequest, SessionId, TimeProvider, UserId, WardenError, WardenResult};

use crate::cookies::parse_cookie_header;
use crate::sealer::{TokenClaims, TokenSealer};

/// Prefix marking session ids minted by the pre-auth issuance path.
pub const SESSION_ID_PREFIX: &str = "anon-";

/// Derive the pre-auth session identifier.
///
/// Inputs are the client address, the user-agent string, and the session
/// id; a caller whose address changes mid-session derives a different
/// identifier and its outstanding tokens stop validating.
pub fn session_binding(address: &str, user_agent: &str, session_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hasher.update([0u8]);
    hasher.update(user_agent.as_bytes());
    hasher.update([0u8]);
    hasher.update(session_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Guard configuration.
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// TTL of pre-auth, session-bound tokens.
    pub session_ttl_secs: u64,
    /// TTL of authenticated, identity-bound tokens.
    pub user_ttl_secs: u64,
    /// Cookie the double-submit token is read from.
    pub cookie_name: String,
    /// User-agent substrings identifying trusted non-browser clients.
    pub trusted_agent_markers: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 30 * 60,
            user_ttl_secs: 4 * 60 * 60,
            cookie_name: "csrf-token".to_string(),
            trusted_agent_markers: vec![
                "okhttp".to_string(),
                "CFNetwork".to_string(),
                "Dart/".to_string(),
            ],
        }
    }
}

/// Token issuance result handed back to the client.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Sealed wire token.
    pub token: String,
    /// Session the token is bound to.
    pub session_id: SessionId,
    /// Milliseconds until expiry.
    pub expires_in_millis: u64,
}

/// Session attached to the call context after successful validation.
#[derive(Debug, Clone)]
pub struct CsrfSession {
    /// Validated session id from the token.
    pub session_id: SessionId,
    /// The validated token itself.
    pub token: String,
}

/// Issues and validates anti-forgery tokens.
pub struct CsrfGuard {
    sealer: TokenSealer,
    config: CsrfConfig,
    now: TimeProvider,
}

impl CsrfGuard {
    /// Create a guard with the given sealer and configuration.
    pub fn new(sealer: TokenSealer, config: CsrfConfig, now: TimeProvider) -> Self {
        Self {
            sealer,
            config,
            now,
        }
    }

    /// Issue a pre-auth token bound to a fresh session.
    ///
    /// The binding is derived from the client address, the user agent,
    /// and the new session id; no identity is involved.
    pub fn issue_session_token(&self, req: &CallRequest) -> WardenResult<IssuedToken> {
        let session_id = format!("{SESSION_ID_PREFIX}{}", uuid::Uuid::new_v4().simple());
        let address = req.transport.client_address().unwrap_or_default();
        let user_agent = req.transport.user_agent.as_deref().unwrap_or_default();
        let binding = session_binding(address, user_agent, &session_id);
        self.issue(binding, session_id, self.config.session_ttl_secs)
    }

    /// Issue an authenticated token bound to the caller's identity.
    ///
    /// The session id comes from the identity assertion when present,
    /// otherwise a fresh one is minted.
    pub fn issue_user_token(
        &self,
        req: &CallRequest,
        caller: &UserId,
    ) -> WardenResult<IssuedToken> {
        let session_id = req
            .identity
            .as_ref()
            .and_then(|a| a.session.as_ref())
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        self.issue(
            caller.as_str().to_string(),
            session_id,
            self.config.user_ttl_secs,
        )
    }

    fn issue(
        &self,
        binding: String,
        session_id: String,
        ttl_secs: u64,
    ) -> WardenResult<IssuedToken> {
        let now = (self.now)();
        let claims = TokenClaims {
            binding,
            session_id: session_id.clone(),
            issued_at: now,
            expires_at: now + ttl_secs,
        };
        let token = self.sealer.seal(&claims)?;
        debug!(session = %claims.session_id, ttl_secs, "issued csrf token");
        Ok(IssuedToken {
            token,
            session_id: SessionId::new(session_id),
            expires_in_millis: ttl_secs * 1_000,
        })
    }

    /// Validate a request's anti-forgery posture.
    ///
    /// Returns `Ok(None)` for exempt trusted clients and
    /// `Ok(Some(session))` when the double-submit pair validates; every
    /// failure is `PermissionDenied` with a distinct message.
    pub fn verify(&self, req: &CallRequest) -> WardenResult<Option<CsrfSession>> {
        if self.is_trusted_client(req) {
            debug!("trusted client signature, csrf checks skipped");
            return Ok(None);
        }

        let header_token = req
            .transport
            .csrf_header
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WardenError::permission_denied("CSRF token missing in header"))?;

        let cookie_header = req.transport.cookie_header.as_deref().unwrap_or_default();
        let cookies = parse_cookie_header(cookie_header);
        let cookie_token = cookies
            .get(self.config.cookie_name.as_str())
            .ok_or_else(|| WardenError::permission_denied("CSRF token missing in cookie"))?;

        if header_token
            .as_bytes()
            .ct_eq(cookie_token.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(WardenError::permission_denied("CSRF token mismatch"));
        }

        // Equality alone is not sufficient; the token must also validate
        // against the binding derived from this request.
        let claims = self
            .sealer
            .open(header_token)
            .ok_or_else(invalid_or_expired)?;

        if claims.is_expired((self.now)()) {
            return Err(invalid_or_expired());
        }

        let expected_binding = self.expected_binding(req, &claims)?;
        if claims
            .binding
            .as_bytes()
            .ct_eq(expected_binding.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(invalid_or_expired());
        }

        Ok(Some(CsrfSession {
            session_id: SessionId::new(claims.session_id),
            token: header_token.to_string(),
        }))
    }

    /// Binding this request should carry: caller id when authenticated,
    /// recomputed session identifier for a pre-auth session token.
    fn expected_binding(&self, req: &CallRequest, claims: &TokenClaims) -> WardenResult<String> {
        if let Some(assertion) = &req.identity {
            if let Some(session) = &assertion.session {
                if session.as_str() != claims.session_id {
                    return Err(invalid_or_expired());
                }
            }
            return Ok(assertion.subject.as_str().to_string());
        }

        if !claims.session_id.starts_with(SESSION_ID_PREFIX) {
            return Err(invalid_or_expired());
        }
        let address = req.transport.client_address().unwrap_or_default();
        let user_agent = req.transport.user_agent.as_deref().unwrap_or_default();
        Ok(session_binding(address, user_agent, &claims.session_id))
    }

    fn is_trusted_client(&self, req: &CallRequest) -> bool {
        let Some(user_agent) = req.transport.user_agent.as_deref() else {
            return false;
        };
        self.config
            .trusted_agent_markers
            .iter()
            .any(|marker| user_agent.contains(marker.as_str()))
    }
}

fn invalid_or_expired() -> WardenError {
    WardenError::permission_denied("CSRF token invalid or expired")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use warden_core::{IdentityAssertion, TestClock};

    const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101";

    fn guard(clock: &TestClock) -> CsrfGuard {
        CsrfGuard::new(
            TokenSealer::new([9u8; 32]),
            CsrfConfig::default(),
            clock.provider(),
        )
    }

    fn browser_request() -> CallRequest {
        CallRequest::new(json!({}))
            .with_peer_address("203.0.113.7")
            .with_user_agent(BROWSER_UA)
    }

    fn with_tokens(req: CallRequest, token: &str) -> CallRequest {
        req.with_csrf_header(token)
            .with_cookie_header(format!("csrf-token={token}"))
    }

    #[test]
    fn test_session_token_roundtrip() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);

        let issued = guard.issue_session_token(&browser_request()).unwrap();
        assert!(issued.session_id.as_str().starts_with(SESSION_ID_PREFIX));
        assert_eq!(issued.expires_in_millis, 30 * 60 * 1_000);

        let req = with_tokens(browser_request(), &issued.token);
        let session = guard.verify(&req).unwrap().unwrap();
        assert_eq!(session.session_id, issued.session_id);
        assert_eq!(session.token, issued.token);
    }

    #[test]
    fn test_address_change_invalidates_session_token() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);
        let issued = guard.issue_session_token(&browser_request()).unwrap();

        let moved = with_tokens(
            CallRequest::new(json!({}))
                .with_peer_address("198.51.100.9")
                .with_user_agent(BROWSER_UA),
            &issued.token,
        );
        let err = guard.verify(&moved).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: CSRF token invalid or expired"
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);
        let issued = guard.issue_session_token(&browser_request()).unwrap();

        clock.advance(30 * 60);
        let req = with_tokens(browser_request(), &issued.token);
        let err = guard.verify(&req).unwrap_err();
        assert_matches!(err, WardenError::PermissionDenied { .. });
    }

    #[test]
    fn test_missing_header_and_cookie_have_distinct_messages() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);

        let err = guard.verify(&browser_request()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: CSRF token missing in header"
        );

        let err = guard
            .verify(&browser_request().with_csrf_header("tok"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: CSRF token missing in cookie"
        );
    }

    #[test]
    fn test_mismatched_pair_rejected_even_if_header_token_valid() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);
        let issued = guard.issue_session_token(&browser_request()).unwrap();

        let req = browser_request()
            .with_csrf_header(&issued.token)
            .with_cookie_header("csrf-token=abd");
        let err = guard.verify(&req).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: CSRF token mismatch");
    }

    #[test]
    fn test_trusted_client_is_exempt() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);

        let req = CallRequest::new(json!({})).with_user_agent("okhttp/4.12.0");
        assert!(guard.verify(&req).unwrap().is_none());
    }

    #[test]
    fn test_user_token_binds_to_identity() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);
        let alice = UserId::from("alice");

        let req = browser_request()
            .with_identity(IdentityAssertion::new("alice").with_session("sess-1"));
        let issued = guard.issue_user_token(&req, &alice).unwrap();
        assert_eq!(issued.session_id.as_str(), "sess-1");
        assert_eq!(issued.expires_in_millis, 4 * 60 * 60 * 1_000);

        // Same identity and session validates.
        let ok = with_tokens(req.clone(), &issued.token);
        assert!(guard.verify(&ok).unwrap().is_some());

        // Another caller presenting the stolen pair does not.
        let mallory = with_tokens(
            browser_request()
                .with_identity(IdentityAssertion::new("mallory").with_session("sess-1")),
            &issued.token,
        );
        assert_matches!(
            guard.verify(&mallory).unwrap_err(),
            WardenError::PermissionDenied { .. }
        );

        // Same caller from a different session does not either.
        let other_session = with_tokens(
            browser_request()
                .with_identity(IdentityAssertion::new("alice").with_session("sess-2")),
            &issued.token,
        );
        assert_matches!(
            guard.verify(&other_session).unwrap_err(),
            WardenError::PermissionDenied { .. }
        );
    }

    #[test]
    fn test_unauthenticated_caller_cannot_use_user_token() {
        let clock = TestClock::at(1_000);
        let guard = guard(&clock);
        let req = browser_request()
            .with_identity(IdentityAssertion::new("alice").with_session("sess-1"));
        let issued = guard.issue_user_token(&req, &UserId::from("alice")).unwrap();

        // Identity-bound session id lacks the pre-auth prefix.
        let anon = with_tokens(browser_request(), &issued.token);
        assert_matches!(
            guard.verify(&anon).unwrap_err(),
            WardenError::PermissionDenied { .. }
        );
    }
}
