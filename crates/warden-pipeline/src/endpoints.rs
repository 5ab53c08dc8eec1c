//! Built-in token-issuance endpoints.
//!
//! Both return `{ token, sessionId, expiresInMillis }`. The session
//! variant requires no identity; the authenticated variant binds the
//! token to the caller's id.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use warden_core::{CallRequest, WardenResult};
use warden_csrf::{CsrfGuard, IssuedToken};
use warden_identity::IdentityGate;

use crate::handler::{CallContext, CallHandler};

fn issuance_payload(issued: IssuedToken) -> Value {
    json!({
        "token": issued.token,
        "sessionId": issued.session_id,
        "expiresInMillis": issued.expires_in_millis,
    })
}

/// Issues pre-auth, session-bound tokens.
pub struct IssueSessionTokenEndpoint {
    csrf: Arc<CsrfGuard>,
}

impl IssueSessionTokenEndpoint {
    /// Create the endpoint over the given guard.
    pub fn new(csrf: Arc<CsrfGuard>) -> Self {
        Self { csrf }
    }
}

#[async_trait]
impl CallHandler for IssueSessionTokenEndpoint {
    async fn handle(&self, _ctx: CallContext, req: CallRequest) -> WardenResult<Value> {
        let issued = self.csrf.issue_session_token(&req)?;
        Ok(issuance_payload(issued))
    }

    fn name(&self) -> &'static str {
        "issue-session-token"
    }
}

/// Issues identity-bound tokens to authenticated callers.
pub struct IssueUserTokenEndpoint {
    csrf: Arc<CsrfGuard>,
    gate: Arc<IdentityGate>,
}

impl IssueUserTokenEndpoint {
    /// Create the endpoint over the given guard and gate.
    pub fn new(csrf: Arc<CsrfGuard>, gate: Arc<IdentityGate>) -> Self {
        Self { csrf, gate }
    }
}

#[async_trait]
impl CallHandler for IssueUserTokenEndpoint {
    async fn handle(&self, _ctx: CallContext, req: CallRequest) -> WardenResult<Value> {
        let caller = self.gate.require_authenticated(&req)?;
        let issued = self.csrf.issue_user_token(&req, &caller)?;
        Ok(issuance_payload(issued))
    }

    fn name(&self) -> &'static str {
        "issue-user-token"
    }
}
