//! Business handler seam.

use async_trait::async_trait;
use serde_json::Value;

use warden_core::{CallRequest, SessionId, UserId, WardenResult};
use warden_store::Document;

/// Context accumulated by the guards before the handler runs.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Caller id resolved by the identity or access checks.
    pub caller: Option<UserId>,
    /// Session id validated by the CSRF guard.
    pub session: Option<SessionId>,
    /// The validated anti-forgery token, when one was presented.
    pub csrf_token: Option<String>,
    /// Resource document loaded by the access controller.
    pub resource: Option<Document>,
}

/// A business handler invoked after every configured guard has passed.
///
/// Handlers hold no per-request state; everything they need arrives in
/// the context and the request.
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Process the call and produce a response payload.
    async fn handle(&self, ctx: CallContext, req: CallRequest) -> WardenResult<Value>;

    /// Handler name for logging.
    fn name(&self) -> &'static str {
        "handler"
    }
}
