//! Guard pipeline composition.
//!
//! Order is fixed: CSRF wraps everything else, so a forged-token request
//! never reaches rate limiting or business logic; inside the validated
//! (or exempt) path, rate limiting runs before the identity-tier and
//! resource checks so abusive traffic never pays a directory read or a
//! permission evaluation.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use warden_access::ResourceAccessController;
use warden_core::{CallRequest, TimeProvider, WardenResult};
use warden_csrf::{CsrfConfig, CsrfGuard, TokenSealer};
use warden_identity::{IdentityGate, ProfileDirectory, StoreDirectory};
use warden_ratelimit::{RateLimiter, RateSubject};
use warden_store::DocumentStore;

use crate::config::{AuthLevel, EndpointConfig};
use crate::handler::{CallContext, CallHandler};

/// Shared guard components, injected once and reused by every endpoint.
#[derive(Clone)]
pub struct Pipeline {
    gate: Arc<IdentityGate>,
    limiter: Arc<RateLimiter>,
    csrf: Arc<CsrfGuard>,
    access: Arc<ResourceAccessController>,
}

impl Pipeline {
    /// Compose a pipeline from explicitly constructed components.
    pub fn new(
        gate: Arc<IdentityGate>,
        limiter: Arc<RateLimiter>,
        csrf: Arc<CsrfGuard>,
        access: Arc<ResourceAccessController>,
    ) -> Self {
        Self {
            gate,
            limiter,
            csrf,
            access,
        }
    }

    /// Build the standard component set over one store: store-backed
    /// profile directory, default CSRF configuration, shared clock.
    pub fn with_defaults(
        store: Arc<dyn DocumentStore>,
        sealer: TokenSealer,
        now: TimeProvider,
    ) -> Self {
        let directory: Arc<dyn ProfileDirectory> =
            Arc::new(StoreDirectory::new(Arc::clone(&store)));
        let gate = Arc::new(IdentityGate::new(Arc::clone(&directory)));
        let limiter = Arc::new(RateLimiter::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&now),
        ));
        let csrf = Arc::new(CsrfGuard::new(sealer, CsrfConfig::default(), now));
        let access = Arc::new(ResourceAccessController::new(
            store,
            directory,
            Arc::clone(&gate),
        ));
        Self::new(gate, limiter, csrf, access)
    }

    /// The identity gate, for handlers that enforce tiers themselves.
    pub fn gate(&self) -> Arc<IdentityGate> {
        Arc::clone(&self.gate)
    }

    /// The CSRF guard, for the token-issuance endpoints.
    pub fn csrf(&self) -> Arc<CsrfGuard> {
        Arc::clone(&self.csrf)
    }

    /// Wire a handler behind the configured guards.
    pub fn guard(&self, config: EndpointConfig, handler: Arc<dyn CallHandler>) -> GuardedEndpoint {
        GuardedEndpoint {
            components: self.clone(),
            config,
            handler,
        }
    }
}

/// One endpoint with its guards applied.
pub struct GuardedEndpoint {
    components: Pipeline,
    config: EndpointConfig,
    handler: Arc<dyn CallHandler>,
}

impl GuardedEndpoint {
    /// Run the guards in order, then the handler.
    pub async fn call(&self, req: CallRequest) -> WardenResult<Value> {
        let mut ctx = CallContext::default();

        if self.config.csrf {
            if let Some(session) = self.components.csrf.verify(&req)? {
                ctx.session = Some(session.session_id);
                ctx.csrf_token = Some(session.token);
            }
        }

        if let Some(limit) = &self.config.rate_limit {
            match rate_subject(&req) {
                Some(subject) => self.components.limiter.consume(&subject, limit).await?,
                // Indeterminate identity: allow rather than block.
                None => warn!(
                    handler = self.handler.name(),
                    "no rate subject resolvable, allowing request"
                ),
            }
        }

        ctx.caller = match self.config.auth {
            AuthLevel::None => req.subject().cloned(),
            AuthLevel::Authenticated => {
                Some(self.components.gate.require_authenticated(&req)?)
            }
            AuthLevel::Verified => Some(self.components.gate.require_verified(&req).await?),
            AuthLevel::Onboarded => Some(self.components.gate.require_onboarded(&req).await?),
        };

        if let Some(resource) = &self.config.resource {
            let (caller, doc) = self.components.access.resolve(&req, resource).await?;
            ctx.caller = Some(caller);
            ctx.resource = Some(doc);
        }

        debug!(handler = self.handler.name(), "guards passed, invoking handler");
        self.handler.handle(ctx, req).await
    }
}

/// Quota subject for this request: the asserted user id when present,
/// otherwise the client address.
fn rate_subject(req: &CallRequest) -> Option<RateSubject> {
    if let Some(subject) = req.subject() {
        return Some(RateSubject::User(subject.clone()));
    }
    req.transport
        .client_address()
        .map(|addr| RateSubject::Ip(addr.to_string()))
}
