//! Authentication tier enforcement.
//!
//! The tiers compose strictly: onboarded implies verified implies
//! authenticated. Verification and onboarding consult the profile
//! directory and are fail-closed; a directory outage surfaces as an
//! internal error, never as a silent pass.

use std::sync::Arc;

use tracing::debug;

use warden_core::policy::must_succeed;
use warden_core::{CallRequest, UserId, WardenError, WardenResult};

use crate::directory::ProfileDirectory;

/// Gate asserting the caller's authentication tier.
pub struct IdentityGate {
    directory: Arc<dyn ProfileDirectory>,
}

impl IdentityGate {
    /// Create a gate over the given directory.
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { directory }
    }

    /// Require an identity assertion; returns the caller's stable id.
    pub fn require_authenticated(&self, req: &CallRequest) -> WardenResult<UserId> {
        match req.subject() {
            Some(subject) => Ok(subject.clone()),
            None => Err(WardenError::unauthenticated(
                "authentication required for this call",
            )),
        }
    }

    /// Require authentication plus a verified email or phone.
    ///
    /// Provider-asserted flags on the request satisfy verification
    /// directly; otherwise the profile record is consulted.
    pub async fn require_verified(&self, req: &CallRequest) -> WardenResult<UserId> {
        let caller = self.require_authenticated(req)?;

        if let Some(assertion) = &req.identity {
            if assertion.email_verified || assertion.phone_verified {
                return Ok(caller);
            }
        }

        let profile = must_succeed(
            "verification status lookup",
            self.directory.profile(&caller).await,
        )?
        .ok_or_else(|| WardenError::not_found("user profile not found"))?;

        if profile.is_verified() {
            Ok(caller)
        } else {
            debug!(user = %caller, "verification requirement not met");
            Err(WardenError::permission_denied(
                "email or phone verification required",
            ))
        }
    }

    /// Require verification plus a completed onboarding flow.
    pub async fn require_onboarded(&self, req: &CallRequest) -> WardenResult<UserId> {
        let caller = self.require_verified(req).await?;

        let profile = must_succeed(
            "onboarding status lookup",
            self.directory.profile(&caller).await,
        )?
        .ok_or_else(|| WardenError::not_found("user profile not found"))?;

        if profile.onboarding_complete {
            Ok(caller)
        } else {
            debug!(user = %caller, "onboarding requirement not met");
            Err(WardenError::permission_denied("onboarding not complete"))
        }
    }
}
