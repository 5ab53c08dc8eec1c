//! Resource access resolution.
//!
//! Loads the named resource and walks the configured permission levels in
//! fixed precedence, granting on the first satisfied predicate. `Public`
//! short-circuits before anything is evaluated; the invitation list and
//! the custom predicate come after every built-in level.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use warden_core::{CallRequest, UserId, WardenError, WardenResult};
use warden_identity::{IdentityGate, ProfileDirectory};
use warden_store::{Document, DocumentStore};

use crate::config::ResourceAccessConfig;
use crate::level::{PermissionLevel, ResourceType};

/// Field linking a resource document to its family group.
const FAMILY_FIELD: &str = "familyId";

/// Field listing invited member ids on a resource document.
const INVITED_FIELD: &str = "invitedIds";

/// Owner field on a family document.
const FAMILY_OWNER_FIELD: &str = "ownerId";

/// Evaluates resource permissions for guarded endpoints.
pub struct ResourceAccessController {
    store: Arc<dyn DocumentStore>,
    directory: Arc<dyn ProfileDirectory>,
    gate: Arc<IdentityGate>,
}

impl ResourceAccessController {
    /// Create a controller over the given store, directory, and gate.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        directory: Arc<dyn ProfileDirectory>,
        gate: Arc<IdentityGate>,
    ) -> Self {
        Self {
            store,
            directory,
            gate,
        }
    }

    /// Resolve the caller and the resource, or fail.
    ///
    /// Fails `Unauthenticated` without an identity, `MissingParameter`
    /// without the configured id field, `NotFound` when the document
    /// does not exist, and `PermissionDenied` naming the resource type
    /// when no configured level is satisfied.
    pub async fn resolve(
        &self,
        req: &CallRequest,
        config: &ResourceAccessConfig,
    ) -> WardenResult<(UserId, Document)> {
        let caller = self.gate.require_authenticated(req)?;

        let resource_id = req.payload_str(&config.id_field).ok_or_else(|| {
            WardenError::missing_parameter(format!(
                "required field {} is missing",
                config.id_field
            ))
        })?;

        let doc = self
            .store
            .get(config.resource.collection(), resource_id)
            .await?
            .ok_or_else(|| {
                WardenError::not_found(format!("{} not found", config.resource.name()))
            })?;

        if config.levels.contains(&PermissionLevel::Public) {
            return Ok((caller, doc));
        }

        if self
            .evaluate(&caller, resource_id, &doc, config)
            .await?
        {
            debug!(user = %caller, resource = config.resource.name(), "resource access granted");
            return Ok((caller, doc));
        }

        Err(WardenError::permission_denied(format!(
            "insufficient permission for {}",
            config.resource.name()
        )))
    }

    async fn evaluate(
        &self,
        caller: &UserId,
        resource_id: &str,
        doc: &Document,
        config: &ResourceAccessConfig,
    ) -> WardenResult<bool> {
        if config.levels.contains(&PermissionLevel::Authenticated) {
            return Ok(true);
        }

        for level in PermissionLevel::PRECEDENCE {
            if !config.levels.contains(&level) {
                continue;
            }
            if self
                .level_satisfied(level, caller, resource_id, doc, config)
                .await?
            {
                return Ok(true);
            }
        }

        if config.allow_invited && invited(doc, caller) {
            return Ok(true);
        }

        if let Some(predicate) = &config.custom_predicate {
            if predicate.allows(doc, caller).await {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn level_satisfied(
        &self,
        level: PermissionLevel,
        caller: &UserId,
        resource_id: &str,
        doc: &Document,
        config: &ResourceAccessConfig,
    ) -> WardenResult<bool> {
        match level {
            // Handled before the precedence walk.
            PermissionLevel::Public | PermissionLevel::Authenticated => Ok(true),

            PermissionLevel::ProfileOwner => Ok(caller.as_str() == resource_id),

            PermissionLevel::Host | PermissionLevel::Admin => {
                Ok(str_field(doc, config.owner_field()) == Some(caller.as_str()))
            }

            PermissionLevel::FamilyMember => {
                let Some(resource_family) = str_field(doc, FAMILY_FIELD) else {
                    return Ok(false);
                };
                let profile = self.directory.profile(caller).await?;
                Ok(profile
                    .and_then(|p| p.family_id)
                    .is_some_and(|family| family.as_str() == resource_family))
            }

            PermissionLevel::TreeOwner => {
                let Some(family_id) = str_field(doc, FAMILY_FIELD) else {
                    return Ok(false);
                };
                let family = self
                    .store
                    .get(ResourceType::Family.collection(), family_id)
                    .await?;
                Ok(family
                    .as_ref()
                    .and_then(|f| str_field(f, FAMILY_OWNER_FIELD))
                    == Some(caller.as_str()))
            }
        }
    }
}

fn str_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

fn invited(doc: &Document, caller: &UserId) -> bool {
    doc.get(INVITED_FIELD)
        .and_then(Value::as_array)
        .is_some_and(|ids| ids.iter().any(|id| id.as_str() == Some(caller.as_str())))
}
