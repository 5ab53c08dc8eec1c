//! Per-endpoint resource access configuration.

use std::sync::Arc;

use async_trait::async_trait;

use warden_core::UserId;
use warden_store::Document;

use crate::level::{PermissionLevel, ResourceType};

/// Injected predicate evaluated after every built-in level.
#[async_trait]
pub trait AccessPredicate: Send + Sync {
    /// Whether `caller` may access `resource`.
    async fn allows(&self, resource: &Document, caller: &UserId) -> bool;
}

/// Declarative access description attached to an endpoint.
#[derive(Clone)]
pub struct ResourceAccessConfig {
    /// Resource type to load.
    pub resource: ResourceType,
    /// Payload field carrying the resource id.
    pub id_field: String,
    /// Owner field override; defaults by resource type.
    pub owner_field: Option<String>,
    /// Acceptable permission levels.
    pub levels: Vec<PermissionLevel>,
    /// Whether appearing in the resource's invited-members list grants
    /// access.
    pub allow_invited: bool,
    /// Custom predicate, evaluated last.
    pub custom_predicate: Option<Arc<dyn AccessPredicate>>,
}

impl ResourceAccessConfig {
    /// Describe access to `resource`, reading its id from `id_field`.
    pub fn new(
        resource: ResourceType,
        id_field: impl Into<String>,
        levels: Vec<PermissionLevel>,
    ) -> Self {
        Self {
            resource,
            id_field: id_field.into(),
            owner_field: None,
            levels,
            allow_invited: false,
            custom_predicate: None,
        }
    }

    /// Override the owner field.
    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }

    /// Count invitation-list membership as access.
    pub fn with_invited(mut self) -> Self {
        self.allow_invited = true;
        self
    }

    /// Attach a custom predicate.
    pub fn with_predicate(mut self, predicate: Arc<dyn AccessPredicate>) -> Self {
        self.custom_predicate = Some(predicate);
        self
    }

    /// Effective owner field: the override or the type default.
    pub fn owner_field(&self) -> &str {
        self.owner_field
            .as_deref()
            .unwrap_or_else(|| self.resource.default_owner_field())
    }
}

impl std::fmt::Debug for ResourceAccessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceAccessConfig")
            .field("resource", &self.resource)
            .field("id_field", &self.id_field)
            .field("owner_field", &self.owner_field)
            .field("levels", &self.levels)
            .field("allow_invited", &self.allow_invited)
            .field("custom_predicate", &self.custom_predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_field_override() {
        let config = ResourceAccessConfig::new(
            ResourceType::Event,
            "eventId",
            vec![PermissionLevel::Host],
        );
        assert_eq!(config.owner_field(), "hostId");

        let config = config.with_owner_field("organizerId");
        assert_eq!(config.owner_field(), "organizerId");
    }
}
