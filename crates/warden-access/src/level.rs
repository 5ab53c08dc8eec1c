//! Permission levels and resource types.

use serde::{Deserialize, Serialize};

/// Closed set of relationships between a caller and a resource.
///
/// An endpoint configures one or more acceptable levels; access is
/// granted when any configured level's predicate is satisfied, evaluated
/// in the fixed precedence of [`PermissionLevel::PRECEDENCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Anyone may access; short-circuits every other check.
    Public,
    /// Any authenticated caller.
    Authenticated,
    /// Caller id equals the resource id itself (the resource is the
    /// caller's own profile).
    ProfileOwner,
    /// Caller id equals the resource's owner field.
    Host,
    /// Alias of [`PermissionLevel::Host`] for resources whose owner is
    /// called an admin.
    Admin,
    /// Caller's family membership equals the resource's family.
    FamilyMember,
    /// Caller owns the family that owns the resource.
    TreeOwner,
}

impl PermissionLevel {
    /// Evaluation order: most specific first; first satisfied wins.
    /// `Public` and `Authenticated` short-circuit before this list.
    pub const PRECEDENCE: [PermissionLevel; 5] = [
        PermissionLevel::ProfileOwner,
        PermissionLevel::Host,
        PermissionLevel::Admin,
        PermissionLevel::FamilyMember,
        PermissionLevel::TreeOwner,
    ];
}

/// Resource families the access controller knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Hosted gatherings; owner field names the host.
    Event,
    /// Authored narratives; owner field names the author.
    Story,
    /// User profiles; typically guarded by `ProfileOwner`.
    Profile,
    /// Family groups; owner field names the tree owner.
    Family,
    /// Any other collection with a generic owner field.
    Custom {
        /// Collection the documents live in.
        collection: &'static str,
        /// Field naming the document's owner.
        owner_field: &'static str,
    },
}

impl ResourceType {
    /// Collection holding documents of this type.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Event => "events",
            Self::Story => "stories",
            Self::Profile => "profiles",
            Self::Family => "families",
            Self::Custom { collection, .. } => collection,
        }
    }

    /// Owner field used by the `Host`/`Admin` predicate unless the
    /// config overrides it.
    pub fn default_owner_field(&self) -> &'static str {
        match self {
            Self::Event => "hostId",
            Self::Story => "authorId",
            Self::Profile | Self::Family => "ownerId",
            Self::Custom { owner_field, .. } => owner_field,
        }
    }

    /// Human-readable type name used in denial messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Story => "story",
            Self::Profile => "profile",
            Self::Family => "family",
            Self::Custom { collection, .. } => collection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_field_defaults_by_type() {
        assert_eq!(ResourceType::Event.default_owner_field(), "hostId");
        assert_eq!(ResourceType::Story.default_owner_field(), "authorId");
        assert_eq!(ResourceType::Profile.default_owner_field(), "ownerId");
        let custom = ResourceType::Custom {
            collection: "recipes",
            owner_field: "chefId",
        };
        assert_eq!(custom.default_owner_field(), "chefId");
        assert_eq!(custom.collection(), "recipes");
        assert_eq!(custom.name(), "recipes");
    }
}
