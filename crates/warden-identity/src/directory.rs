//! Profile directory seam.
//!
//! The gate and the other guards read a narrow projection of the user
//! record: verification flags, onboarding state, admin flag, and family
//! membership. The directory trait is the only way they reach it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use warden_core::{FamilyId, UserId, WardenResult};
use warden_store::DocumentStore;

/// Collection holding user profile documents.
pub const PROFILES_COLLECTION: &str = "profiles";

/// Read-only projection of a user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Email address confirmed by the identity provider.
    #[serde(default)]
    pub email_verified: bool,
    /// Phone number confirmed by the identity provider.
    #[serde(default)]
    pub phone_verified: bool,
    /// Profile completion flag set at the end of onboarding.
    #[serde(default)]
    pub onboarding_complete: bool,
    /// Administrative account flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Family the user belongs to, if any.
    #[serde(default)]
    pub family_id: Option<FamilyId>,
}

impl Profile {
    /// Whether either contact channel is verified.
    pub fn is_verified(&self) -> bool {
        self.email_verified || self.phone_verified
    }
}

/// Directory of user profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Load a user's profile; `None` when the user has no profile record.
    async fn profile(&self, user: &UserId) -> WardenResult<Option<Profile>>;
}

/// Store-backed directory reading the `profiles` collection.
pub struct StoreDirectory {
    store: Arc<dyn DocumentStore>,
}

impl StoreDirectory {
    /// Create a directory over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProfileDirectory for StoreDirectory {
    async fn profile(&self, user: &UserId) -> WardenResult<Option<Profile>> {
        let doc = self.store.get(PROFILES_COLLECTION, user.as_str()).await?;
        match doc {
            Some(value) => {
                let profile = serde_json::from_value(value).map_err(|e| {
                    warden_core::WardenError::internal(format!(
                        "malformed profile record: {e}"
                    ))
                })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }
}
