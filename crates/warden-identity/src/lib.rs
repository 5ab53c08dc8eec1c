//! Warden Identity
//!
//! Identity-tier gating: resolves the caller's stable id from the
//! request's identity assertion and asserts the required tier
//! (authenticated, verified, onboarded) against the profile directory.

pub mod directory;
pub mod gate;

pub use directory::{Profile, ProfileDirectory, StoreDirectory, PROFILES_COLLECTION};
pub use gate::IdentityGate;
