//! Warden Access
//!
//! Resource permission evaluation: load the resource an endpoint names
//! and grant on the first satisfied permission level, in fixed
//! precedence, with `Public` short-circuiting and invitation/custom
//! checks evaluated last.

pub mod config;
pub mod controller;
pub mod level;

pub use config::{AccessPredicate, ResourceAccessConfig};
pub use controller::ResourceAccessController;
pub use level::{PermissionLevel, ResourceType};
