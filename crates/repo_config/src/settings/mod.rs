//! Partial configuration objects layered by templates and targets.
//!
//! Every leaf field is optional. `None` means "not set in this layer, inherit
//! from the layer below"; `Some` always wins when the layer is applied.
//! See [`crate::merger`] for how layers are combined.

pub mod permissions;
pub mod repository;
pub mod security;

pub use permissions::{PermissionLevel, PermissionSettings};
pub use repository::RepoSettings;
pub use security::{BranchProtectionRule, SecuritySettings, WebhookConfig};
