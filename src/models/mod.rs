//! # Data Models
//!
//! This module contains all the data models used throughout the WishCraft
//! reconciliation service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod activity;
pub mod contribution;
pub mod purchase;
pub mod registry;
pub mod registry_item;

pub use activity::Entity as Activity;
pub use contribution::Entity as Contribution;
pub use purchase::Entity as Purchase;
pub use registry::Entity as Registry;
pub use registry_item::Entity as RegistryItem;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "wishcraft".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
