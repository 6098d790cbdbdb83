//! # Repositories
//!
//! Data access layer for the reconciliation core: the registry item store,
//! the purchase ledger, the group-gift contribution tracker, and the
//! append-only activity recorder.

pub mod activity;
pub mod contribution;
pub mod purchase;
pub mod registry;
pub mod registry_item;

pub use activity::ActivityRepository;
pub use contribution::ContributionRepository;
pub use purchase::PurchaseRepository;
pub use registry::RegistryRepository;
pub use registry_item::RegistryItemRepository;
