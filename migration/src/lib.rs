//! Database migrations for the WishCraft reconciliation service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_000001_create_registries;
mod m2026_01_05_000002_create_registry_items;
mod m2026_01_05_000003_create_registry_purchases;
mod m2026_01_05_000004_create_group_gift_contributions;
mod m2026_01_05_000005_create_registry_activities;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_000001_create_registries::Migration),
            Box::new(m2026_01_05_000002_create_registry_items::Migration),
            Box::new(m2026_01_05_000003_create_registry_purchases::Migration),
            Box::new(m2026_01_05_000004_create_group_gift_contributions::Migration),
            Box::new(m2026_01_05_000005_create_registry_activities::Migration),
        ]
    }
}
