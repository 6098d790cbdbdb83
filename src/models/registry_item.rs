//! RegistryItem entity model
//!
//! This module contains the SeaORM entity model for the registry_items table.
//! An item tracks a target quantity and the cumulative quantity purchased
//! against it; the latter is only mutated through the purchase ledger.

use super::registry::Entity as Registry;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registry_items")]
pub struct Model {
    /// Unique identifier for the item (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Registry this item belongs to
    pub registry_id: Uuid,

    /// Shopify product identifier
    pub product_id: String,

    /// Shopify variant identifier, if a specific variant was chosen
    pub variant_id: Option<String>,

    /// Product title snapshot at add time
    pub title: String,

    /// Target quantity the customer wishes to receive (>= 1)
    pub quantity: i32,

    /// Cumulative quantity reconciled from order webhooks. Not clamped to
    /// the target; over-purchase is a legal state surfaced by the storefront.
    pub quantity_purchased: i32,

    /// Unit price snapshot at add time
    pub unit_price: Decimal,

    /// ISO 4217 currency code
    pub currency_code: String,

    /// active, or inactive once removed. Inactive items keep reconciling
    /// purchases that were placed while they were live.
    pub status: RegistryItemStatus,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum RegistryItemStatus {
    #[sea_orm(string_value = "active")]
    #[serde(rename = "active")]
    #[default]
    Active,

    #[sea_orm(string_value = "inactive")]
    #[serde(rename = "inactive")]
    Inactive,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Registry",
        from = "Column::RegistryId",
        to = "super::registry::Column::Id"
    )]
    Registry,

    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<Registry> for Entity {
    fn to() -> RelationDef {
        Relation::Registry.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
