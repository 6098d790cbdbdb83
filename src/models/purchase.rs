//! Purchase entity model
//!
//! This module contains the SeaORM entity model for the registry_purchases
//! table. One row exists per reconciled Shopify order line item; the
//! (order_id, line_item_id) pair is unique so webhook redelivery can never
//! create a second row.

use super::registry_item::Entity as RegistryItem;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registry_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Registry item this purchase was reconciled against (canonical
    /// foreign key; the legacy registry-only shape is gone)
    pub registry_item_id: Uuid,

    /// Shopify order identifier
    pub order_id: String,

    /// Shopify line item identifier; (order_id, line_item_id) is the
    /// deduplication key
    pub line_item_id: String,

    pub quantity: i32,

    pub unit_price: Decimal,

    /// quantity * unit_price, captured at reconciliation time
    pub total_amount: Decimal,

    pub currency_code: String,

    /// Purchaser identity; both None for anonymous purchases
    pub purchaser_name: Option<String>,
    pub purchaser_email: Option<String>,

    /// Sanitized gift message extracted from line-item properties
    pub gift_message: Option<String>,

    pub payment_status: String,

    pub fulfillment_status: String,

    /// Whether this row is the aggregating record of a group gift
    pub is_group_gift: bool,

    pub group_gift_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "RegistryItem",
        from = "Column::RegistryItemId",
        to = "super::registry_item::Column::Id"
    )]
    RegistryItem,

    #[sea_orm(has_many = "super::contribution::Entity")]
    Contributions,
}

impl Related<RegistryItem> for Entity {
    fn to() -> RelationDef {
        Relation::RegistryItem.def()
    }
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Public representation for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: Uuid,
    pub registry_item_id: Uuid,
    pub order_id: String,
    pub line_item_id: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "15.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "30.00")]
    pub total_amount: Decimal,
    pub currency_code: String,
    pub purchaser_name: Option<String>,
    pub gift_message: Option<String>,
    pub is_group_gift: bool,
    #[schema(value_type = String, example = "2026-01-05T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for PurchaseResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            registry_item_id: model.registry_item_id,
            order_id: model.order_id,
            line_item_id: model.line_item_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total_amount: model.total_amount,
            currency_code: model.currency_code,
            purchaser_name: model.purchaser_name,
            gift_message: model.gift_message,
            is_group_gift: model.is_group_gift,
            created_at: model.created_at,
        }
    }
}
