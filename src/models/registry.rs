//! Registry entity model
//!
//! This module contains the SeaORM entity model for the registries table,
//! the top-level collection a customer builds and shares for an event.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Shop the registry belongs to (myshopify domain)
    pub shop_domain: String,

    /// Email of the owning customer, if known
    pub customer_email: Option<String>,

    pub title: String,

    /// URL-safe handle, unique per shop
    pub slug: String,

    pub status: RegistryStatus,

    /// Optional event date (wedding, birthday, ...)
    pub event_date: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum RegistryStatus {
    #[sea_orm(string_value = "active")]
    #[serde(rename = "active")]
    #[default]
    Active,

    #[sea_orm(string_value = "archived")]
    #[serde(rename = "archived")]
    Archived,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registry_item::Entity")]
    RegistryItems,

    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::registry_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegistryItems.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
