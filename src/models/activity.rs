//! ActivityRecord entity model
//!
//! Append-only log of registry events. Rows are immutable once written;
//! there is deliberately no update path in the repository layer.

use super::registry::Entity as Registry;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registry_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub registry_id: Uuid,

    pub actor_name: Option<String>,
    pub actor_email: Option<String>,

    /// True for events emitted by reconciliation rather than a person
    pub is_system: bool,

    pub action: ActivityAction,

    pub description: String,

    /// Opaque event payload for the analytics collaborator
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ActivityAction {
    #[sea_orm(string_value = "registry_created")]
    #[serde(rename = "registry_created")]
    RegistryCreated,

    #[sea_orm(string_value = "item_added")]
    #[serde(rename = "item_added")]
    ItemAdded,

    #[sea_orm(string_value = "item_removed")]
    #[serde(rename = "item_removed")]
    ItemRemoved,

    #[sea_orm(string_value = "item_purchased")]
    #[serde(rename = "item_purchased")]
    ItemPurchased,

    #[sea_orm(string_value = "contribution_received")]
    #[serde(rename = "contribution_received")]
    ContributionReceived,

    #[sea_orm(string_value = "contribution_completed")]
    #[serde(rename = "contribution_completed")]
    ContributionCompleted,

    #[sea_orm(string_value = "contribution_failed")]
    #[serde(rename = "contribution_failed")]
    ContributionFailed,

    #[sea_orm(string_value = "contribution_refunded")]
    #[serde(rename = "contribution_refunded")]
    ContributionRefunded,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Registry",
        from = "Column::RegistryId",
        to = "super::registry::Column::Id"
    )]
    Registry,
}

impl Related<Registry> for Entity {
    fn to() -> RelationDef {
        Relation::Registry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
