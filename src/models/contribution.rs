//! GroupGiftContribution entity model
//!
//! This module contains the SeaORM entity model for the
//! group_gift_contributions table. Rows move through a small payment status
//! machine and are never deleted once refunded, keeping the audit trail.

use super::purchase::Entity as Purchase;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_gift_contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Aggregating group-gift purchase this contribution pools into
    pub purchase_id: Uuid,

    pub contributor_name: Option<String>,
    pub contributor_email: Option<String>,

    /// When set, contributor identity is only visible to the registry owner.
    /// The flag is carried through unmodified; enforcement lives with the
    /// caller's access-control context.
    pub is_anonymous: bool,

    pub amount: Decimal,

    pub currency_code: String,

    pub payment_status: ContributionStatus,

    /// Display preference: whether the amount is shown to other contributors
    pub show_amount: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ContributionStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "completed")]
    #[serde(rename = "completed")]
    Completed,

    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,

    #[sea_orm(string_value = "refunded")]
    #[serde(rename = "refunded")]
    Refunded,
}

impl ContributionStatus {
    /// Legal transitions: pending -> completed | failed, completed -> refunded.
    pub fn can_transition_to(self, next: ContributionStatus) -> bool {
        matches!(
            (self, next),
            (ContributionStatus::Pending, ContributionStatus::Completed)
                | (ContributionStatus::Pending, ContributionStatus::Failed)
                | (ContributionStatus::Completed, ContributionStatus::Refunded)
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Purchase",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id"
    )]
    Purchase,
}

impl Related<Purchase> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Public representation for API responses. Contributor identity is redacted
/// for anonymous rows; the owner-facing read path rehydrates it separately.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContributionResponse {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub contributor_name: Option<String>,
    pub is_anonymous: bool,
    #[schema(value_type = String, example = "50.00")]
    pub amount: Option<Decimal>,
    pub currency_code: String,
    pub payment_status: ContributionStatus,
    #[schema(value_type = String, example = "2026-01-05T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for ContributionResponse {
    fn from(model: Model) -> Self {
        let contributor_name = if model.is_anonymous {
            None
        } else {
            model.contributor_name
        };
        let amount = if model.show_amount {
            Some(model.amount)
        } else {
            None
        };
        Self {
            id: model.id,
            purchase_id: model.purchase_id,
            contributor_name,
            is_anonymous: model.is_anonymous,
            amount,
            currency_code: model.currency_code,
            payment_status: model.payment_status,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ContributionStatus::*;

    #[test]
    fn transition_table_matches_contract() {
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Pending));
    }
}
