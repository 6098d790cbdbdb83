//! # Group-Gift Contribution Tracker
//!
//! Repository for GroupGiftContribution entities: pooled partial payments
//! toward an aggregating group-gift purchase. Completion state is derived on
//! demand from completed rows; nothing is cached, so it can never drift from
//! the ledger.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::contribution::{
    ActiveModel as ContributionActiveModel, Column, ContributionStatus, Entity as Contribution,
    Model,
};
use crate::models::purchase::Entity as Purchase;

/// Optional contributor identity. `is_anonymous` is carried through to read
/// paths unmodified; the tracker itself never strips the stored identity.
#[derive(Debug, Clone, Default)]
pub struct ContributorInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_anonymous: bool,
    pub show_amount: bool,
}

/// Derived funding state of a group gift
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompletionState {
    /// Sum of completed contribution amounts
    #[schema(value_type = String, example = "150.00")]
    pub total_collected: Decimal,
    /// The aggregating purchase's total amount
    #[schema(value_type = String, example = "200.00")]
    pub target_amount: Decimal,
    /// total_collected / target_amount, in percent. Exceeds 100 when the
    /// gift is overfunded; overfunding is an allowed state.
    pub percent_complete: f64,
}

/// Repository for GroupGiftContribution database operations
pub struct ContributionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ContributionRepository<'a> {
    /// Create a new ContributionRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a contribution by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Contribution::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List contributions for a purchase, oldest first
    pub async fn list_for_purchase(&self, purchase_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Contribution::find()
            .filter(Column::PurchaseId.eq(purchase_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record a new contribution toward a group gift, initialized pending.
    ///
    /// The contribution only counts toward completion once the payment
    /// collaborator confirms it via `mark_status`. Contributions must be in
    /// the aggregating purchase's currency; sums across currencies are
    /// meaningless.
    pub async fn add_contribution(
        &self,
        purchase_id: Uuid,
        contributor: ContributorInfo,
        amount: Decimal,
        currency_code: String,
    ) -> Result<Model, RepositoryError> {
        let purchase = Purchase::find_by_id(purchase_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("purchase".to_string()))?;

        if purchase.currency_code != currency_code {
            return Err(RepositoryError::CurrencyMismatch {
                given: currency_code,
                expected: purchase.currency_code,
            });
        }

        let now = Utc::now();
        let active = ContributionActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_id: Set(purchase_id),
            contributor_name: Set(contributor.name),
            contributor_email: Set(contributor.email),
            is_anonymous: Set(contributor.is_anonymous),
            amount: Set(amount),
            currency_code: Set(currency_code),
            payment_status: Set(ContributionStatus::Pending),
            show_amount: Set(contributor.show_amount),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Apply a payment status transition.
    ///
    /// Legal transitions are pending -> completed | failed and completed ->
    /// refunded; anything else fails with `InvalidTransition` and leaves the
    /// row untouched. Refunded rows are kept for the audit trail and drop out
    /// of completion sums by status alone.
    pub async fn mark_status(
        &self,
        id: Uuid,
        new_status: ContributionStatus,
    ) -> Result<Model, RepositoryError> {
        let contribution = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("contribution".to_string()))?;

        let current = contribution.payment_status;
        if !current.can_transition_to(new_status) {
            return Err(RepositoryError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        let mut active: ContributionActiveModel = contribution.into();
        active.payment_status = Set(new_status);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Derive the funding state of a group gift: sum of completed
    /// contributions against the aggregating purchase's total amount.
    pub async fn completion_state(
        &self,
        purchase_id: Uuid,
    ) -> Result<CompletionState, RepositoryError> {
        let purchase = Purchase::find_by_id(purchase_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("purchase".to_string()))?;

        let completed = Contribution::find()
            .filter(Column::PurchaseId.eq(purchase_id))
            .filter(Column::PaymentStatus.eq(ContributionStatus::Completed))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let total_collected: Decimal = completed.iter().map(|c| c.amount).sum();
        let target_amount = purchase.total_amount;

        let percent_complete = if target_amount.is_zero() {
            0.0
        } else {
            let ratio = total_collected / target_amount;
            ratio.to_f64().unwrap_or(0.0) * 100.0
        };

        Ok(CompletionState {
            total_collected,
            target_amount,
            percent_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_group_gift_purchase, setup_test_db};

    #[tokio::test]
    async fn test_add_contribution_starts_pending() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        let contribution = repo
            .add_contribution(
                purchase.id,
                ContributorInfo {
                    name: Some("Grace".to_string()),
                    email: Some("grace@example.com".to_string()),
                    is_anonymous: false,
                    show_amount: true,
                },
                Decimal::new(5000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(contribution.payment_status, ContributionStatus::Pending);

        // Pending contributions do not count toward completion
        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.total_collected, Decimal::ZERO);
        assert_eq!(state.percent_complete, 0.0);
    }

    #[tokio::test]
    async fn test_completion_follows_example_scenario() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        // Contribution A: $50 pending -> 0%
        let a = repo
            .add_contribution(
                purchase.id,
                ContributorInfo::default(),
                Decimal::new(5000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();
        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.percent_complete, 0.0);

        // Mark A completed -> 25%
        repo.mark_status(a.id, ContributionStatus::Completed)
            .await
            .unwrap();
        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.total_collected, Decimal::new(5000, 2));
        assert_eq!(state.percent_complete, 25.0);

        // Contribution B: $150 completed -> 100%
        let b = repo
            .add_contribution(
                purchase.id,
                ContributorInfo::default(),
                Decimal::new(15000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();
        repo.mark_status(b.id, ContributionStatus::Completed)
            .await
            .unwrap();
        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.percent_complete, 100.0);

        // Refund A -> 75%
        repo.mark_status(a.id, ContributionStatus::Refunded)
            .await
            .unwrap();
        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.total_collected, Decimal::new(15000, 2));
        assert_eq!(state.percent_complete, 75.0);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected_and_state_unchanged() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        let contribution = repo
            .add_contribution(
                purchase.id,
                ContributorInfo::default(),
                Decimal::new(5000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();

        // pending -> refunded is not legal
        let result = repo
            .mark_status(contribution.id, ContributionStatus::Refunded)
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidTransition { .. })
        ));

        let unchanged = repo.get_by_id(contribution.id).await.unwrap().unwrap();
        assert_eq!(unchanged.payment_status, ContributionStatus::Pending);

        // failed is terminal
        repo.mark_status(contribution.id, ContributionStatus::Failed)
            .await
            .unwrap();
        let result = repo
            .mark_status(contribution.id, ContributionStatus::Completed)
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_refund_keeps_row_for_audit() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        let contribution = repo
            .add_contribution(
                purchase.id,
                ContributorInfo::default(),
                Decimal::new(5000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();
        repo.mark_status(contribution.id, ContributionStatus::Completed)
            .await
            .unwrap();
        repo.mark_status(contribution.id, ContributionStatus::Refunded)
            .await
            .unwrap();

        let rows = repo.list_for_purchase(purchase.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payment_status, ContributionStatus::Refunded);
    }

    #[tokio::test]
    async fn test_overfunding_is_allowed() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(10000, 2)).await;
        let repo = ContributionRepository::new(&db);

        for _ in 0..3 {
            let c = repo
                .add_contribution(
                    purchase.id,
                    ContributorInfo::default(),
                    Decimal::new(7500, 2),
                    "USD".to_string(),
                )
                .await
                .unwrap();
            repo.mark_status(c.id, ContributionStatus::Completed)
                .await
                .unwrap();
        }

        let state = repo.completion_state(purchase.id).await.unwrap();
        assert_eq!(state.total_collected, Decimal::new(22500, 2));
        assert_eq!(state.percent_complete, 225.0);
    }

    #[tokio::test]
    async fn test_currency_mismatch_rejected() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        let result = repo
            .add_contribution(
                purchase.id,
                ContributorInfo::default(),
                Decimal::new(5000, 2),
                "EUR".to_string(),
            )
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::CurrencyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_anonymous_flag_carried_through() {
        let db = setup_test_db().await;
        let purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let repo = ContributionRepository::new(&db);

        let contribution = repo
            .add_contribution(
                purchase.id,
                ContributorInfo {
                    name: Some("Secret Admirer".to_string()),
                    email: Some("secret@example.com".to_string()),
                    is_anonymous: true,
                    show_amount: false,
                },
                Decimal::new(5000, 2),
                "USD".to_string(),
            )
            .await
            .unwrap();

        // Stored identity is intact; redaction happens in the response type
        assert!(contribution.is_anonymous);
        assert_eq!(
            contribution.contributor_name,
            Some("Secret Admirer".to_string())
        );

        let response = crate::models::contribution::ContributionResponse::from(contribution);
        assert_eq!(response.contributor_name, None);
        assert_eq!(response.amount, None);
    }
}
