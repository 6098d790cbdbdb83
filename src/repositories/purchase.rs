//! # Purchase Ledger
//!
//! Repository for Purchase entities. `record_purchase` is the single write
//! path for reconciled order line items and carries the core correctness
//! property of the service: at most one Purchase row and one quantity
//! increment per (order_id, line_item_id), no matter how many times Shopify
//! redelivers the webhook or how many deliveries race.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::purchase::{ActiveModel as PurchaseActiveModel, Column, Entity as Purchase, Model};
use crate::repositories::RegistryItemRepository;

/// Optional purchaser identity attached to a purchase. Both fields absent
/// means an anonymous purchase.
#[derive(Debug, Clone, Default)]
pub struct PurchaserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Parameters for recording one order line item against a registry item
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub order_id: String,
    pub line_item_id: String,
    pub registry_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub currency_code: String,
    pub purchaser: PurchaserInfo,
    pub gift_message: Option<String>,
    pub payment_status: String,
    pub is_group_gift: bool,
    pub group_gift_id: Option<Uuid>,
}

/// Outcome of `record_purchase`: the row, and whether this call created it.
/// Duplicate deliveries return the existing row with `newly_recorded` false.
#[derive(Debug, Clone)]
pub struct RecordedPurchase {
    pub purchase: Model,
    pub newly_recorded: bool,
}

/// Repository for Purchase database operations
pub struct PurchaseRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new PurchaseRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a purchase by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Purchase::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fetch a purchase by its deduplication key
    pub async fn find_by_order_line_item(
        &self,
        order_id: &str,
        line_item_id: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        Purchase::find()
            .filter(Column::OrderId.eq(order_id))
            .filter(Column::LineItemId.eq(line_item_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List purchases for a registry item, newest first
    pub async fn list_for_item(&self, registry_item_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Purchase::find()
            .filter(Column::RegistryItemId.eq(registry_item_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Idempotently record an order line item against a registry item.
    ///
    /// Within one transaction: insert the Purchase row under the unique
    /// (order_id, line_item_id) constraint, then apply the atomic
    /// quantity_purchased increment. A pre-check catches the common
    /// redelivery case cheaply; two deliveries racing past the pre-check are
    /// serialized by the constraint, and the loser's unique-violation abort
    /// is translated into the same "already processed" result instead of an
    /// error. The increment never runs for an existing row, so effects apply
    /// exactly once.
    ///
    /// Fails with `NotFound` if the registry item does not exist; the caller
    /// decides whether that skips the line item or aborts.
    pub async fn record_purchase(
        &self,
        new: NewPurchase,
    ) -> Result<RecordedPurchase, RepositoryError> {
        if let Some(existing) = self
            .find_by_order_line_item(&new.order_id, &new.line_item_id)
            .await?
        {
            return Ok(RecordedPurchase {
                purchase: existing,
                newly_recorded: false,
            });
        }

        let now = Utc::now();
        let total_amount = new.unit_price * Decimal::from(new.quantity);
        let active = PurchaseActiveModel {
            id: Set(Uuid::new_v4()),
            registry_item_id: Set(new.registry_item_id),
            order_id: Set(new.order_id.clone()),
            line_item_id: Set(new.line_item_id.clone()),
            quantity: Set(new.quantity),
            unit_price: Set(new.unit_price),
            total_amount: Set(total_amount),
            currency_code: Set(new.currency_code),
            purchaser_name: Set(new.purchaser.name),
            purchaser_email: Set(new.purchaser.email),
            gift_message: Set(new.gift_message),
            payment_status: Set(new.payment_status),
            fulfillment_status: Set("unfulfilled".to_string()),
            is_group_gift: Set(new.is_group_gift),
            group_gift_id: Set(new.group_gift_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        // Resolve the target item first so a dangling reference (item deleted
        // after the order was placed) surfaces as NotFound for the caller's
        // skip path rather than a foreign-key abort.
        let item = crate::models::registry_item::Entity::find_by_id(new.registry_item_id)
            .one(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        if item.is_none() {
            txn.rollback()
                .await
                .map_err(RepositoryError::database_error)?;
            return Err(RepositoryError::NotFound("registry item".to_string()));
        }

        let inserted = match active.insert(&txn).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                // Lost the race to a concurrent delivery of the same line
                // item. Roll back and return the winner's row.
                txn.rollback()
                    .await
                    .map_err(RepositoryError::database_error)?;

                let existing = self
                    .find_by_order_line_item(&new.order_id, &new.line_item_id)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound("purchase".to_string()))?;

                return Ok(RecordedPurchase {
                    purchase: existing,
                    newly_recorded: false,
                });
            }
            Err(err) => return Err(RepositoryError::Database(err)),
        };

        RegistryItemRepository::increment_purchased(&txn, new.registry_item_id, new.quantity)
            .await?;

        txn.commit()
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(RecordedPurchase {
            purchase: inserted,
            newly_recorded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry_item;
    use crate::repositories::registry_item::NewRegistryItem;
    use crate::test_support::setup_test_db;
    use sea_orm::EntityTrait;

    async fn seed_item(db: &DatabaseConnection, target: i32) -> registry_item::Model {
        let registry = crate::test_support::seed_registry(db).await;
        RegistryItemRepository::new(db)
            .add_item(NewRegistryItem {
                registry_id: registry.id,
                product_id: "prod_1".to_string(),
                variant_id: None,
                title: "Espresso Machine".to_string(),
                quantity: target,
                unit_price: Decimal::new(1500, 2),
                currency_code: "USD".to_string(),
            })
            .await
            .unwrap()
    }

    fn new_purchase(item_id: Uuid, order_id: &str, line_item_id: &str, qty: i32) -> NewPurchase {
        NewPurchase {
            order_id: order_id.to_string(),
            line_item_id: line_item_id.to_string(),
            registry_item_id: item_id,
            quantity: qty,
            unit_price: Decimal::new(1500, 2),
            currency_code: "USD".to_string(),
            purchaser: PurchaserInfo {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
            },
            gift_message: None,
            payment_status: "paid".to_string(),
            is_group_gift: false,
            group_gift_id: None,
        }
    }

    #[tokio::test]
    async fn test_record_purchase_creates_row_and_increments() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let repo = PurchaseRepository::new(&db);

        let recorded = repo
            .record_purchase(new_purchase(item.id, "ord_1", "li_1", 2))
            .await
            .unwrap();

        assert!(recorded.newly_recorded);
        assert_eq!(recorded.purchase.total_amount, Decimal::new(3000, 2));

        let item = registry_item::Entity::find_by_id(item.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity_purchased, 2);
    }

    #[tokio::test]
    async fn test_record_purchase_is_idempotent() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let repo = PurchaseRepository::new(&db);

        let first = repo
            .record_purchase(new_purchase(item.id, "ord_1", "li_1", 2))
            .await
            .unwrap();
        assert!(first.newly_recorded);

        // Redeliver the identical payload several times
        for _ in 0..3 {
            let again = repo
                .record_purchase(new_purchase(item.id, "ord_1", "li_1", 2))
                .await
                .unwrap();
            assert!(!again.newly_recorded);
            assert_eq!(again.purchase.id, first.purchase.id);
        }

        let purchases = repo.list_for_item(item.id).await.unwrap();
        assert_eq!(purchases.len(), 1);

        let item = registry_item::Entity::find_by_id(item.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity_purchased, 2);
    }

    #[tokio::test]
    async fn test_record_purchase_distinct_line_items_accumulate() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 10).await;
        let repo = PurchaseRepository::new(&db);

        repo.record_purchase(new_purchase(item.id, "ord_1", "li_1", 2))
            .await
            .unwrap();
        repo.record_purchase(new_purchase(item.id, "ord_2", "li_7", 3))
            .await
            .unwrap();
        repo.record_purchase(new_purchase(item.id, "ord_3", "li_9", 4))
            .await
            .unwrap();

        let item = registry_item::Entity::find_by_id(item.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity_purchased, 9);
    }

    #[tokio::test]
    async fn test_record_purchase_same_line_item_id_different_order() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let repo = PurchaseRepository::new(&db);

        // line item ids are only unique within an order
        let a = repo
            .record_purchase(new_purchase(item.id, "ord_1", "li_1", 1))
            .await
            .unwrap();
        let b = repo
            .record_purchase(new_purchase(item.id, "ord_2", "li_1", 1))
            .await
            .unwrap();

        assert!(a.newly_recorded);
        assert!(b.newly_recorded);
        assert_ne!(a.purchase.id, b.purchase.id);
    }

    #[tokio::test]
    async fn test_record_purchase_missing_item_fails_without_row() {
        let db = setup_test_db().await;
        let _ = seed_item(&db, 5).await;
        let repo = PurchaseRepository::new(&db);

        let result = repo
            .record_purchase(new_purchase(Uuid::new_v4(), "ord_1", "li_1", 1))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));

        // the failed transaction must not leave a purchase row behind
        assert!(
            repo.find_by_order_line_item("ord_1", "li_1")
                .await
                .unwrap()
                .is_none()
        );
    }
}
