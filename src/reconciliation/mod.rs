//! # Webhook Reconciliation
//!
//! Orchestrates an order-created webhook end to end: extract registry-tagged
//! line items, record each through the purchase ledger, pool group-gift
//! contributions, and append audit activities. A single bad line item only
//! skips itself; database errors propagate so the webhook layer reports
//! failure and Shopify redelivers.

pub mod payload;
pub mod sanitize;

use std::str::FromStr;

use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::activity::ActivityAction;
use crate::models::contribution::ContributionStatus;
use crate::repositories::activity::Actor;
use crate::repositories::contribution::ContributorInfo;
use crate::repositories::purchase::{NewPurchase, PurchaserInfo};
use crate::repositories::{
    ActivityRepository, ContributionRepository, PurchaseRepository, RegistryItemRepository,
};
use payload::{OrderLineItem, OrderWebhook};

/// Result of processing one webhook delivery. Skips are counted, never
/// surfaced as failure: once the payload is structurally valid the webhook
/// must succeed so Shopify does not redeliver uselessly.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconciliationSummary {
    /// Shopify order id the summary describes
    pub order_id: String,
    /// Line items newly recorded as purchases
    pub recorded: u32,
    /// Line items already recorded by an earlier delivery
    pub duplicates: u32,
    /// Tagged line items that could not be applied
    pub skipped: u32,
}

enum LineOutcome {
    Recorded,
    Duplicate,
    Skipped(&'static str),
}

/// Drives reconciliation of order webhooks against the registry tables
pub struct Orchestrator<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> Orchestrator<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Process one order-created payload.
    ///
    /// Every registry-tagged line item is attempted regardless of what
    /// happens to its siblings. Only database errors escape; they abort the
    /// remainder of the webhook so the delivery is retried as a whole, which
    /// is safe because every line-item effect is idempotent.
    pub async fn process_order(
        &self,
        order: &OrderWebhook,
    ) -> Result<ReconciliationSummary, RepositoryError> {
        let order_id = order.id.to_string();
        let mut summary = ReconciliationSummary {
            order_id: order_id.clone(),
            recorded: 0,
            duplicates: 0,
            skipped: 0,
        };

        for line in &order.line_items {
            if !line.is_registry_tagged() {
                continue;
            }

            match self.process_line_item(order, &order_id, line).await? {
                LineOutcome::Recorded => summary.recorded += 1,
                LineOutcome::Duplicate => summary.duplicates += 1,
                LineOutcome::Skipped(reason) => {
                    counter!("wishcraft_webhook_line_items_skipped_total").increment(1);
                    warn!(
                        order_id = %order_id,
                        line_item_id = line.id,
                        reason,
                        "skipping line item"
                    );
                    summary.skipped += 1;
                }
            }
        }

        info!(
            order_id = %summary.order_id,
            recorded = summary.recorded,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            "order reconciled"
        );

        Ok(summary)
    }

    async fn process_line_item(
        &self,
        order: &OrderWebhook,
        order_id: &str,
        line: &OrderLineItem,
    ) -> Result<LineOutcome, RepositoryError> {
        let Some(registry_item_id) = line.registry_item_id() else {
            return Ok(LineOutcome::Skipped("registry tag is not a valid UUID"));
        };

        let Ok(unit_price) = Decimal::from_str(&line.price) else {
            return Ok(LineOutcome::Skipped("unparseable line item price"));
        };

        let item_repo = RegistryItemRepository::new(self.db);
        let Some(item) = item_repo.get_item(registry_item_id).await? else {
            // Item deleted after the order was placed; the rest of the order
            // still reconciles.
            return Ok(LineOutcome::Skipped("registry item no longer exists"));
        };

        let group_gift_id = line.group_gift_id();
        let gift_message = sanitize::extract_gift_message(&line.properties);
        let payment_status = order
            .financial_status
            .clone()
            .unwrap_or_else(|| "paid".to_string());

        let ledger = PurchaseRepository::new(self.db);
        let recorded = match ledger
            .record_purchase(NewPurchase {
                order_id: order_id.to_string(),
                line_item_id: line.id.to_string(),
                registry_item_id,
                quantity: line.quantity,
                unit_price,
                currency_code: order.currency.clone(),
                purchaser: PurchaserInfo {
                    name: order.purchaser_name(),
                    email: order.purchaser_email(),
                },
                gift_message,
                payment_status: payment_status.clone(),
                is_group_gift: group_gift_id.is_some(),
                group_gift_id,
            })
            .await
        {
            Ok(recorded) => recorded,
            // The item vanished between resolution and insert
            Err(RepositoryError::NotFound(_)) => {
                return Ok(LineOutcome::Skipped("registry item no longer exists"));
            }
            Err(err) => return Err(err),
        };

        if !recorded.newly_recorded {
            counter!("wishcraft_webhook_duplicates_total").increment(1);
            debug!(
                order_id = %order_id,
                line_item_id = line.id,
                "duplicate delivery, already recorded"
            );
            return Ok(LineOutcome::Duplicate);
        }

        counter!("wishcraft_purchases_recorded_total").increment(1);

        let activities = ActivityRepository::new(self.db);
        activities
            .record_best_effort(
                item.registry_id,
                ActivityAction::ItemPurchased,
                format!("{} x{} purchased", item.title, line.quantity),
                Some(json!({
                    "order_id": order_id,
                    "line_item_id": line.id.to_string(),
                    "quantity": line.quantity,
                    "total_amount": recorded.purchase.total_amount.to_string(),
                })),
                Actor::Person {
                    name: order.purchaser_name(),
                    email: order.purchaser_email(),
                },
            )
            .await;

        if let Some(group_gift_id) = group_gift_id {
            self.apply_group_gift_contribution(
                order,
                order_id,
                group_gift_id,
                recorded.purchase.total_amount,
                &payment_status,
            )
            .await?;
        }

        Ok(LineOutcome::Recorded)
    }

    /// Pool a recorded line item's total into the aggregating group-gift
    /// purchase. Contribution problems (gone purchase, currency mismatch) do
    /// not undo the already recorded purchase; they are logged and the line
    /// still counts as recorded.
    async fn apply_group_gift_contribution(
        &self,
        order: &OrderWebhook,
        order_id: &str,
        group_gift_id: Uuid,
        amount: Decimal,
        payment_status: &str,
    ) -> Result<(), RepositoryError> {
        let contributions = ContributionRepository::new(self.db);

        let contribution = match contributions
            .add_contribution(
                group_gift_id,
                ContributorInfo {
                    name: order.purchaser_name(),
                    email: order.purchaser_email(),
                    is_anonymous: false,
                    show_amount: true,
                },
                amount,
                order.currency.clone(),
            )
            .await
        {
            Ok(contribution) => contribution,
            Err(RepositoryError::NotFound(_)) => {
                warn!(
                    order_id = %order_id,
                    group_gift_id = %group_gift_id,
                    "group gift purchase not found, contribution dropped"
                );
                return Ok(());
            }
            Err(RepositoryError::CurrencyMismatch { given, expected }) => {
                warn!(
                    order_id = %order_id,
                    group_gift_id = %group_gift_id,
                    given, expected,
                    "group gift currency mismatch, contribution dropped"
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        // Checkout-originated contributions are confirmed by the order's own
        // financial status; unpaid orders stay pending for the payment
        // collaborator's callback.
        let completed = if payment_status == "paid" {
            contributions
                .mark_status(contribution.id, ContributionStatus::Completed)
                .await?;
            true
        } else {
            false
        };

        counter!("wishcraft_contributions_recorded_total").increment(1);

        // Activity lands on the registry owning the aggregating purchase
        let purchases = PurchaseRepository::new(self.db);
        let registry_id = match purchases.get_by_id(group_gift_id).await? {
            Some(purchase) => {
                RegistryItemRepository::new(self.db)
                    .get_item(purchase.registry_item_id)
                    .await?
                    .map(|item| item.registry_id)
            }
            None => None,
        };

        if let Some(registry_id) = registry_id {
            ActivityRepository::new(self.db)
                .record_best_effort(
                    registry_id,
                    ActivityAction::ContributionReceived,
                    format!("{} {} contributed to a group gift", amount, order.currency),
                    Some(json!({
                        "order_id": order_id,
                        "purchase_id": group_gift_id,
                        "amount": amount.to_string(),
                        "completed": completed,
                    })),
                    Actor::Person {
                        name: order.purchaser_name(),
                        email: order.purchaser_email(),
                    },
                )
                .await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::payload::{LineItemProperty, REGISTRY_ITEM_PROPERTY};
    use super::*;
    use crate::models::{activity, registry_item};
    use crate::repositories::registry_item::NewRegistryItem;
    use crate::test_support::{seed_group_gift_purchase, seed_registry, setup_test_db};
    use sea_orm::EntityTrait;

    async fn seed_item(db: &DatabaseConnection, target: i32) -> registry_item::Model {
        let registry = seed_registry(db).await;
        RegistryItemRepository::new(db)
            .add_item(NewRegistryItem {
                registry_id: registry.id,
                product_id: "prod_1".to_string(),
                variant_id: None,
                title: "Dutch Oven".to_string(),
                quantity: target,
                unit_price: Decimal::new(1500, 2),
                currency_code: "USD".to_string(),
            })
            .await
            .unwrap()
    }

    fn tagged_line(id: i64, qty: i32, price: &str, item_id: Uuid) -> OrderLineItem {
        OrderLineItem {
            id,
            quantity: qty,
            price: price.to_string(),
            properties: vec![LineItemProperty {
                name: REGISTRY_ITEM_PROPERTY.to_string(),
                value: item_id.to_string(),
            }],
        }
    }

    fn order(id: i64, line_items: Vec<OrderLineItem>) -> OrderWebhook {
        OrderWebhook {
            id,
            email: Some("buyer@example.com".to_string()),
            currency: "USD".to_string(),
            financial_status: Some("paid".to_string()),
            customer: None,
            line_items,
        }
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let webhook = order(1001, vec![tagged_line(1, 2, "15.00", item.id)]);

        let first = orchestrator.process_order(&webhook).await.unwrap();
        assert_eq!(first.recorded, 1);
        assert_eq!(first.duplicates, 0);

        for _ in 0..3 {
            let again = orchestrator.process_order(&webhook).await.unwrap();
            assert_eq!(again.recorded, 0);
            assert_eq!(again.duplicates, 1);
        }

        let item = registry_item::Entity::find_by_id(item.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity_purchased, 2);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let db = setup_test_db().await;
        let item_a = seed_item(&db, 5).await;
        let item_b = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        // middle line references an item that no longer exists
        let webhook = order(
            1002,
            vec![
                tagged_line(1, 1, "15.00", item_a.id),
                tagged_line(2, 1, "15.00", Uuid::new_v4()),
                tagged_line(3, 2, "15.00", item_b.id),
            ],
        );

        let summary = orchestrator.process_order(&webhook).await.unwrap();
        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.skipped, 1);

        let a = registry_item::Entity::find_by_id(item_a.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let b = registry_item::Entity::find_by_id(item_b.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.quantity_purchased, 1);
        assert_eq!(b.quantity_purchased, 2);
    }

    #[tokio::test]
    async fn test_untagged_lines_ignored_and_bad_tags_skipped() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let untagged = OrderLineItem {
            id: 1,
            quantity: 1,
            price: "9.99".to_string(),
            properties: vec![],
        };
        let bad_tag = OrderLineItem {
            id: 2,
            quantity: 1,
            price: "9.99".to_string(),
            properties: vec![LineItemProperty {
                name: REGISTRY_ITEM_PROPERTY.to_string(),
                value: "not-a-uuid".to_string(),
            }],
        };
        let bad_price = OrderLineItem {
            id: 3,
            quantity: 1,
            price: "free?".to_string(),
            properties: vec![LineItemProperty {
                name: REGISTRY_ITEM_PROPERTY.to_string(),
                value: item.id.to_string(),
            }],
        };

        let summary = orchestrator
            .process_order(&order(1003, vec![untagged, bad_tag, bad_price]))
            .await
            .unwrap();

        // untagged is not counted at all; bad tag and bad price are skips
        assert_eq!(summary.recorded, 0);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn test_gift_message_sanitized_into_purchase() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let mut line = tagged_line(1, 1, "15.00", item.id);
        line.properties.push(LineItemProperty {
            name: "_gift_message".to_string(),
            value: "Congrats <script>alert(1)</script><b>you two</b>!".to_string(),
        });

        orchestrator
            .process_order(&order(1004, vec![line]))
            .await
            .unwrap();

        let purchase = PurchaseRepository::new(&db)
            .find_by_order_line_item("1004", "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            purchase.gift_message,
            Some("Congrats you two!".to_string())
        );
    }

    #[tokio::test]
    async fn test_group_gift_line_pools_completed_contribution() {
        let db = setup_test_db().await;
        let gg_purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let mut line = tagged_line(1, 2, "25.00", item.id);
        line.properties.push(LineItemProperty {
            name: "_group_gift_id".to_string(),
            value: gg_purchase.id.to_string(),
        });

        let summary = orchestrator
            .process_order(&order(1005, vec![line]))
            .await
            .unwrap();
        assert_eq!(summary.recorded, 1);

        // paid order: contribution of the line total, already completed
        let state = ContributionRepository::new(&db)
            .completion_state(gg_purchase.id)
            .await
            .unwrap();
        assert_eq!(state.total_collected, Decimal::new(5000, 2));
        assert_eq!(state.percent_complete, 25.0);
    }

    #[tokio::test]
    async fn test_group_gift_unpaid_order_stays_pending() {
        let db = setup_test_db().await;
        let gg_purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let mut line = tagged_line(1, 1, "50.00", item.id);
        line.properties.push(LineItemProperty {
            name: "_group_gift_id".to_string(),
            value: gg_purchase.id.to_string(),
        });

        let mut webhook = order(1006, vec![line]);
        webhook.financial_status = Some("pending".to_string());

        orchestrator.process_order(&webhook).await.unwrap();

        let contributions = ContributionRepository::new(&db)
            .list_for_purchase(gg_purchase.id)
            .await
            .unwrap();
        assert_eq!(contributions.len(), 1);
        assert_eq!(
            contributions[0].payment_status,
            ContributionStatus::Pending
        );

        // pending contributions do not count toward completion yet
        let state = ContributionRepository::new(&db)
            .completion_state(gg_purchase.id)
            .await
            .unwrap();
        assert_eq!(state.total_collected, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_group_gift_redelivery_does_not_double_contribute() {
        let db = setup_test_db().await;
        let gg_purchase = seed_group_gift_purchase(&db, Decimal::new(20000, 2)).await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        let mut line = tagged_line(1, 2, "25.00", item.id);
        line.properties.push(LineItemProperty {
            name: "_group_gift_id".to_string(),
            value: gg_purchase.id.to_string(),
        });
        let webhook = order(1007, vec![line]);

        orchestrator.process_order(&webhook).await.unwrap();
        orchestrator.process_order(&webhook).await.unwrap();
        orchestrator.process_order(&webhook).await.unwrap();

        let contributions = ContributionRepository::new(&db)
            .list_for_purchase(gg_purchase.id)
            .await
            .unwrap();
        assert_eq!(contributions.len(), 1);
    }

    #[tokio::test]
    async fn test_activities_recorded_for_purchases() {
        let db = setup_test_db().await;
        let item = seed_item(&db, 5).await;
        let orchestrator = Orchestrator::new(&db);

        orchestrator
            .process_order(&order(1008, vec![tagged_line(1, 1, "15.00", item.id)]))
            .await
            .unwrap();

        let activities = activity::Entity::find().all(&db).await.unwrap();
        assert!(
            activities
                .iter()
                .any(|a| a.action == ActivityAction::ItemPurchased
                    && a.registry_id == item.registry_id)
        );
    }
}
