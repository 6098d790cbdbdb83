//! Shared helpers for in-crate tests: an in-memory SQLite database with the
//! full migration set applied, plus seed data builders.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::models::{purchase, registry, registry_item};

/// Fresh in-memory database with migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory
/// database; separate pool connections would each see their own empty one.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");
    db
}

/// Insert a registry with a unique slug
pub async fn seed_registry(db: &DatabaseConnection) -> registry::Model {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let active = registry::ActiveModel {
        id: Set(id),
        shop_domain: Set("demo.myshopify.com".to_string()),
        customer_email: Set(Some("owner@example.com".to_string())),
        title: Set("Test Registry".to_string()),
        slug: Set(format!("test-registry-{}", id.simple())),
        status: Set(registry::RegistryStatus::Active),
        event_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    active.insert(db).await.expect("insert registry")
}

/// Insert an aggregating group-gift purchase with the given target amount,
/// along with the registry and item that own it
pub async fn seed_group_gift_purchase(
    db: &DatabaseConnection,
    target: Decimal,
) -> purchase::Model {
    let registry = seed_registry(db).await;
    let now = Utc::now();

    let item = registry_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        registry_id: Set(registry.id),
        product_id: Set("prod_group_gift".to_string()),
        variant_id: Set(None),
        title: Set("Group Gift".to_string()),
        quantity: Set(1),
        quantity_purchased: Set(0),
        unit_price: Set(target),
        currency_code: Set("USD".to_string()),
        status: Set(registry_item::RegistryItemStatus::Active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let item = item.insert(db).await.expect("insert registry item");

    let purchase_id = Uuid::new_v4();
    let active = purchase::ActiveModel {
        id: Set(purchase_id),
        registry_item_id: Set(item.id),
        order_id: Set(format!("gg-order-{}", purchase_id.simple())),
        line_item_id: Set("1".to_string()),
        quantity: Set(1),
        unit_price: Set(target),
        total_amount: Set(target),
        currency_code: Set("USD".to_string()),
        purchaser_name: Set(None),
        purchaser_email: Set(None),
        gift_message: Set(None),
        payment_status: Set("pending".to_string()),
        fulfillment_status: Set("unfulfilled".to_string()),
        is_group_gift: Set(true),
        group_gift_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    active.insert(db).await.expect("insert group gift purchase")
}
