//! Shared helpers for integration tests: an app instance backed by an
//! in-memory SQLite database with migrations applied, plus request plumbing.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tower::ServiceExt;
use uuid::Uuid;

use wishcraft::config::AppConfig;
use wishcraft::models::{purchase, registry, registry_item};
use wishcraft::server::{AppState, create_app};

/// Build an application over a fresh in-memory database.
///
/// The pool is capped at one connection so every query sees the same
/// in-memory database.
pub async fn setup_app() -> (AppState, Router) {
    let config = AppConfig {
        profile: "test".to_string(),
        ..Default::default()
    };

    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect test db");
    Migrator::up(&db, None).await.expect("apply migrations");

    let state = AppState { db, config };
    let app = create_app(state.clone());
    (state, app)
}

/// Send one request through the router and return the response
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("send request")
}

/// POST a JSON body and return the response
pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// GET a path and return the response
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body as json")
}

/// Insert an aggregating group-gift purchase with the given target amount,
/// along with the registry and item that own it
pub async fn seed_group_gift_purchase(
    db: &DatabaseConnection,
    target: Decimal,
) -> purchase::Model {
    let now = Utc::now();
    let registry_id = Uuid::new_v4();

    let reg = registry::ActiveModel {
        id: Set(registry_id),
        shop_domain: Set("demo.myshopify.com".to_string()),
        customer_email: Set(Some("owner@example.com".to_string())),
        title: Set("Group Gift Registry".to_string()),
        slug: Set(format!("group-gift-{}", registry_id.simple())),
        status: Set(registry::RegistryStatus::Active),
        event_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    reg.insert(db).await.expect("insert registry");

    let item = registry_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        registry_id: Set(registry_id),
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
