//! # Registry Item Endpoint Handlers
//!
//! Storefront-facing surface for adding, listing, and removing registry
//! items. Removal soft-deactivates: purchases recorded against the item
//! survive, and orders already placed keep reconciling.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::activity::ActivityAction;
use crate::models::registry_item::RegistryItemStatus;
use crate::repositories::activity::Actor;
use crate::repositories::registry_item::NewRegistryItem;
use crate::repositories::{ActivityRepository, RegistryItemRepository, RegistryRepository};
use crate::server::AppState;

/// Request payload for adding a product to a registry
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    #[schema(example = "gid://shopify/Product/42")]
    pub product_id: String,
    pub variant_id: Option<String>,
    #[schema(example = "Stand Mixer")]
    pub title: String,
    /// Target quantity, at least 1
    #[schema(example = 5, minimum = 1)]
    pub quantity: i32,
    /// Unit price as a decimal string
    #[schema(example = "15.00")]
    pub unit_price: String,
    #[schema(example = "USD")]
    pub currency_code: String,
}

/// Registry item information for API responses, including the purchased
/// quantity the storefront renders progress from
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistryItemInfo {
    pub id: Uuid,
    pub registry_id: Uuid,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    pub quantity: i32,
    pub quantity_purchased: i32,
    #[schema(value_type = String, example = "15.00")]
    pub unit_price: Decimal,
    pub currency_code: String,
    pub status: RegistryItemStatus,
    #[schema(value_type = String, example = "2026-01-05T12:00:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::registry_item::Model> for RegistryItemInfo {
    fn from(model: crate::models::registry_item::Model) -> Self {
        Self {
            id: model.id,
            registry_id: model.registry_id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            title: model.title,
            quantity: model.quantity,
            quantity_purchased: model.quantity_purchased,
            unit_price: model.unit_price,
            currency_code: model.currency_code,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Add a product to a registry
#[utoipa::path(
    post,
    path = "/registries/{id}/items",
    params(("id" = Uuid, Path, description = "Registry id")),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added", body = RegistryItemInfo),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Registry not found", body = ApiError)
    ),
    tag = "items"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(registry_id): Path<Uuid>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<RegistryItemInfo>), ApiError> {
    if request.quantity < 1 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "quantity must be at least 1",
        ));
    }

    if request.product_id.trim().is_empty() || request.title.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "product_id and title must be non-empty",
        ));
    }

    let unit_price = Decimal::from_str(&request.unit_price).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "unit_price must be a decimal string",
        )
    })?;
    if unit_price < Decimal::ZERO {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "unit_price must not be negative",
        ));
    }

    if request.currency_code.len() != 3 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "currency_code must be a three-letter ISO code",
        ));
    }

    let registry = RegistryRepository::new(&state.db)
        .get_by_id(registry_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry not found")
        })?;

    let item = RegistryItemRepository::new(&state.db)
        .add_item(NewRegistryItem {
            registry_id: registry.id,
            product_id: request.product_id,
            variant_id: request.variant_id,
            title: request.title,
            quantity: request.quantity,
            unit_price,
            currency_code: request.currency_code.to_uppercase(),
        })
        .await?;

    ActivityRepository::new(&state.db)
        .record_best_effort(
            registry.id,
            ActivityAction::ItemAdded,
            format!("{} added to registry", item.title),
            Some(serde_json::json!({
                "item_id": item.id,
                "product_id": item.product_id.clone(),
                "quantity": item.quantity,
            })),
            Actor::Person {
                name: None,
                email: registry.customer_email,
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// List a registry's items
#[utoipa::path(
    get,
    path = "/registries/{id}/items",
    params(("id" = Uuid, Path, description = "Registry id")),
    responses(
        (status = 200, description = "Items listed", body = [RegistryItemInfo]),
        (status = 404, description = "Registry not found", body = ApiError)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(registry_id): Path<Uuid>,
) -> Result<Json<Vec<RegistryItemInfo>>, ApiError> {
    RegistryRepository::new(&state.db)
        .get_by_id(registry_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry not found")
        })?;

    let items = RegistryItemRepository::new(&state.db)
        .list_for_registry(registry_id)
        .await?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// List purchases recorded against a registry item, newest first
#[utoipa::path(
    get,
    path = "/registries/{id}/items/{item_id}/purchases",
    params(
        ("id" = Uuid, Path, description = "Registry id"),
        ("item_id" = Uuid, Path, description = "Registry item id")
    ),
    responses(
        (status = 200, description = "Purchases listed", body = [crate::models::purchase::PurchaseResponse]),
        (status = 404, description = "Registry or item not found", body = ApiError)
    ),
    tag = "items"
)]
pub async fn list_item_purchases(
    State(state): State<AppState>,
    Path((registry_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<crate::models::purchase::PurchaseResponse>>, ApiError> {
    let item = RegistryItemRepository::new(&state.db)
        .get_item(item_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry item not found")
        })?;
    if item.registry_id != registry_id {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "registry item not found",
        ));
    }

    let purchases = crate::repositories::PurchaseRepository::new(&state.db)
        .list_for_item(item_id)
        .await?;

    Ok(Json(purchases.into_iter().map(Into::into).collect()))
}

/// Remove an item from a registry (soft-deactivate)
#[utoipa::path(
    delete,
    path = "/registries/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Registry id"),
        ("item_id" = Uuid, Path, description = "Registry item id")
    ),
    responses(
        (status = 200, description = "Item deactivated", body = RegistryItemInfo),
        (status = 404, description = "Registry or item not found", body = ApiError)
    ),
    tag = "items"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((registry_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RegistryItemInfo>, ApiError> {
    let repo = RegistryItemRepository::new(&state.db);

    let item = repo.get_item(item_id).await?.ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry item not found")
    })?;
    if item.registry_id != registry_id {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "registry item not found",
        ));
    }

    let item = repo.deactivate(item_id).await?;

    ActivityRepository::new(&state.db)
        .record_best_effort(
            registry_id,
            ActivityAction::ItemRemoved,
            format!("{} removed from registry", item.title),
            Some(serde_json::json!({"item_id": item.id})),
            Actor::Person {
                name: None,
                email: None,
            },
        )
        .await;

    Ok(Json(item.into()))
}
