//! # Registry Endpoint Handlers
//!
//! CRUD surface for registries and their activity feed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::activity::ActivityAction;
use crate::models::registry::RegistryStatus;
use crate::repositories::activity::Actor;
use crate::repositories::registry::NewRegistry;
use crate::repositories::{ActivityRepository, RegistryRepository};
use crate::server::AppState;

/// Request payload for creating a registry
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRegistryRequest {
    /// Shop the registry belongs to
    #[schema(example = "demo.myshopify.com")]
    pub shop_domain: String,
    /// Email of the owning customer
    pub customer_email: Option<String>,
    #[schema(example = "Our Wedding")]
    pub title: String,
    /// URL-safe handle, unique per shop
    #[schema(example = "our-wedding")]
    pub slug: String,
    /// Optional event date (RFC3339)
    pub event_date: Option<String>,
}

/// Registry information for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistryInfo {
    pub id: Uuid,
    pub shop_domain: String,
    pub customer_email: Option<String>,
    pub title: String,
    pub slug: String,
    pub status: RegistryStatus,
    #[schema(value_type = Option<String>, example = "2026-06-20T00:00:00Z")]
    pub event_date: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "2026-01-05T12:00:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::registry::Model> for RegistryInfo {
    fn from(model: crate::models::registry::Model) -> Self {
        Self {
            id: model.id,
            shop_domain: model.shop_domain,
            customer_email: model.customer_email,
            title: model.title,
            slug: model.slug,
            status: model.status,
            event_date: model.event_date.map(|d| d.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Create a registry
#[utoipa::path(
    post,
    path = "/registries",
    request_body = CreateRegistryRequest,
    responses(
        (status = 201, description = "Registry created", body = RegistryInfo),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Slug already taken for this shop", body = ApiError)
    ),
    tag = "registries"
)]
pub async fn create_registry(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistryRequest>,
) -> Result<(StatusCode, Json<RegistryInfo>), ApiError> {
    if request.shop_domain.trim().is_empty()
        || request.title.trim().is_empty()
        || request.slug.trim().is_empty()
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "shop_domain, title, and slug must be non-empty",
        ));
    }

    if !request
        .slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "slug may only contain lowercase letters, digits, and dashes",
        ));
    }

    let event_date = match &request.event_date {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "event_date must be a valid RFC3339 timestamp",
                ));
            }
        },
        None => None,
    };

    let repo = RegistryRepository::new(&state.db);
    let registry = repo
        .create(NewRegistry {
            shop_domain: request.shop_domain,
            customer_email: request.customer_email.clone(),
            title: request.title,
            slug: request.slug,
            event_date,
        })
        .await?;

    ActivityRepository::new(&state.db)
        .record_best_effort(
            registry.id,
            ActivityAction::RegistryCreated,
            format!("Registry \"{}\" created", registry.title),
            None,
            Actor::Person {
                name: None,
                email: request.customer_email,
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(registry.into())))
}

/// Fetch a registry by id
#[utoipa::path(
    get,
    path = "/registries/{id}",
    params(("id" = Uuid, Path, description = "Registry id")),
    responses(
        (status = 200, description = "Registry found", body = RegistryInfo),
        (status = 404, description = "Registry not found", body = ApiError)
    ),
    tag = "registries"
)]
pub async fn get_registry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistryInfo>, ApiError> {
    let registry = RegistryRepository::new(&state.db)
        .get_by_id(id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry not found")
        })?;

    Ok(Json(registry.into()))
}

/// Query parameters for the activity feed
#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityFeedQuery {
    /// Maximum number of records to return
    pub limit: Option<i64>,
    /// Number of records to skip
    pub offset: Option<i64>,
}

/// Activity information for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityInfo {
    pub id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub actor_name: Option<String>,
    pub is_system: bool,
    pub metadata: Option<serde_json::Value>,
    #[schema(value_type = String, example = "2026-01-05T12:00:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::activity::Model> for ActivityInfo {
    fn from(model: crate::models::activity::Model) -> Self {
        Self {
            id: model.id,
            action: model.action,
            description: model.description,
            actor_name: model.actor_name,
            is_system: model.is_system,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// List a registry's activity feed, newest first
#[utoipa::path(
    get,
    path = "/registries/{id}/activities",
    params(("id" = Uuid, Path, description = "Registry id"), ActivityFeedQuery),
    responses(
        (status = 200, description = "Activities listed", body = [ActivityInfo]),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 404, description = "Registry not found", body = ApiError)
    ),
    tag = "registries"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityFeedQuery>,
) -> Result<Json<Vec<ActivityInfo>>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.activity_page_size);
    if limit < 1 || limit > state.config.activity_page_size_max {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            &format!(
                "limit must be between 1 and {}",
                state.config.activity_page_size_max
            ),
        ));
    }
    let offset = query.offset.unwrap_or(0).max(0);

    RegistryRepository::new(&state.db)
        .get_by_id(id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "registry not found")
        })?;

    let activities = ActivityRepository::new(&state.db)
        .list_for_registry(id, limit, offset)
        .await?;

    Ok(Json(activities.into_iter().map(Into::into).collect()))
}
