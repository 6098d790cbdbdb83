//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the WishCraft API.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod contributions;
pub mod items;
pub mod registries;
pub mod webhooks;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness handler that also pings the database
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable", body = crate::error::ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(
    axum::extract::State(state): axum::extract::State<crate::server::AppState>,
) -> Result<Json<serde_json::Value>, crate::error::ApiError> {
    crate::db::health_check(&state.db).await.map_err(|err| {
        tracing::error!(error = ?err, "health check failed");
        crate::error::ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
    })?;

    Ok(Json(serde_json::json!({"status": "ok"})))
}
