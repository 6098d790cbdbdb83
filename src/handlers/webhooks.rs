//! # Webhook Handlers
//!
//! Receives Shopify order webhooks and hands them to the reconciliation
//! orchestrator. HMAC authenticity verification and deduplicated delivery
//! are the webhook gateway's job; payloads arriving here are trusted.
//!
//! Status mapping is deliberate: a structurally invalid body is rejected 400
//! without retry (redelivery cannot help), per-line-item problems still
//! return 200 so Shopify does not redeliver a payload we have already
//! applied, and only infrastructure failures surface as 5xx to trigger the
//! platform's retry mechanism.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::reconciliation::payload::OrderWebhook;
use crate::reconciliation::{Orchestrator, ReconciliationSummary};
use crate::server::AppState;

/// Reconcile an order-created webhook
#[utoipa::path(
    post,
    path = "/webhooks/orders-create",
    request_body(content = serde_json::Value, description = "Shopify order payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Order reconciled; skipped line items are counted, not fatal", body = ReconciliationSummary),
        (status = 400, description = "Structurally invalid payload, do not retry", body = ApiError),
        (status = 413, description = "Payload exceeds configured size limit", body = ApiError),
        (status = 503, description = "Database unavailable, Shopify should redeliver", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn orders_create(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<ReconciliationSummary>, ApiError> {
    let body = req.into_body();
    let max_bytes = state.config.webhook_max_body_kb * 1024;
    let body_bytes = axum::body::to_bytes(body, max_bytes).await.map_err(|_| {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Webhook body exceeds configured size limit",
        )
    })?;

    let order: OrderWebhook = match serde_json::from_slice(&body_bytes) {
        Ok(order) => order,
        Err(err) => {
            warn!(error = %err, "malformed order webhook body");
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "MALFORMED_PAYLOAD",
                &format!("Invalid order payload: {}", err),
            ));
        }
    };

    let orchestrator = Orchestrator::new(&state.db);
    match orchestrator.process_order(&order).await {
        Ok(summary) => Ok(Json(summary)),
        Err(err) if err.is_transient() => {
            error!(error = %err, order_id = order.id, "database unavailable during reconciliation");
            Err(ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Database unavailable, retry delivery",
            ))
        }
        Err(err) => {
            error!(error = %err, order_id = order.id, "reconciliation failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Reconciliation failed",
            ))
        }
    }
}
