//! # Server Configuration
//!
//! This module contains the server setup and configuration for the WishCraft
//! API: shared state, the router, and the OpenAPI document.

use axum::{
    Router,
    middleware::{self, Next},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

/// Attach a correlation ID to every request so errors and logs line up
async fn trace_context_middleware(
    request: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let trace_id = format!("req-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    telemetry::with_trace_context(TraceContext { trace_id }, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/webhooks/orders-create", post(handlers::webhooks::orders_create))
        .route("/registries", post(handlers::registries::create_registry))
        .route("/registries/{id}", get(handlers::registries::get_registry))
        .route(
            "/registries/{id}/activities",
            get(handlers::registries::list_activities),
        )
        .route(
            "/registries/{id}/items",
            post(handlers::items::add_item).get(handlers::items::list_items),
        )
        .route(
            "/registries/{id}/items/{item_id}",
            axum::routing::delete(handlers::items::remove_item),
        )
        .route(
            "/registries/{id}/items/{item_id}/purchases",
            get(handlers::items::list_item_purchases),
        )
        .route(
            "/purchases/{id}/contributions",
            post(handlers::contributions::add_contribution),
        )
        .route(
            "/purchases/{id}/completion",
            get(handlers::contributions::get_completion_state),
        )
        .route(
            "/contributions/{id}/status",
            post(handlers::contributions::mark_contribution_status),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState { db, config };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::webhooks::orders_create,
        crate::handlers::registries::create_registry,
        crate::handlers::registries::get_registry,
        crate::handlers::registries::list_activities,
        crate::handlers::items::add_item,
        crate::handlers::items::list_items,
        crate::handlers::items::list_item_purchases,
        crate::handlers::items::remove_item,
        crate::handlers::contributions::add_contribution,
        crate::handlers::contributions::mark_contribution_status,
        crate::handlers::contributions::get_completion_state,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::reconciliation::ReconciliationSummary,
            crate::handlers::registries::CreateRegistryRequest,
            crate::handlers::registries::RegistryInfo,
            crate::handlers::registries::ActivityInfo,
            crate::handlers::items::AddItemRequest,
            crate::handlers::items::RegistryItemInfo,
            crate::handlers::contributions::AddContributionRequest,
            crate::handlers::contributions::ContributionStatusRequest,
            crate::models::contribution::ContributionResponse,
            crate::models::contribution::ContributionStatus,
            crate::models::purchase::PurchaseResponse,
            crate::models::activity::ActivityAction,
            crate::models::registry::RegistryStatus,
            crate::models::registry_item::RegistryItemStatus,
            crate::repositories::contribution::CompletionState,
        )
    ),
    info(
        title = "WishCraft Reconciliation API",
        description = "Gift registry purchase reconciliation and group-gift contribution ledger",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
