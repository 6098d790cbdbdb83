//! # Contribution Endpoint Handlers
//!
//! Guest-facing group-gift contributions and the payment collaborator's
//! status callback, plus the derived completion state the storefront
//! progress UI reads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::activity::ActivityAction;
use crate::models::contribution::{ContributionResponse, ContributionStatus};
use crate::models::registry_item::RegistryItemStatus;
use crate::repositories::activity::Actor;
use crate::repositories::contribution::{CompletionState, ContributorInfo};
use crate::repositories::{
    ActivityRepository, ContributionRepository, PurchaseRepository, RegistryItemRepository,
};
use crate::server::AppState;

/// Request payload for submitting a contribution
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddContributionRequest {
    pub contributor_name: Option<String>,
    pub contributor_email: Option<String>,
    /// Hide contributor identity from other contributors
    #[serde(default)]
    pub is_anonymous: bool,
    /// Show the contributed amount to other contributors
    #[serde(default = "default_show_amount")]
    pub show_amount: bool,
    /// Contribution amount as a decimal string
    #[schema(example = "50.00")]
    pub amount: String,
    #[schema(example = "USD")]
    pub currency_code: String,
}

fn default_show_amount() -> bool {
    true
}

/// Request payload for the payment collaborator's status callback
#[derive(Debug, Deserialize, ToSchema)]
pub struct ContributionStatusRequest {
    pub status: ContributionStatus,
}

/// Submit a contribution toward a group gift
#[utoipa::path(
    post,
    path = "/purchases/{id}/contributions",
    params(("id" = Uuid, Path, description = "Aggregating group-gift purchase id")),
    request_body = AddContributionRequest,
    responses(
        (status = 201, description = "Contribution recorded as pending", body = ContributionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Purchase not found", body = ApiError),
        (status = 409, description = "Target item inactive", body = ApiError)
    ),
    tag = "contributions"
)]
pub async fn add_contribution(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
    Json(request): Json<AddContributionRequest>,
) -> Result<(StatusCode, Json<ContributionResponse>), ApiError> {
    let amount = Decimal::from_str(&request.amount).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "amount must be a decimal string",
        )
    })?;
    if amount <= Decimal::ZERO {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "amount must be positive",
        ));
    }

    let purchase = PurchaseRepository::new(&state.db)
        .get_by_id(purchase_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "purchase not found")
        })?;

    if !purchase.is_group_gift {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "purchase is not a group gift",
        ));
    }

    // New contributions are a customer-facing path; a removed gift no longer
    // accepts them (unlike ledger reconciliation of already placed orders).
    let item = RegistryItemRepository::new(&state.db)
        .get_item(purchase.registry_item_id)
        .await?;
    if let Some(ref item) = item
        && item.status == RegistryItemStatus::Inactive
    {
        return Err(crate::error::RepositoryError::ItemInactive(item.id).into());
    }

    let contribution = ContributionRepository::new(&state.db)
        .add_contribution(
            purchase_id,
            ContributorInfo {
                name: request.contributor_name.clone(),
                email: request.contributor_email.clone(),
                is_anonymous: request.is_anonymous,
                show_amount: request.show_amount,
            },
            amount,
            request.currency_code.to_uppercase(),
        )
        .await?;

    if let Some(item) = item {
        let actor = if request.is_anonymous {
            Actor::Person {
                name: None,
                email: None,
            }
        } else {
            Actor::Person {
                name: request.contributor_name,
                email: request.contributor_email,
            }
        };
        ActivityRepository::new(&state.db)
            .record_best_effort(
                item.registry_id,
                ActivityAction::ContributionReceived,
                format!("Contribution pledged toward {}", item.title),
                Some(serde_json::json!({
                    "contribution_id": contribution.id,
                    "purchase_id": purchase_id,
                })),
                actor,
            )
            .await;
    }

    Ok((StatusCode::CREATED, Json(contribution.into())))
}

/// Apply a payment status transition to a contribution
#[utoipa::path(
    post,
    path = "/contributions/{id}/status",
    params(("id" = Uuid, Path, description = "Contribution id")),
    request_body = ContributionStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ContributionResponse),
        (status = 404, description = "Contribution not found", body = ApiError),
        (status = 409, description = "Illegal status transition", body = ApiError)
    ),
    tag = "contributions"
)]
pub async fn mark_contribution_status(
    State(state): State<AppState>,
    Path(contribution_id): Path<Uuid>,
    Json(request): Json<ContributionStatusRequest>,
) -> Result<Json<ContributionResponse>, ApiError> {
    let repo = ContributionRepository::new(&state.db);
    let contribution = repo.mark_status(contribution_id, request.status).await?;

    let action = match contribution.payment_status {
        ContributionStatus::Completed => Some(ActivityAction::ContributionCompleted),
        ContributionStatus::Failed => Some(ActivityAction::ContributionFailed),
        ContributionStatus::Refunded => Some(ActivityAction::ContributionRefunded),
        ContributionStatus::Pending => None,
    };

    if let Some(action) = action {
        // Walk up to the owning registry for the audit record
        let registry_id = match PurchaseRepository::new(&state.db)
            .get_by_id(contribution.purchase_id)
            .await?
        {
            Some(purchase) => RegistryItemRepository::new(&state.db)
                .get_item(purchase.registry_item_id)
                .await?
                .map(|item| item.registry_id),
            None => None,
        };

        if let Some(registry_id) = registry_id {
            ActivityRepository::new(&state.db)
                .record_best_effort(
                    registry_id,
                    action,
                    format!("Contribution {:?}", contribution.payment_status),
                    Some(serde_json::json!({
                        "contribution_id": contribution.id,
                        "purchase_id": contribution.purchase_id,
                    })),
                    Actor::System,
                )
                .await;
        }
    }

    Ok(Json(contribution.into()))
}

/// Read the derived completion state of a group gift
#[utoipa::path(
    get,
    path = "/purchases/{id}/completion",
    params(("id" = Uuid, Path, description = "Aggregating group-gift purchase id")),
    responses(
        (status = 200, description = "Completion state", body = CompletionState),
        (status = 404, description = "Purchase not found", body = ApiError)
    ),
    tag = "contributions"
)]
pub async fn get_completion_state(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> Result<Json<CompletionState>, ApiError> {
    let state_result = ContributionRepository::new(&state.db)
        .completion_state(purchase_id)
        .await?;

    Ok(Json(state_result))
}
