//! # Error Handling
//!
//! This module provides unified error handling for the WishCraft API,
//! implementing a consistent problem+json response format with trace ID
//! propagation, plus the typed repository-layer error taxonomy the
//! reconciliation core is built on.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::contribution::ContributionStatus;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active tracing span (falls back to a
    /// generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

/// Classify a SeaORM error as a unique-constraint violation.
///
/// The purchase ledger leans on this: a duplicate (order_id, line_item_id)
/// insert aborting with a unique violation is the idempotent no-op path, not
/// a failure. Codes cover Postgres, MySQL, and the SQLite backend tests run
/// against.
pub fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const MYSQL_DUPLICATE_CODES: &[&str] = &["1022", "1062", "1169", "1586"];
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    match db_error.code() {
        Some(code) => {
            let code = code.as_ref();
            code == PG_UNIQUE
                || MYSQL_DUPLICATE_CODES.contains(&code)
                || SQLITE_DUPLICATE_CODES.contains(&code)
        }
        None => false,
    }
}

/// Whether a database error is a connectivity problem the webhook layer
/// should surface as retryable (Shopify redelivers on non-2xx).
pub fn is_transient(error: &sea_orm::DbErr) -> bool {
    matches!(
        error,
        sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
    )
}

/// Repository-layer errors shared by the item store, purchase ledger,
/// contribution tracker, and activity recorder.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("registry item {0} is inactive")]
    ItemInactive(uuid::Uuid),

    #[error("illegal contribution transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: ContributionStatus,
        to: ContributionStatus,
    },

    #[error("contribution currency {given} does not match purchase currency {expected}")]
    CurrencyMismatch { given: String, expected: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl RepositoryError {
    /// Wrap a SeaORM error; used as `.map_err(RepositoryError::database_error)`
    pub fn database_error(err: sea_orm::DbErr) -> Self {
        RepositoryError::Database(err)
    }

    /// True when the underlying database is unreachable and the caller should
    /// report failure so the platform retries delivery.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Database(err) => is_transient(err),
            _ => false,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(what) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("{} not found", what),
            ),
            RepositoryError::ItemInactive(id) => Self::new(
                StatusCode::CONFLICT,
                "ITEM_INACTIVE",
                &format!("registry item {} is inactive", id),
            ),
            RepositoryError::InvalidTransition { from, to } => Self::new(
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                &format!("illegal contribution transition {:?} -> {:?}", from, to),
            ),
            RepositoryError::CurrencyMismatch { given, expected } => Self::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                &format!(
                    "contribution currency {} does not match purchase currency {}",
                    given, expected
                ),
            ),
            RepositoryError::Database(db_err) => db_err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}
