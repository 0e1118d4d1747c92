//! HTTP Handlers
//!
//! Transport boundary only: request parsing, error-to-status mapping, and
//! response shaping. All settlement semantics live in `media-payments`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use media_core::{MediaItem, MediaKind};
use media_payments::{
    CheckoutRedirect, InitiatePurchase, PaymentError, SettlementOutcome, WatchRecord,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub payments_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentRequest {
    pub user_id: String,
    /// Declared item kind ("MOVIE" | "SERIES")
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchRequest {
    pub user_id: String,
    pub media_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: bool,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a flow error onto a transport status
fn payment_error(err: &PaymentError) -> HandlerError {
    let (status, code) = match err {
        PaymentError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        PaymentError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        PaymentError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
        PaymentError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "PAYMENTS_DISABLED"),
        PaymentError::Consistency(_) | PaymentError::Storage(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "SETTLEMENT_ERROR")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message().to_string(),
            code: code.into(),
        }),
    )
}

fn payments_disabled() -> HandlerError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Payments not configured".into(),
            code: "PAYMENTS_DISABLED".into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payments_enabled: state.payments_enabled,
    })
}

/// List catalog items
pub async fn list_media(
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaItem>>, HandlerError> {
    let items = state.catalog.list_items().await.map_err(|e| {
        tracing::error!("Catalog error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Could not load the catalog.".into(),
                code: "CATALOG_ERROR".into(),
            }),
        )
    })?;

    Ok(Json(items))
}

/// Start a purchase, answering with the hosted-checkout redirect
pub async fn init_payment(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(payload): Json<InitPaymentRequest>,
) -> Result<Json<CheckoutRedirect>, HandlerError> {
    if !state.payments_enabled {
        return Err(payments_disabled());
    }

    let kind = MediaKind::parse(&payload.kind).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown media type '{}'", payload.kind),
                code: "INVALID_REQUEST".into(),
            }),
        )
    })?;

    let redirect = state
        .flow
        .initiate_purchase(
            &item_id,
            InitiatePurchase {
                user_id: payload.user_id,
                kind,
                amount: payload.amount,
                name: payload.name,
                email: payload.email,
            },
        )
        .await
        .map_err(|e| {
            tracing::error!("Checkout initiation error: {}", e);
            payment_error(&e)
        })?;

    Ok(Json(redirect))
}

/// Gateway callback (IPN) delivery
///
/// A validation failure is a normal 200 outcome carrying the failure
/// message; only broken payloads or storage trouble become errors.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SettlementOutcome>, HandlerError> {
    if !state.payments_enabled {
        return Err(payments_disabled());
    }

    let payload = serde_json::to_value(&params).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unreadable callback payload: {e}"),
                code: "INVALID_REQUEST".into(),
            }),
        )
    })?;

    let outcome = state.flow.reconcile_callback(payload).await.map_err(|e| {
        tracing::error!("Callback reconciliation error: {}", e);
        payment_error(&e)
    })?;

    Ok(Json(outcome))
}

/// Entitlement check for one (user, item) pair
pub async fn payment_status(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<AccessResponse>, HandlerError> {
    let access = state
        .flow
        .check_entitlement(&query.user_id, &item_id)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok(Json(AccessResponse { access }))
}

/// Record a watch; 403 without entitlement
pub async fn add_watch(
    State(state): State<AppState>,
    Json(payload): Json<AddWatchRequest>,
) -> Result<(StatusCode, Json<WatchRecord>), HandlerError> {
    let record = state
        .flow
        .record_watch(&payload.user_id, &payload.media_id)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// The user's watch history, most recent first
pub async fn watch_history(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<WatchRecord>>, HandlerError> {
    let history = state
        .flow
        .watch_history(&query.user_id)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok(Json(history))
}
