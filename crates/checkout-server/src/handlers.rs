//! HTTP Handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use checkout_core::{Order, OrderId, SessionToken, UserId};
use checkout_payments::{PaymentError, ReconcileRequest, Reconciliation, WebhookEvent};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub processor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced to HTTP callers as `{error, code}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("payments not configured")]
    PaymentsDisabled,

    #[error("missing Stripe signature")]
    MissingSignature,

    #[error("session lookup failed: {0}")]
    Session(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Payment(err) => match err {
                PaymentError::Unauthorized => StatusCode::UNAUTHORIZED,
                PaymentError::IntentNotFound(_) | PaymentError::OrderNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                PaymentError::InvalidCart(_) | PaymentError::InvalidSignature(_) => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::OrderFinalized(_) => StatusCode::CONFLICT,
                PaymentError::ProcessorUnavailable(_) | PaymentError::StoreUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                PaymentError::Processor(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Storage(_) | PaymentError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::PaymentsDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MissingSignature => StatusCode::BAD_REQUEST,
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Payment(err) => err.code(),
            ApiError::PaymentsDisabled => "PAYMENTS_DISABLED",
            ApiError::MissingSignature => "MISSING_SIGNATURE",
            ApiError::Session(_) => "SESSION_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Payment(err) => err.user_message(),
            ApiError::PaymentsDisabled => "Payments not configured".into(),
            ApiError::MissingSignature => "Missing Stripe signature".into(),
            ApiError::Session(_) => "Please sign in again.".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.message(),
            code: self.code().into(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.processor.as_deref() == Some("Stripe"),
        processor: state.processor.clone(),
    })
}

/// Reconcile the caller's cart with a payment intent and pending order
pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReconcileRequest>,
) -> Result<Json<Reconciliation>, ApiError> {
    let reconciler = state.reconciler.as_ref().ok_or(ApiError::PaymentsDisabled)?;
    let caller = caller(&state, &headers)?;

    let result = reconciler.reconcile(caller.as_ref(), payload).await?;
    Ok(Json(result))
}

/// Processor webhook; the body must stay raw for signature verification
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let webhooks = state.webhooks.as_ref().ok_or(ApiError::PaymentsDisabled)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook signature failed: missing Stripe-Signature header");
            ApiError::MissingSignature
        })?;

    let event = webhooks.handle(&body, signature).await?;
    if let WebhookEvent::ChargeSucceeded { outcome, .. } = &event {
        tracing::debug!(outcome = ?outcome, "Webhook applied");
    }

    Ok(Json(WebhookAck { received: true }))
}

/// The caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user = caller(&state, &headers)?.ok_or(PaymentError::Unauthorized)?;

    let orders = state
        .timeouts
        .store("list orders", state.orders.list_for_user(&user))
        .await?;
    Ok(Json(orders))
}

/// One order owned by the caller
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let user = caller(&state, &headers)?.ok_or(PaymentError::Unauthorized)?;
    let id = OrderId::from(id);

    let order = state
        .timeouts
        .store("get order", state.orders.get(&id))
        .await?
        .filter(|order| order.user_id == user)
        .ok_or_else(|| PaymentError::OrderNotFound(id.to_string()))?;
    Ok(Json(order))
}

/// Resolve the bearer token to a user; `None` for anonymous or unknown tokens
fn caller(state: &AppState, headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Ok(None);
    };

    let token = SessionToken::from_string(token);
    let session = state
        .sessions
        .resolve(&token)
        .map_err(|e| ApiError::Session(e.to_string()))?;

    if session.is_none() {
        tracing::debug!(token = %token, "Unknown or expired session token");
    }
    Ok(session.map(|s| s.user_id))
}
