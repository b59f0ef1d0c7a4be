use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::{ApiError, AppState};
use crate::payment::webhook::{verify_signature, WebhookEvent, SIGNATURE_HEADER};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub cart_key: String,
    pub full_name: String,
    pub email: String,
}

pub async fn start_checkout(State(state): State<AppState>, Json(request): Json<CheckoutRequest>) -> Response {
    match state
        .checkout
        .start_checkout(&request.cart_key, &request.full_name, &request.email)
        .await
    {
        Ok(started) => (StatusCode::CREATED, Json(started)).into_response(),
        Err(e) => {
            warn!(error = %e, cart_key = %request.cart_key, "Checkout rejected");
            ApiError(e).into_response()
        }
    }
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let confirmation = state.checkout.confirm_session(&session_id).await?;
    Ok(Json(confirmation).into_response())
}

/// Gateway push path; settles orders exactly like polling does.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let secret = &state.payment.webhook_secret;
    if secret.is_empty() {
        error!("Webhook received but no webhook secret is configured");
        return (StatusCode::SERVICE_UNAVAILABLE, "webhook not configured").into_response();
    }

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("Webhook without signature header");
        return (StatusCode::BAD_REQUEST, "missing signature").into_response();
    };
    let now = chrono::Utc::now().timestamp();
    if let Err(e) = verify_signature(&body, signature, secret, state.payment.webhook_tolerance_secs, now) {
        warn!(error = %e, "Rejected webhook signature");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    let event = match WebhookEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Unparseable webhook payload");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let Some(payment) = event.payment_event() else {
        info!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
        return (StatusCode::OK, Json(json!({ "received": true }))).into_response();
    };

    let order_id = match payment.order_id {
        Some(order_id) => Some(order_id),
        None => match state.orders.get_by_session(&payment.session_id).await {
            Ok(order) => order.map(|o| o.id),
            Err(e) => return ApiError::from(e).into_response(),
        },
    };
    let Some(order_id) = order_id else {
        warn!(session_id = %payment.session_id, "Webhook for unknown order");
        return (StatusCode::OK, Json(json!({ "received": true }))).into_response();
    };

    match state
        .checkout
        .apply_payment_outcome(&order_id, payment.status, &payment.session_id)
        .await
    {
        Ok(_) => {
            info!(event_id = %event.id, order_id = %order_id, status = %payment.status, "Processed webhook");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e) => {
            error!(error = %e, order_id = %order_id, "Failed to apply webhook outcome");
            ApiError(e).into_response()
        }
    }
}
