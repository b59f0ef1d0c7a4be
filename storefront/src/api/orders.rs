use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::{not_found, ApiError, AppState};
use crate::{
    auth::Principal,
    error::StorefrontError,
    model::{Order, OrderId, PaymentStatus},
};

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: PaymentStatus,
    pub session_id: Option<String>,
}

pub async fn list_orders(principal: Principal, State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    principal.require_admin()?;
    Ok(Json(state.orders.get_all().await?))
}

pub async fn my_orders(principal: Principal, State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.get_by_customer_email(&principal.email).await?))
}

pub async fn get_order(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(order) = state.orders.get_by_id(&OrderId::from(id)).await? else {
        return Ok(not_found("Order"));
    };
    if !principal.can_view(&order) {
        return Err(StorefrontError::Forbidden.into());
    }
    Ok(Json(order).into_response())
}

/// Administrative status override, no loyalty side effects.
pub async fn update_order(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Response, ApiError> {
    principal.require_admin()?;
    let order_id = OrderId::from(id);
    info!(order_id = %order_id, status = %request.status, admin = %principal.email, "Admin status update");
    match state
        .orders
        .update_status(&order_id, request.status, request.session_id.as_deref())
        .await?
    {
        Some(order) => Ok(Json(order).into_response()),
        None => Ok(not_found("Order")),
    }
}
