use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::{
    cart::cart_total,
    error::StorefrontError,
    model::{CartLineItem, Money},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub total: Money,
    pub item_count: u32,
}

impl From<Vec<CartLineItem>> for CartView {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self {
            total: cart_total(&items),
            item_count: items.iter().map(|item| item.quantity).sum(),
            items,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub service_id: String,
    pub variant_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub social_media_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub service_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
    pub social_media_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineQuery {
    pub service_id: String,
    pub variant_id: Option<String>,
}

pub async fn get_cart(State(state): State<AppState>, Path(cart_key): Path<String>) -> Result<Json<CartView>, ApiError> {
    let items = state.carts.items(&cart_key).await?;
    Ok(Json(items.into()))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_key): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<Response, ApiError> {
    let items = state
        .carts
        .add_from_catalog(
            &cart_key,
            &request.service_id,
            request.variant_id.as_deref(),
            request.quantity,
            request.social_media_link,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CartView::from(items))).into_response())
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(cart_key): Path<String>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let variant_id = request.variant_id.as_deref();
    if request.quantity == Some(0) {
        return Err(StorefrontError::validation("Quantity must be at least 1").into());
    }

    let mut items = None;
    if let Some(quantity) = request.quantity {
        items = Some(
            state
                .carts
                .update_quantity(&cart_key, &request.service_id, quantity, variant_id)
                .await?,
        );
    }
    if let Some(link) = &request.social_media_link {
        items = Some(
            state
                .carts
                .update_social_link(&cart_key, &request.service_id, link, variant_id)
                .await?,
        );
    }
    let items = match items {
        Some(items) => items,
        None => state.carts.items(&cart_key).await?,
    };
    Ok(Json(items.into()))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(cart_key): Path<String>,
    Query(line): Query<LineQuery>,
) -> Result<Json<CartView>, ApiError> {
    let items = state
        .carts
        .remove(&cart_key, &line.service_id, line.variant_id.as_deref())
        .await?;
    Ok(Json(items.into()))
}

pub async fn clear_cart(State(state): State<AppState>, Path(cart_key): Path<String>) -> Result<StatusCode, ApiError> {
    state.carts.clear(&cart_key).await?;
    Ok(StatusCode::NO_CONTENT)
}
