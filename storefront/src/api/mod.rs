use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::config::{Config, PaymentConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::{
    auth::TokenRegistry,
    cart::CartStore,
    catalog::CatalogRepository,
    checkout::CheckoutService,
    error::StorefrontError,
    loyalty::LoyaltyLedger,
    model::GenericError,
    notify::Notifier,
    orders::OrderLedger,
    payment::PaymentGateway,
    storage::{CartStorage, LoyaltyStorage, OrderStorage},
};

pub mod cart;
pub mod catalog;
pub mod loyalty;
pub mod orders;
pub mod payments;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub carts: CartStore,
    pub orders: OrderLedger,
    pub loyalty: LoyaltyLedger,
    pub checkout: CheckoutService,
    pub tokens: Arc<TokenRegistry>,
    pub payment: Arc<PaymentConfig>,
    pub metrics: Option<PrometheusHandle>,
}

/// Storage backends behind the ledgers.
#[derive(Clone)]
pub struct StorageSet {
    pub carts: Arc<dyn CartStorage>,
    pub orders: Arc<dyn OrderStorage>,
    pub loyalty: Arc<dyn LoyaltyStorage>,
}

impl AppState {
    pub fn new(
        config: &Config,
        catalog: Arc<dyn CatalogRepository>,
        storage: StorageSet,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let carts = CartStore::new(storage.carts, catalog.clone());
        let orders = OrderLedger::new(storage.orders);
        let loyalty = LoyaltyLedger::new(storage.loyalty, config.loyalty.clone());
        let checkout = CheckoutService::new(carts.clone(), orders.clone(), loyalty.clone(), gateway, notifier);
        Self {
            catalog,
            carts,
            orders,
            loyalty,
            checkout,
            tokens: Arc::new(TokenRegistry::from_config(&config.auth)),
            payment: Arc::new(config.payment.clone()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl FromRef<AppState> for Arc<TokenRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// HTTP face of `StorefrontError`.
#[derive(Debug)]
pub struct ApiError(pub StorefrontError);

impl From<StorefrontError> for ApiError {
    fn from(value: StorefrontError) -> Self {
        Self(value)
    }
}

impl From<GenericError> for ApiError {
    fn from(value: GenericError) -> Self {
        Self(StorefrontError::Storage(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StorefrontError::Validation(_) => StatusCode::BAD_REQUEST,
            StorefrontError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorefrontError::Forbidden => StatusCode::FORBIDDEN,
            StorefrontError::Gateway(_) => StatusCode::BAD_GATEWAY,
            StorefrontError::Storage(e) => {
                error!(error = %e, "Storage failure while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self.0 {
            StorefrontError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{} not found", what) }))).into_response()
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .route("/api/services", get(catalog::list_services))
        .route("/api/services/{id}", get(catalog::get_service))
        .route(
            "/api/cart/{cart_key}",
            get(cart::get_cart).delete(cart::clear_cart),
        )
        .route(
            "/api/cart/{cart_key}/items",
            post(cart::add_item)
                .patch(cart::update_item)
                .delete(cart::remove_item),
        )
        .route("/api/checkout", post(payments::start_checkout))
        .route("/api/payments/{session_id}/status", get(payments::payment_status))
        .route("/api/payments/webhook", post(payments::webhook))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/user", get(orders::my_orders))
        .route(
            "/api/orders/{id}",
            get(orders::get_order).put(orders::update_order),
        )
        .route("/api/loyalty/register", post(loyalty::register))
        .route("/api/loyalty/users/{user}", get(loyalty::get_user))
        .route("/api/loyalty/users/{user}/transactions", get(loyalty::transactions))
        .route("/api/loyalty/referrals", post(loyalty::redeem_referral))
        .with_state(state)
}
