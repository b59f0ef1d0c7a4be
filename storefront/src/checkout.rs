use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    cart::{validate_for_checkout, CartStore},
    error::{StorefrontError, StorefrontResult},
    loyalty::LoyaltyLedger,
    model::{Order, OrderId},
    notify::Notifier,
    orders::OrderLedger,
    payment::{PaymentData, PaymentGateway, SessionPaymentStatus},
    validation::{normalize_email, require_name},
};

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub order: Order,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub status: SessionPaymentStatus,
    pub order: Option<Order>,
}

/// Cart → order → payment session, and payment outcome → order + loyalty.
#[derive(Clone)]
pub struct CheckoutService {
    carts: CartStore,
    orders: OrderLedger,
    loyalty: LoyaltyLedger,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl CheckoutService {
    pub fn new(
        carts: CartStore,
        orders: OrderLedger,
        loyalty: LoyaltyLedger,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            carts,
            orders,
            loyalty,
            gateway,
            notifier,
        }
    }

    /// On gateway failure the order stays pending and the cart is kept.
    pub async fn start_checkout(
        &self,
        cart_key: &str,
        customer_name: &str,
        customer_email: &str,
    ) -> StorefrontResult<CheckoutStarted> {
        let customer_name = require_name(customer_name)?;
        let customer_email = normalize_email(customer_email)?;
        let items = self.carts.items(cart_key).await?;
        validate_for_checkout(&items)?;

        let order = self
            .orders
            .create_order(&items, customer_name, &customer_email)
            .await?;

        let session_id = match self
            .gateway
            .create_checkout_session(&PaymentData::for_order(&order))
            .await
        {
            Ok(session_id) => session_id,
            Err(e) => {
                error!(error = %e, order_id = %order.id, "Failed to create payment session");
                return Err(StorefrontError::Gateway("session creation failed".to_string()));
            }
        };

        let order = self
            .orders
            .attach_session(&order.id, &session_id)
            .await?
            .unwrap_or(order);
        self.carts.clear(cart_key).await?;

        info!(order_id = %order.id, session_id, "Checkout started");
        Ok(CheckoutStarted { order, session_id })
    }

    /// Poll path: asks the gateway and settles the order accordingly.
    pub async fn confirm_session(&self, session_id: &str) -> StorefrontResult<PaymentConfirmation> {
        let details = self
            .gateway
            .check_payment_status(session_id)
            .await
            .map_err(|e| {
                error!(error = %e, session_id, "Failed to check payment status");
                StorefrontError::Gateway("payment status check failed".to_string())
            })?;

        let order_id = match details.order_id {
            Some(order_id) => Some(order_id),
            None => self.orders.get_by_session(session_id).await?.map(|o| o.id),
        };
        let Some(order_id) = order_id else {
            warn!(session_id, "No order for checkout session");
            return Ok(PaymentConfirmation {
                status: details.status,
                order: None,
            });
        };

        let order = self
            .apply_payment_outcome(&order_id, details.status, session_id)
            .await?;
        Ok(PaymentConfirmation {
            status: details.status,
            order,
        })
    }

    /// Shared by polling and webhooks. Repeating an outcome changes nothing;
    /// points and notifications follow only the first completion.
    pub async fn apply_payment_outcome(
        &self,
        order_id: &OrderId,
        outcome: SessionPaymentStatus,
        session_id: &str,
    ) -> StorefrontResult<Option<Order>> {
        let Some(status) = outcome.order_status() else {
            return Ok(self.orders.get_by_id(order_id).await?);
        };
        let Some(change) = self
            .orders
            .transition_status(order_id, status, Some(session_id))
            .await?
        else {
            return Ok(None);
        };

        if change.changed() {
            counter!("storefront_payment_confirmations_total", "status" => status.to_string()).increment(1);
        }
        if change.is_first_completion() {
            let order = &change.order;
            match self
                .loyalty
                .award_purchase_points(&order.customer_email, &order.customer_name, order.total, &order.id)
                .await
            {
                Ok(_) => {}
                Err(e) => warn!(error = %e, order_id = %order.id, "Failed to award purchase points"),
            }
            self.dispatch_notifications(order.clone());
        }
        Ok(Some(change.order))
    }

    fn dispatch_notifications(&self, order: Order) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.order_confirmed(&order).await {
                warn!(error = %e, order_id = %order.id, "Order notification failed");
            }
        });
    }
}
