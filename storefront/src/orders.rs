use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    model::{CartLineItem, GenericError, Order, OrderId, PaymentStatus, StatusChange},
    storage::OrderStorage,
};

/// Creates orders from cart snapshots and tracks their payment status.
#[derive(Clone)]
pub struct OrderLedger {
    storage: Arc<dyn OrderStorage>,
}

impl OrderLedger {
    pub fn new(storage: Arc<dyn OrderStorage>) -> Self {
        Self { storage }
    }

    /// An empty item list is accepted and yields a zero total.
    pub async fn create_order(
        &self,
        items: &[CartLineItem],
        customer_name: &str,
        customer_email: &str,
    ) -> Result<Order, GenericError> {
        let number = self.storage.next_order_number().await?;
        let customer_email = customer_email.trim().to_lowercase();
        let order = Order::new(OrderId::from_sequence(number), items, customer_name.trim(), &customer_email);
        self.storage.insert_order(&order).await?;

        counter!("storefront_orders_created_total").increment(1);
        info!(
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "Created order"
        );
        Ok(order)
    }

    /// `None` when no such order exists.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        session_id: Option<&str>,
    ) -> Result<Option<Order>, GenericError> {
        Ok(self
            .transition_status(order_id, status, session_id)
            .await?
            .map(|change| change.order))
    }

    /// Like `update_status`, keeping the replaced status so callers can act
    /// only on the first transition.
    pub async fn transition_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        session_id: Option<&str>,
    ) -> Result<Option<StatusChange>, GenericError> {
        let change = self.storage.transition_status(order_id, status, session_id).await?;
        match &change {
            Some(change) if change.changed() => info!(
                order_id = %order_id,
                from = %change.previous,
                to = %status,
                "Order status changed"
            ),
            Some(_) => info!(order_id = %order_id, status = %status, "Order status unchanged"),
            None => warn!(order_id = %order_id, "Status update for unknown order"),
        }
        Ok(change)
    }

    pub async fn attach_session(&self, order_id: &OrderId, session_id: &str) -> Result<Option<Order>, GenericError> {
        let order = self.storage.attach_session(order_id, session_id).await?;
        if order.is_some() {
            info!(order_id = %order_id, session_id, "Attached payment session");
        }
        Ok(order)
    }

    pub async fn get_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, GenericError> {
        self.storage.get_order(order_id).await
    }

    pub async fn get_by_customer_email(&self, email: &str) -> Result<Vec<Order>, GenericError> {
        self.storage.list_orders_by_email(&email.trim().to_lowercase()).await
    }

    pub async fn get_by_session(&self, session_id: &str) -> Result<Option<Order>, GenericError> {
        self.storage.find_order_by_session(session_id).await
    }

    pub async fn get_all(&self) -> Result<Vec<Order>, GenericError> {
        self.storage.list_orders().await
    }
}
