use async_trait::async_trait;
use tracing::info;

use crate::model::{GenericError, Order};

/// Order confirmation fan-out to the operator and the customer.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmed(&self, order: &Order) -> Result<(), GenericError>;
}

/// Writes confirmations to the log instead of sending mail.
pub struct LogNotifier {
    operator_email: String,
}

impl LogNotifier {
    pub fn new(operator_email: impl Into<String>) -> Self {
        Self {
            operator_email: operator_email.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmed(&self, order: &Order) -> Result<(), GenericError> {
        info!(
            recipient = %self.operator_email,
            order_id = %order.id,
            customer = %order.customer_email,
            total = %order.total,
            "New paid order"
        );
        info!(
            recipient = %order.customer_email,
            order_id = %order.id,
            items = order.items.len(),
            "Order confirmation"
        );
        Ok(())
    }
}
