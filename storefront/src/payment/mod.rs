use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::model::{CartLineItem, GenericError, Money, Order, OrderId, PaymentStatus};

pub mod stripe;
pub mod webhook;

pub use stripe::StripeGateway;

/// One priced line as handed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLineItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    pub social_media_link: Option<String>,
}

impl From<&CartLineItem> for PaymentLineItem {
    fn from(item: &CartLineItem) -> Self {
        Self {
            id: item.key().to_string(),
            name: item.title(),
            quantity: item.quantity,
            price: item.unit_price(),
            social_media_link: item.social_media_link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    pub amount: Money,
    pub items: Vec<PaymentLineItem>,
    pub email: String,
    pub full_name: String,
    pub order_id: Option<OrderId>,
}

impl PaymentData {
    pub fn for_order(order: &Order) -> Self {
        Self {
            amount: order.total,
            items: order.items.iter().map(PaymentLineItem::from).collect(),
            email: order.customer_email.clone(),
            full_name: order.customer_name.clone(),
            order_id: Some(order.id.clone()),
        }
    }
}

/// Gateway-independent view of a checkout session's payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionPaymentStatus {
    Succeeded,
    Processing,
    Failed,
}

impl SessionPaymentStatus {
    /// Maps the gateway's vocabulary: `paid`, `unpaid`, anything else fails.
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "paid" => SessionPaymentStatus::Succeeded,
            "unpaid" => SessionPaymentStatus::Processing,
            _ => SessionPaymentStatus::Failed,
        }
    }

    /// Order status this outcome settles to, `None` while still processing.
    pub fn order_status(self) -> Option<PaymentStatus> {
        match self {
            SessionPaymentStatus::Succeeded => Some(PaymentStatus::Completed),
            SessionPaymentStatus::Failed => Some(PaymentStatus::Failed),
            SessionPaymentStatus::Processing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub item_id: String,
    pub link: String,
}

/// Session state read back from the gateway, metadata included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub session_id: String,
    pub status: SessionPaymentStatus,
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the opaque session id. No partial success on error.
    async fn create_checkout_session(&self, payment: &PaymentData) -> Result<String, GenericError>;

    async fn check_payment_status(&self, session_id: &str) -> Result<SessionDetails, GenericError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(SessionPaymentStatus::from_gateway("paid"), SessionPaymentStatus::Succeeded);
        assert_eq!(SessionPaymentStatus::from_gateway("unpaid"), SessionPaymentStatus::Processing);
        assert_eq!(
            SessionPaymentStatus::from_gateway("no_payment_required"),
            SessionPaymentStatus::Failed
        );
        assert_eq!(SessionPaymentStatus::Processing.order_status(), None);
        assert_eq!(
            SessionPaymentStatus::Succeeded.order_status(),
            Some(PaymentStatus::Completed)
        );
    }
}
