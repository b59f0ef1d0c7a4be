use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

use super::{CartLineItem, Money};

/// Human-readable order id, `ORD-0042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn from_sequence(number: u64) -> Self {
        Self(format!("ORD-{:04}", number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Snapshot of the cart at checkout time.
    pub items: Vec<CartLineItem>,
    pub total: Money,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Set on the first move to `Completed` and never cleared, so a paid
    /// order is rewarded once even if an admin reopens it.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Copies `items`; later cart mutations never reach the order.
    pub fn new(id: OrderId, items: &[CartLineItem], customer_name: &str, customer_email: &str) -> Self {
        Self {
            id,
            items: items.to_vec(),
            total: items.iter().map(|item| item.total).sum(),
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            session_id: None,
            completed_at: None,
        }
    }

    /// Writes `status`, returning the change for storage backends to persist.
    pub fn apply_status(&mut self, status: PaymentStatus) -> StatusChange {
        let previous = self.payment_status;
        let first_completion = status == PaymentStatus::Completed && self.completed_at.is_none();
        self.payment_status = status;
        if first_completion {
            self.completed_at = Some(Utc::now());
        }
        StatusChange {
            previous,
            first_completion,
            order: self.clone(),
        }
    }
}

/// Result of a status write, carrying the status it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub previous: PaymentStatus,
    first_completion: bool,
    pub order: Order,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.order.payment_status
    }

    /// True only for the write that stamped `completed_at`.
    pub fn is_first_completion(&self) -> bool {
        self.first_completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_format() {
        assert_eq!(OrderId::from_sequence(7).as_str(), "ORD-0007");
        assert_eq!(OrderId::from_sequence(1234).as_str(), "ORD-1234");
        assert_eq!(OrderId::from_sequence(12345).as_str(), "ORD-12345");
    }

    #[test]
    fn test_reopened_order_completes_only_once() {
        let mut order = Order::new(OrderId::from_sequence(1), &[], "Jean Dupont", "jean@x.com");

        let paid = order.apply_status(PaymentStatus::Completed);
        assert!(paid.is_first_completion());
        let stamp = order.completed_at;
        assert!(stamp.is_some());

        let reopened = order.apply_status(PaymentStatus::Pending);
        assert!(reopened.changed());
        assert!(!reopened.is_first_completion());

        let repaid = order.apply_status(PaymentStatus::Completed);
        assert!(repaid.changed());
        assert!(!repaid.is_first_completion());
        assert_eq!(order.completed_at, stamp);
    }

    #[test]
    fn test_payment_status_round_trips_through_strings() {
        assert_eq!(PaymentStatus::Completed.to_string(), "completed");
        assert_eq!("failed".parse::<PaymentStatus>().unwrap(), PaymentStatus::Failed);
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}
