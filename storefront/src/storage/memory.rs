use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{CartStorage, LoyaltyStorage, OrderStorage};
use crate::model::*;

#[derive(Default)]
struct OrderBook {
    sequence: u64,
    orders: Vec<Order>,
}

#[derive(Default)]
struct LoyaltyBook {
    users: HashMap<String, LoyaltyUser>,
    transactions: Vec<PointsTransaction>,
}

/// Process-local storage for carts, orders and loyalty accounts.
///
/// Each book sits behind its own lock, every trait call is one critical section.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    carts: Arc<Mutex<HashMap<String, CartDocument>>>,
    orders: Arc<Mutex<OrderBook>>,
    loyalty: Arc<Mutex<LoyaltyBook>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn load_cart(&self, cart_key: &str) -> Result<Vec<CartLineItem>, GenericError> {
        let carts = self.carts.lock().await;
        Ok(carts
            .get(cart_key)
            .map(|doc| doc.items.clone())
            .unwrap_or_default())
    }

    async fn save_cart(&self, cart_key: &str, items: &[CartLineItem]) -> Result<(), GenericError> {
        let mut carts = self.carts.lock().await;
        carts.insert(cart_key.to_string(), CartDocument::new(items.to_vec()));
        Ok(())
    }

    async fn clear_cart(&self, cart_key: &str) -> Result<(), GenericError> {
        self.carts.lock().await.remove(cart_key);
        Ok(())
    }
}

#[async_trait]
impl OrderStorage for MemoryStorage {
    async fn next_order_number(&self) -> Result<u64, GenericError> {
        let mut book = self.orders.lock().await;
        book.sequence += 1;
        Ok(book.sequence)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), GenericError> {
        let mut book = self.orders.lock().await;
        if book.orders.iter().any(|o| o.id == order.id) {
            return Err(format!("Order {} already exists", order.id).into());
        }
        book.orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, GenericError> {
        let book = self.orders.lock().await;
        Ok(book.orders.iter().find(|o| &o.id == order_id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, GenericError> {
        Ok(self.orders.lock().await.orders.clone())
    }

    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, GenericError> {
        let book = self.orders.lock().await;
        Ok(book
            .orders
            .iter()
            .filter(|o| o.customer_email == email)
            .cloned()
            .collect())
    }

    async fn attach_session(&self, order_id: &OrderId, session_id: &str) -> Result<Option<Order>, GenericError> {
        let mut book = self.orders.lock().await;
        Ok(book.orders.iter_mut().find(|o| &o.id == order_id).map(|order| {
            order.session_id = Some(session_id.to_string());
            order.clone()
        }))
    }

    async fn find_order_by_session(&self, session_id: &str) -> Result<Option<Order>, GenericError> {
        let book = self.orders.lock().await;
        Ok(book
            .orders
            .iter()
            .find(|o| o.session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        session_id: Option<&str>,
    ) -> Result<Option<StatusChange>, GenericError> {
        let mut book = self.orders.lock().await;
        let Some(order) = book.orders.iter_mut().find(|o| &o.id == order_id) else {
            return Ok(None);
        };
        if let Some(session_id) = session_id {
            order.session_id = Some(session_id.to_string());
        }
        Ok(Some(order.apply_status(status)))
    }
}

#[async_trait]
impl LoyaltyStorage for MemoryStorage {
    async fn insert_user_if_absent(
        &self,
        user: &LoyaltyUser,
        signup: &PointsTransaction,
    ) -> Result<(LoyaltyUser, bool), GenericError> {
        let mut book = self.loyalty.lock().await;
        if let Some(existing) = book.users.values().find(|u| u.email == user.email) {
            return Ok((existing.clone(), false));
        }
        book.users.insert(user.id.clone(), user.clone());
        book.transactions.push(signup.clone());
        Ok((user.clone(), true))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        Ok(self.loyalty.lock().await.users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        let book = self.loyalty.lock().await;
        Ok(book.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        let book = self.loyalty.lock().await;
        Ok(book.users.values().find(|u| u.referral_code == code).cloned())
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool, GenericError> {
        let book = self.loyalty.lock().await;
        Ok(book.users.values().any(|u| u.referral_code == code))
    }

    async fn apply_credit(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<(LoyaltyUser, PointsTransaction)>, GenericError> {
        let mut book = self.loyalty.lock().await;
        let Some(user) = book.users.get_mut(user_id) else {
            return Ok(None);
        };
        user.apply(credit);
        let user = user.clone();
        let transaction = credit.to_transaction(user_id);
        book.transactions.push(transaction.clone());
        Ok(Some((user, transaction)))
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<PointsTransaction>, GenericError> {
        let book = self.loyalty.lock().await;
        Ok(book
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}
