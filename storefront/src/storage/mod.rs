use async_trait::async_trait;

use crate::model::*;

pub mod memory;

pub use memory::MemoryStorage;

#[async_trait]
pub trait CartStorage: Send + Sync {
    /// An unknown key is an empty cart.
    async fn load_cart(&self, cart_key: &str) -> Result<Vec<CartLineItem>, GenericError>;

    async fn save_cart(&self, cart_key: &str, items: &[CartLineItem]) -> Result<(), GenericError>;

    async fn clear_cart(&self, cart_key: &str) -> Result<(), GenericError>;
}

#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Next value of the order sequence, starting at 1.
    async fn next_order_number(&self) -> Result<u64, GenericError>;

    async fn insert_order(&self, order: &Order) -> Result<(), GenericError>;

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, GenericError>;

    async fn list_orders(&self) -> Result<Vec<Order>, GenericError>;

    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, GenericError>;

    /// Records the gateway session without touching the status.
    async fn attach_session(&self, order_id: &OrderId, session_id: &str) -> Result<Option<Order>, GenericError>;

    async fn find_order_by_session(&self, session_id: &str) -> Result<Option<Order>, GenericError>;

    /// Sets status (and session id when given) in one atomic step, returning
    /// the status it replaced. `None` when the order does not exist.
    async fn transition_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        session_id: Option<&str>,
    ) -> Result<Option<StatusChange>, GenericError>;
}

#[async_trait]
pub trait LoyaltyStorage: Send + Sync {
    /// Inserts `user` with its signup transaction unless the email is taken.
    /// Returns the stored record and whether it was created by this call.
    async fn insert_user_if_absent(
        &self,
        user: &LoyaltyUser,
        signup: &PointsTransaction,
    ) -> Result<(LoyaltyUser, bool), GenericError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<LoyaltyUser>, GenericError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<LoyaltyUser>, GenericError>;

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyUser>, GenericError>;

    async fn referral_code_exists(&self, code: &str) -> Result<bool, GenericError>;

    /// Increments the balance, recomputes the tier from the stored balance and
    /// appends the transaction, all or nothing.
    async fn apply_credit(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<(LoyaltyUser, PointsTransaction)>, GenericError>;

    /// Newest first.
    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<PointsTransaction>, GenericError>;
}
