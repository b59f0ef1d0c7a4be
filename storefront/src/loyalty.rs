use chrono::Utc;
use common::config::LoyaltyConfig;
use metrics::counter;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::{
    error::{StorefrontError, StorefrontResult},
    model::*,
    storage::LoyaltyStorage,
    validation::normalize_email,
};

const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERRAL_SUFFIX_LEN: usize = 6;
const REFERRAL_CODE_ATTEMPTS: usize = 16;

/// Points earned for a purchase: the amount in major units times the
/// buyer's tier multiplier, rounded to the nearest point.
pub fn purchase_points(tier: Tier, amount: Money) -> i64 {
    (amount.as_major() * tier.purchase_multiplier()).round() as i64
}

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Holds one account lock; the map entry goes away with its last holder.
struct AccountGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: LockMap,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // waiters clone the entry under this same mutex, so a count of one means nobody is queued
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user: LoyaltyUser,
    pub created: bool,
    /// Outcome of the referral code, when one was submitted with a new signup.
    pub referral_applied: Option<bool>,
}

/// Points balances, tiers and referrals.
///
/// Mutations of one account are serialized through a per-key async lock so
/// that a tier read and the credit derived from it cannot interleave with
/// another credit to the same account.
#[derive(Clone)]
pub struct LoyaltyLedger {
    storage: Arc<dyn LoyaltyStorage>,
    config: LoyaltyConfig,
    locks: LockMap,
}

impl LoyaltyLedger {
    pub fn new(storage: Arc<dyn LoyaltyStorage>, config: LoyaltyConfig) -> Self {
        Self {
            storage,
            config,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock(&self, key: String) -> AccountGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.clone()).or_default().clone()
        };
        AccountGuard {
            guard: Some(lock.lock_owned().await),
            key,
            locks: self.locks.clone(),
        }
    }

    fn generate_referral_code(name: &str) -> String {
        let mut prefix: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase();
        while prefix.len() < 3 {
            prefix.push('X');
        }
        let mut rng = rand::rng();
        let suffix: String = (0..REFERRAL_SUFFIX_LEN)
            .map(|_| REFERRAL_ALPHABET[rng.random_range(0..REFERRAL_ALPHABET.len())] as char)
            .collect();
        format!("{}{}", prefix, suffix)
    }

    async fn unique_referral_code(&self, name: &str) -> StorefrontResult<String> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = Self::generate_referral_code(name);
            if !self.storage.referral_code_exists(&code).await? {
                return Ok(code);
            }
            debug!(code, "Referral code collision, retrying");
        }
        Err(StorefrontError::Storage(
            "Could not generate a unique referral code".into(),
        ))
    }

    /// Idempotent per email: an existing account is returned unchanged.
    pub async fn create_user(&self, email: &str, name: &str) -> StorefrontResult<LoyaltyUser> {
        Ok(self.create_user_inner(email, name).await?.0)
    }

    async fn create_user_inner(&self, email: &str, name: &str) -> StorefrontResult<(LoyaltyUser, bool)> {
        let email = normalize_email(email)?;
        let _guard = self.lock(format!("email:{}", email)).await;

        if let Some(existing) = self.storage.get_user_by_email(&email).await? {
            debug!(email, "Loyalty account already exists");
            return Ok((existing, false));
        }

        let bonus = self.config.signup_bonus;
        let user = LoyaltyUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            name: name.trim().to_string(),
            points: bonus,
            tier: calculate_tier(bonus),
            referral_code: self.unique_referral_code(name).await?,
            referrals: 0,
            join_date: Utc::now(),
        };
        let signup = PointsCredit::new(bonus, TransactionType::Signup, "Welcome bonus for joining")
            .to_transaction(&user.id);

        let (user, created) = self.storage.insert_user_if_absent(&user, &signup).await?;
        if created {
            counter!("storefront_points_awarded_total", "type" => "signup").increment(bonus as u64);
            info!(user_id = %user.id, email = %user.email, code = %user.referral_code, "Created loyalty account");
        }
        Ok((user, created))
    }

    /// Signup with an optional referral code applied for new accounts only.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        referral_code: Option<&str>,
    ) -> StorefrontResult<Registration> {
        let (user, created) = self.create_user_inner(email, name).await?;
        let referral_applied = match referral_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) if created => Some(self.process_referral(code, &user.email).await?),
            _ => None,
        };
        Ok(Registration {
            user,
            created,
            referral_applied,
        })
    }

    /// `None` when the user does not exist. A spend may not take the balance
    /// below zero.
    pub async fn add_points(
        &self,
        user_id: &str,
        amount: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> StorefrontResult<Option<LoyaltyUser>> {
        if amount < 0 && transaction_type != TransactionType::Spent {
            return Err(StorefrontError::validation(format!(
                "{} points cannot be negative",
                transaction_type
            )));
        }
        let _guard = self.lock(format!("user:{}", user_id)).await;
        if amount < 0 {
            let Some(user) = self.storage.get_user(user_id).await? else {
                return Ok(None);
            };
            if user.points + amount < 0 {
                return Err(StorefrontError::validation(format!(
                    "Cannot spend {} points with a balance of {}",
                    -amount, user.points
                )));
            }
        }
        let credit = PointsCredit::new(amount, transaction_type, description);
        Ok(self.credit_locked(user_id, &credit).await?)
    }

    async fn credit_locked(&self, user_id: &str, credit: &PointsCredit) -> Result<Option<LoyaltyUser>, GenericError> {
        let Some((user, transaction)) = self.storage.apply_credit(user_id, credit).await? else {
            warn!(user_id, "Points credit for unknown loyalty user");
            return Ok(None);
        };
        if credit.amount > 0 {
            counter!(
                "storefront_points_awarded_total",
                "type" => credit.transaction_type.to_string()
            )
            .increment(credit.amount as u64);
        }
        info!(
            user_id,
            amount = transaction.amount,
            kind = %transaction.transaction_type,
            points = user.points,
            tier = %user.tier,
            "Credited points"
        );
        Ok(Some(user))
    }

    /// `false` for an unknown code or a self-referral; the referrer is untouched then.
    /// Codes match regardless of case.
    pub async fn process_referral(&self, referral_code: &str, new_user_email: &str) -> StorefrontResult<bool> {
        let new_user_email = new_user_email.trim().to_lowercase();
        let referral_code = referral_code.trim().to_ascii_uppercase();
        let Some(referrer) = self
            .storage
            .get_user_by_referral_code(&referral_code)
            .await?
        else {
            info!(referral_code, "Unknown referral code");
            return Ok(false);
        };
        if referrer.email == new_user_email {
            info!(referral_code, "Rejected self-referral");
            return Ok(false);
        }

        let _guard = self.lock(format!("user:{}", referrer.id)).await;
        // tier before this award decides the bonus
        let Some(referrer) = self.storage.get_user(&referrer.id).await? else {
            return Ok(false);
        };
        let bonus = referrer.tier.referral_bonus(self.config.referral_base_bonus);
        let credit = PointsCredit::referral(bonus, format!("Referral bonus for inviting {}", new_user_email));
        Ok(self.credit_locked(&referrer.id, &credit).await?.is_some())
    }

    /// Credits a confirmed purchase, opening an account for the buyer if needed.
    pub async fn award_purchase_points(
        &self,
        email: &str,
        name: &str,
        amount: Money,
        order_id: &OrderId,
    ) -> StorefrontResult<Option<LoyaltyUser>> {
        let user = self.create_user(email, name).await?;
        let _guard = self.lock(format!("user:{}", user.id)).await;
        let Some(user) = self.storage.get_user(&user.id).await? else {
            return Ok(None);
        };
        let points = purchase_points(user.tier, amount);
        if points <= 0 {
            return Ok(Some(user));
        }
        let credit = PointsCredit::new(
            points,
            TransactionType::Earned,
            format!("Points earned on order {}", order_id),
        );
        Ok(self.credit_locked(&user.id, &credit).await?)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        self.storage.get_user(user_id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        self.storage.get_user_by_email(&email.trim().to_lowercase()).await
    }

    pub async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<PointsTransaction>, GenericError> {
        self.storage.transactions_for_user(user_id).await
    }
}
