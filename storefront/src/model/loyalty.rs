use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Loyalty tier, ordered bronze < silver < gold < platinum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

pub const SILVER_THRESHOLD: i64 = 500;
pub const GOLD_THRESHOLD: i64 = 1000;
pub const PLATINUM_THRESHOLD: i64 = 5000;

impl Tier {
    pub fn for_points(points: i64) -> Tier {
        if points >= PLATINUM_THRESHOLD {
            Tier::Platinum
        } else if points >= GOLD_THRESHOLD {
            Tier::Gold
        } else if points >= SILVER_THRESHOLD {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Bonus credited to a referrer holding this tier.
    pub fn referral_bonus(self, base_bonus: i64) -> i64 {
        match self {
            Tier::Bronze | Tier::Silver => base_bonus,
            Tier::Gold => base_bonus * 2,
            Tier::Platinum => base_bonus * 3,
        }
    }

    pub fn purchase_multiplier(self) -> f64 {
        match self {
            Tier::Bronze => 1.0,
            Tier::Silver => 1.5,
            Tier::Gold => 2.0,
            Tier::Platinum => 3.0,
        }
    }
}

pub fn calculate_tier(points: i64) -> Tier {
    Tier::for_points(points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    Earned,
    /// Reserved, nothing spends points yet.
    Spent,
    Referral,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub points: i64,
    pub tier: Tier,
    pub referral_code: String,
    pub referrals: u32,
    pub join_date: DateTime<Utc>,
}

/// Append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A points award applied atomically by storage: balance increment,
/// tier recompute, ledger append and optional referral count bump.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsCredit {
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub count_referral: bool,
}

impl PointsCredit {
    pub fn new(amount: i64, transaction_type: TransactionType, description: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type,
            description: description.into(),
            count_referral: false,
        }
    }

    pub fn referral(amount: i64, description: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type: TransactionType::Referral,
            description: description.into(),
            count_referral: true,
        }
    }

    pub fn to_transaction(&self, user_id: &str) -> PointsTransaction {
        PointsTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount: self.amount,
            transaction_type: self.transaction_type,
            description: self.description.clone(),
            created_at: Utc::now(),
        }
    }
}

impl LoyaltyUser {
    /// Applies a credit in memory, tier is recomputed from the new balance.
    pub fn apply(&mut self, credit: &PointsCredit) {
        self.points += credit.amount;
        self.tier = Tier::for_points(self.points);
        if credit.count_referral {
            self.referrals += 1;
        }
    }
}
