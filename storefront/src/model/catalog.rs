use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceCategory {
    Followers,
    Likes,
    Views,
    Comments,
    Subscribers,
    Shares,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
    Facebook,
    Twitter,
    Spotify,
}

/// How a variant's quantity is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FulfillmentType {
    Real,
    Automated,
    Instant,
    Progressive,
    Targeted,
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceVariant {
    pub id: String,
    pub title: String,
    pub description: String,
    pub fulfillment: FulfillmentType,
    pub price: Money,
    /// Units delivered per package, e.g. 1000 followers.
    pub quantity: u32,
    #[serde(default)]
    pub popular: bool,
}

/// Reference data, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub platform: Platform,
    pub price: Money,
    pub delivery_time: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub variants: Vec<ServiceVariant>,
}

impl Service {
    pub fn variant(&self, variant_id: &str) -> Option<&ServiceVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn has_popular_variant(&self) -> bool {
        self.variants.iter().any(|v| v.popular)
    }
}
