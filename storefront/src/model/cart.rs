use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Money, Service, ServiceVariant};

/// Version of the persisted cart document layout.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// Identity of a cart line: at most one line per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub service_id: String,
    pub variant_id: Option<String>,
}

impl LineKey {
    pub fn new(service_id: impl Into<String>, variant_id: Option<&str>) -> Self {
        Self {
            service_id: service_id.into(),
            variant_id: variant_id.map(str::to_string),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_id, self.variant_id.as_deref().unwrap_or("none"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub service: Service,
    #[serde(default)]
    pub variant: Option<ServiceVariant>,
    pub quantity: u32,
    pub total: Money,
    #[serde(default)]
    pub social_media_link: Option<String>,
}

impl CartLineItem {
    pub fn new(
        service: Service,
        variant: Option<ServiceVariant>,
        quantity: u32,
        social_media_link: Option<String>,
    ) -> Self {
        let mut item = Self {
            service,
            variant,
            quantity,
            total: Money::ZERO,
            social_media_link,
        };
        item.recompute_total();
        item
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.service.id.clone(), self.variant.as_ref().map(|v| v.id.as_str()))
    }

    pub fn matches(&self, key: &LineKey) -> bool {
        self.service.id == key.service_id
            && self.variant.as_ref().map(|v| v.id.as_str()) == key.variant_id.as_deref()
    }

    /// Variant price when a variant is selected, otherwise the service base price.
    pub fn unit_price(&self) -> Money {
        self.variant
            .as_ref()
            .map(|v| v.price)
            .unwrap_or(self.service.price)
    }

    pub fn recompute_total(&mut self) {
        self.total = self.unit_price().times(self.quantity);
    }

    pub fn title(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} - {}", self.service.title, variant.title),
            None => self.service.title.clone(),
        }
    }

    pub fn has_social_link(&self) -> bool {
        self.social_media_link
            .as_deref()
            .is_some_and(|link| !link.trim().is_empty())
    }
}

/// Cart contents as stored under a cart key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartDocument {
    pub schema_version: u32,
    pub items: Vec<CartLineItem>,
}

impl CartDocument {
    pub fn new(items: Vec<CartLineItem>) -> Self {
        Self {
            schema_version: CART_SCHEMA_VERSION,
            items,
        }
    }
}
