use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    catalog::CatalogRepository,
    error::{StorefrontError, StorefrontResult},
    model::{CartLineItem, GenericError, LineKey, Money},
    storage::CartStorage,
};

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

fn check_quantity(quantity: u32) -> StorefrontResult<()> {
    if quantity == 0 {
        return Err(StorefrontError::validation("Quantity must be at least 1"));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(StorefrontError::validation(format!(
            "Quantity cannot exceed {}",
            MAX_LINE_QUANTITY
        )));
    }
    Ok(())
}

/// Cart operations over a persisted list of line items, one list per cart key.
///
/// Every mutation is a read-modify-write of the whole list.
#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn CartStorage>,
    catalog: Arc<dyn CatalogRepository>,
}

impl CartStore {
    pub fn new(storage: Arc<dyn CartStorage>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { storage, catalog }
    }

    pub async fn items(&self, cart_key: &str) -> Result<Vec<CartLineItem>, GenericError> {
        self.storage.load_cart(cart_key).await
    }

    /// Merges into the line with the same key, or appends a new line.
    ///
    /// A merge that would push the line past [`MAX_LINE_QUANTITY`] is rejected
    /// and leaves the stored cart unchanged.
    pub async fn add(&self, cart_key: &str, item: CartLineItem) -> StorefrontResult<Vec<CartLineItem>> {
        check_quantity(item.quantity)?;
        let mut items = self.storage.load_cart(cart_key).await?;
        let key = item.key();

        match items.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                let merged = existing.quantity.checked_add(item.quantity).unwrap_or(u32::MAX);
                check_quantity(merged)?;
                existing.quantity = merged;
                existing.recompute_total();
                debug!(cart_key, line = %key, quantity = existing.quantity, "Merged cart line");
            }
            None => {
                debug!(cart_key, line = %key, quantity = item.quantity, "Appended cart line");
                items.push(item);
            }
        }

        self.storage.save_cart(cart_key, &items).await?;
        Ok(items)
    }

    /// Resolves service and variant from the catalog before adding.
    pub async fn add_from_catalog(
        &self,
        cart_key: &str,
        service_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
        social_media_link: Option<String>,
    ) -> StorefrontResult<Vec<CartLineItem>> {
        check_quantity(quantity)?;
        let service = self
            .catalog
            .get_by_id(service_id)
            .ok_or_else(|| StorefrontError::validation(format!("Unknown service: {}", service_id)))?;
        let variant = match variant_id {
            Some(variant_id) => Some(service.variant(variant_id).cloned().ok_or_else(|| {
                StorefrontError::validation(format!(
                    "Variant {} does not belong to service {}",
                    variant_id, service_id
                ))
            })?),
            None => None,
        };

        let item = CartLineItem::new(service.clone(), variant, quantity, social_media_link);
        info!(cart_key, service_id, ?variant_id, quantity, "Adding item to cart");
        self.add(cart_key, item).await
    }

    pub async fn remove(
        &self,
        cart_key: &str,
        service_id: &str,
        variant_id: Option<&str>,
    ) -> Result<Vec<CartLineItem>, GenericError> {
        let key = LineKey::new(service_id, variant_id);
        let mut items = self.storage.load_cart(cart_key).await?;
        let before = items.len();
        items.retain(|item| !item.matches(&key));
        if items.len() != before {
            self.storage.save_cart(cart_key, &items).await?;
            debug!(cart_key, line = %key, "Removed cart line");
        }
        Ok(items)
    }

    /// Unknown lines are ignored.
    pub async fn update_quantity(
        &self,
        cart_key: &str,
        service_id: &str,
        quantity: u32,
        variant_id: Option<&str>,
    ) -> StorefrontResult<Vec<CartLineItem>> {
        check_quantity(quantity)?;
        let key = LineKey::new(service_id, variant_id);
        let mut items = self.storage.load_cart(cart_key).await?;
        if let Some(item) = items.iter_mut().find(|item| item.matches(&key)) {
            item.quantity = quantity;
            item.recompute_total();
            self.storage.save_cart(cart_key, &items).await?;
            debug!(cart_key, line = %key, quantity, "Updated cart quantity");
        }
        Ok(items)
    }

    /// Stores the link as given; format is only checked at checkout.
    pub async fn update_social_link(
        &self,
        cart_key: &str,
        service_id: &str,
        link: &str,
        variant_id: Option<&str>,
    ) -> Result<Vec<CartLineItem>, GenericError> {
        let key = LineKey::new(service_id, variant_id);
        let mut items = self.storage.load_cart(cart_key).await?;
        if let Some(item) = items.iter_mut().find(|item| item.matches(&key)) {
            item.social_media_link = Some(link.to_string());
            self.storage.save_cart(cart_key, &items).await?;
            debug!(cart_key, line = %key, "Updated social link");
        }
        Ok(items)
    }

    pub async fn total(&self, cart_key: &str) -> Result<Money, GenericError> {
        let items = self.storage.load_cart(cart_key).await?;
        Ok(cart_total(&items))
    }

    pub async fn item_count(&self, cart_key: &str) -> Result<u32, GenericError> {
        let items = self.storage.load_cart(cart_key).await?;
        Ok(items.iter().map(|item| item.quantity).sum())
    }

    pub async fn clear(&self, cart_key: &str) -> Result<(), GenericError> {
        self.storage.clear_cart(cart_key).await?;
        info!(cart_key, "Cleared cart");
        Ok(())
    }
}

pub fn cart_total(items: &[CartLineItem]) -> Money {
    items.iter().map(|item| item.total).sum()
}

/// Checkout gate: a non-empty cart whose every line names a destination link.
pub fn validate_for_checkout(items: &[CartLineItem]) -> StorefrontResult<()> {
    if items.is_empty() {
        return Err(StorefrontError::validation("Your cart is empty"));
    }
    if let Some(missing) = items.iter().find(|item| !item.has_social_link()) {
        return Err(StorefrontError::validation(format!(
            "Please provide a social media link for {}",
            missing.title()
        )));
    }
    Ok(())
}
