use std::collections::HashMap;

use crate::model::{Platform, Service, ServiceCategory, ServiceVariant};

/// Read-only access to the service catalog.
pub trait CatalogRepository: Send + Sync {
    fn get_by_id(&self, service_id: &str) -> Option<&Service>;

    fn list_all(&self) -> Vec<&Service>;

    fn list_by_category(&self, category: ServiceCategory) -> Vec<&Service> {
        self.list_all()
            .into_iter()
            .filter(|s| s.category == category)
            .collect()
    }

    fn list_by_platform(&self, platform: Platform) -> Vec<&Service> {
        self.list_all()
            .into_iter()
            .filter(|s| s.platform == platform)
            .collect()
    }

    fn list_by_platform_and_category(&self, platform: Platform, category: ServiceCategory) -> Vec<&Service> {
        self.list_all()
            .into_iter()
            .filter(|s| s.platform == platform && s.category == category)
            .collect()
    }

    /// Services flagged popular, or offering a popular variant.
    fn list_popular(&self) -> Vec<&Service> {
        self.list_all()
            .into_iter()
            .filter(|s| s.popular || s.has_popular_variant())
            .collect()
    }

    fn find_variant(&self, service_id: &str, variant_id: &str) -> Option<&ServiceVariant> {
        self.get_by_id(service_id).and_then(|s| s.variant(variant_id))
    }
}

/// Optional filters accepted by the listing endpoint.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CatalogFilter {
    pub category: Option<ServiceCategory>,
    pub platform: Option<Platform>,
    #[serde(default)]
    pub popular: Option<bool>,
}

impl CatalogFilter {
    pub fn apply<'a>(&self, catalog: &'a dyn CatalogRepository) -> Vec<&'a Service> {
        let base = match (self.platform, self.category) {
            (Some(p), Some(c)) => catalog.list_by_platform_and_category(p, c),
            (Some(p), None) => catalog.list_by_platform(p),
            (None, Some(c)) => catalog.list_by_category(c),
            (None, None) => catalog.list_all(),
        };
        match self.popular {
            Some(true) => base
                .into_iter()
                .filter(|s| s.popular || s.has_popular_variant())
                .collect(),
            _ => base,
        }
    }
}

/// Catalog held in memory, in insertion order.
pub struct InMemoryCatalog {
    services: Vec<Service>,
    index: HashMap<String, usize>,
}

impl InMemoryCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        let index = services
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Self { services, index }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn get_by_id(&self, service_id: &str) -> Option<&Service> {
        self.index.get(service_id).map(|&i| &self.services[i])
    }

    fn list_all(&self) -> Vec<&Service> {
        self.services.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FulfillmentType, Money};

    fn service(id: &str, platform: Platform, category: ServiceCategory, popular: bool) -> Service {
        Service {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            category,
            platform,
            price: Money::from_cents(500),
            delivery_time: "24h".to_string(),
            features: vec![],
            popular,
            variants: vec![],
        }
    }

    fn catalog() -> InMemoryCatalog {
        let mut likes = service("ig-likes", Platform::Instagram, ServiceCategory::Likes, false);
        likes.variants.push(ServiceVariant {
            id: "500".to_string(),
            title: "500 likes".to_string(),
            description: String::new(),
            fulfillment: FulfillmentType::Instant,
            price: Money::from_cents(799),
            quantity: 500,
            popular: true,
        });
        InMemoryCatalog::new(vec![
            service("ig-followers", Platform::Instagram, ServiceCategory::Followers, true),
            likes,
            service("tt-views", Platform::Tiktok, ServiceCategory::Views, false),
        ])
    }

    #[test]
    fn test_lookup_and_filters() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.get_by_id("tt-views").is_some());
        assert!(catalog.get_by_id("missing").is_none());
        assert_eq!(catalog.list_by_platform(Platform::Instagram).len(), 2);
        assert_eq!(catalog.list_by_category(ServiceCategory::Views).len(), 1);
        assert_eq!(
            catalog
                .list_by_platform_and_category(Platform::Instagram, ServiceCategory::Likes)
                .len(),
            1
        );
    }

    #[test]
    fn test_popular_includes_popular_variants() {
        let catalog = catalog();
        let ids: Vec<&str> = catalog.list_popular().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ig-followers", "ig-likes"]);
    }

    #[test]
    fn test_find_variant_requires_ownership() {
        let catalog = catalog();
        assert!(catalog.find_variant("ig-likes", "500").is_some());
        assert!(catalog.find_variant("ig-followers", "500").is_none());
    }

    #[test]
    fn test_filter_combines_platform_and_popularity() {
        let catalog = catalog();
        let filter = CatalogFilter {
            platform: Some(Platform::Instagram),
            popular: Some(true),
            ..Default::default()
        };
        assert_eq!(filter.apply(&catalog).len(), 2);
    }
}
