#![allow(dead_code)]

use async_trait::async_trait;
use common::config::{ApiToken, Config, Role};
use mockall::mock;
use std::sync::Arc;
use storefront::{
    api::{AppState, StorageSet},
    cart::CartStore,
    catalog::{CatalogRepository, InMemoryCatalog},
    checkout::CheckoutService,
    loyalty::LoyaltyLedger,
    model::*,
    notify::{LogNotifier, Notifier},
    orders::OrderLedger,
    payment::{PaymentData, PaymentGateway, SessionDetails, SessionPaymentStatus},
    storage::MemoryStorage,
};

mock! {
    pub PaymentGateway {}

    #[async_trait]
    impl PaymentGateway for PaymentGateway {
        async fn create_checkout_session(&self, payment: &PaymentData) -> Result<String, GenericError>;
        async fn check_payment_status(&self, session_id: &str) -> Result<SessionDetails, GenericError>;
    }
}

mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn order_confirmed(&self, order: &Order) -> Result<(), GenericError>;
    }
}

pub const ADMIN_TOKEN: &str = "admin-token";
pub const CUSTOMER_TOKEN: &str = "jean-token";
pub const CUSTOMER_EMAIL: &str = "jean@example.com";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn instagram_followers() -> Service {
    Service {
        id: "ig-followers".to_string(),
        title: "Instagram Followers".to_string(),
        description: "Grow your Instagram audience".to_string(),
        category: ServiceCategory::Followers,
        platform: Platform::Instagram,
        price: Money::from_cents(999),
        delivery_time: "24-48 hours".to_string(),
        features: vec!["Real profiles".to_string()],
        popular: true,
        variants: vec![
            ServiceVariant {
                id: "ig-followers-1000".to_string(),
                title: "1000 Followers".to_string(),
                description: "Starter pack".to_string(),
                fulfillment: FulfillmentType::Real,
                price: Money::from_cents(2999),
                quantity: 1000,
                popular: true,
            },
            ServiceVariant {
                id: "ig-followers-5000".to_string(),
                title: "5000 Followers".to_string(),
                description: "Growth pack".to_string(),
                fulfillment: FulfillmentType::Progressive,
                price: Money::from_cents(9999),
                quantity: 5000,
                popular: false,
            },
        ],
    }
}

pub fn tiktok_likes() -> Service {
    Service {
        id: "tt-likes".to_string(),
        title: "TikTok Likes".to_string(),
        description: "Likes on a single video".to_string(),
        category: ServiceCategory::Likes,
        platform: Platform::Tiktok,
        price: Money::from_cents(499),
        delivery_time: "1-2 hours".to_string(),
        features: vec![],
        popular: false,
        variants: vec![],
    }
}

pub fn test_catalog() -> Arc<dyn CatalogRepository> {
    Arc::new(InMemoryCatalog::new(vec![instagram_followers(), tiktok_likes()]))
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.payment.webhook_secret = WEBHOOK_SECRET.to_string();
    config.auth.tokens = vec![
        ApiToken {
            token: ADMIN_TOKEN.to_string(),
            email: "ops@example.com".to_string(),
            role: Role::Admin,
        },
        ApiToken {
            token: CUSTOMER_TOKEN.to_string(),
            email: CUSTOMER_EMAIL.to_string(),
            role: Role::Customer,
        },
    ];
    config
}

pub fn memory_storage_set() -> StorageSet {
    let storage = Arc::new(MemoryStorage::new());
    StorageSet {
        carts: storage.clone(),
        orders: storage.clone(),
        loyalty: storage,
    }
}

pub fn cart_store() -> CartStore {
    CartStore::new(Arc::new(MemoryStorage::new()), test_catalog())
}

pub fn loyalty_ledger() -> LoyaltyLedger {
    LoyaltyLedger::new(Arc::new(MemoryStorage::new()), Default::default())
}

/// Ledgers sharing one in-memory store, wired into a checkout service.
pub struct CheckoutFixture {
    pub carts: CartStore,
    pub orders: OrderLedger,
    pub loyalty: LoyaltyLedger,
    pub checkout: CheckoutService,
}

pub fn checkout_fixture(gateway: MockPaymentGateway, notifier: Arc<dyn Notifier>) -> CheckoutFixture {
    let storage = Arc::new(MemoryStorage::new());
    let carts = CartStore::new(storage.clone(), test_catalog());
    let orders = OrderLedger::new(storage.clone());
    let loyalty = LoyaltyLedger::new(storage, Default::default());
    let checkout = CheckoutService::new(
        carts.clone(),
        orders.clone(),
        loyalty.clone(),
        Arc::new(gateway),
        notifier,
    );
    CheckoutFixture {
        carts,
        orders,
        loyalty,
        checkout,
    }
}

pub fn app_state(gateway: MockPaymentGateway) -> AppState {
    AppState::new(
        &test_config(),
        test_catalog(),
        memory_storage_set(),
        Arc::new(gateway),
        Arc::new(LogNotifier::new("ops@example.com")),
    )
}

pub fn session_details(session_id: &str, status: SessionPaymentStatus, order_id: Option<&str>) -> SessionDetails {
    SessionDetails {
        session_id: session_id.to_string(),
        status,
        order_id: order_id.map(OrderId::from),
        social_links: vec![],
    }
}

/// Fills `cart_key` with two followers packs, both with a destination link.
pub async fn fill_cart(carts: &CartStore, cart_key: &str) {
    carts
        .add_from_catalog(
            cart_key,
            "ig-followers",
            Some("ig-followers-1000"),
            2,
            Some("https://instagram.com/jean".to_string()),
        )
        .await
        .unwrap();
}
