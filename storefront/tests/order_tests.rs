mod mocks;

use std::sync::Arc;

use mocks::{cart_store, fill_cart, tiktok_likes};
use storefront::{
    model::{CartLineItem, OrderId, PaymentStatus},
    orders::OrderLedger,
    storage::MemoryStorage,
};

fn ledger() -> OrderLedger {
    OrderLedger::new(Arc::new(MemoryStorage::new()))
}

fn items() -> Vec<CartLineItem> {
    vec![CartLineItem::new(
        tiktok_likes(),
        None,
        3,
        Some("https://tiktok.com/@jean".to_string()),
    )]
}

#[tokio::test]
async fn test_order_ids_follow_the_sequence() {
    let orders = ledger();
    let first = orders.create_order(&items(), "Jean", "jean@example.com").await.unwrap();
    let second = orders.create_order(&items(), "Jean", "jean@example.com").await.unwrap();

    assert_eq!(first.id.as_str(), "ORD-0001");
    assert_eq!(second.id.as_str(), "ORD-0002");
    assert_eq!(first.payment_status, PaymentStatus::Pending);
    assert_eq!(first.total.cents(), 499 * 3);
    assert!(first.session_id.is_none());
}

#[tokio::test]
async fn test_customer_lookup_ignores_email_case() {
    let orders = ledger();
    orders
        .create_order(&items(), "  Jean  ", "  Jean@Example.COM ")
        .await
        .unwrap();
    orders.create_order(&items(), "Ana", "ana@example.com").await.unwrap();

    let mine = orders.get_by_customer_email("JEAN@example.com").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].customer_email, "jean@example.com");
    assert_eq!(mine[0].customer_name, "Jean");
    assert_eq!(orders.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_status_transitions_report_previous_status() {
    let orders = ledger();
    let order = orders.create_order(&items(), "Jean", "jean@example.com").await.unwrap();

    let change = orders
        .transition_status(&order.id, PaymentStatus::Completed, Some("cs_1"))
        .await
        .unwrap()
        .unwrap();
    assert!(change.is_first_completion());
    assert_eq!(change.order.session_id.as_deref(), Some("cs_1"));

    let again = orders
        .transition_status(&order.id, PaymentStatus::Completed, Some("cs_1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!again.changed());
    assert!(!again.is_first_completion());

    assert_eq!(orders.get_by_session("cs_1").await.unwrap().unwrap().id, order.id);
}

#[tokio::test]
async fn test_unknown_order_updates_return_none() {
    let orders = ledger();
    let missing = OrderId::from("ORD-9999");

    assert!(
        orders
            .update_status(&missing, PaymentStatus::Failed, None)
            .await
            .unwrap()
            .is_none()
    );
    assert!(orders.attach_session(&missing, "cs_x").await.unwrap().is_none());
    assert!(orders.get_by_id(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_attach_session_keeps_status() {
    let orders = ledger();
    let order = orders.create_order(&items(), "Jean", "jean@example.com").await.unwrap();
    orders
        .update_status(&order.id, PaymentStatus::Completed, None)
        .await
        .unwrap();

    let attached = orders.attach_session(&order.id, "cs_2").await.unwrap().unwrap();
    assert_eq!(attached.payment_status, PaymentStatus::Completed);
    assert_eq!(attached.session_id.as_deref(), Some("cs_2"));
}

#[tokio::test]
async fn test_cart_changes_after_order_do_not_leak() {
    let carts = cart_store();
    let orders = ledger();
    fill_cart(&carts, "cart-jean").await;

    let items = carts.items("cart-jean").await.unwrap();
    let order = orders.create_order(&items, "Jean", "jean@example.com").await.unwrap();

    carts
        .update_quantity("cart-jean", "ig-followers", 10, Some("ig-followers-1000"))
        .await
        .unwrap();
    carts.clear("cart-jean").await.unwrap();

    let stored = orders.get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 2);
    assert_eq!(stored.total.cents(), 2999 * 2);
}

#[tokio::test]
async fn test_empty_order_is_accepted() {
    let orders = ledger();
    let order = orders.create_order(&[], "Jean", "jean@example.com").await.unwrap();
    assert_eq!(order.total.cents(), 0);
}
