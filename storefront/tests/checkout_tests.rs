mod mocks;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use mocks::{checkout_fixture, fill_cart, session_details, MockNotifier, MockPaymentGateway};
use storefront::{
    error::StorefrontError,
    model::{Money, PaymentStatus},
    notify::LogNotifier,
    payment::SessionPaymentStatus,
};

const CART: &str = "cart-jean";

fn log_notifier() -> Arc<LogNotifier> {
    Arc::new(LogNotifier::new("ops@example.com"))
}

#[tokio::test]
async fn test_start_checkout_creates_order_and_clears_cart() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_checkout_session()
        .withf(|payment| {
            payment.order_id.as_ref().map(|id| id.as_str()) == Some("ORD-0001")
                && payment.amount == Money::from_cents(5998)
                && payment.items.len() == 1
        })
        .times(1)
        .returning(|_| Ok("cs_test_1".to_string()));
    let fx = checkout_fixture(gateway, log_notifier());
    fill_cart(&fx.carts, CART).await;

    let started = fx
        .checkout
        .start_checkout(CART, "Jean", "Jean@Example.com")
        .await
        .unwrap();

    assert_eq!(started.session_id, "cs_test_1");
    assert_eq!(started.order.id.as_str(), "ORD-0001");
    assert_eq!(started.order.payment_status, PaymentStatus::Pending);
    assert_eq!(started.order.customer_email, "jean@example.com");
    assert_eq!(started.order.session_id.as_deref(), Some("cs_test_1"));
    assert!(fx.carts.items(CART).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_checkout_validates_before_touching_gateway() {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_create_checkout_session().times(0);
    let fx = checkout_fixture(gateway, log_notifier());

    let empty = fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await;
    assert!(matches!(empty, Err(StorefrontError::Validation(ref m)) if m == "Your cart is empty"));

    fill_cart(&fx.carts, CART).await;
    let bad_email = fx.checkout.start_checkout(CART, "Jean", "jean-at-example").await;
    assert!(matches!(bad_email, Err(StorefrontError::Validation(_))));

    let no_name = fx.checkout.start_checkout(CART, "  ", "jean@example.com").await;
    assert!(matches!(no_name, Err(StorefrontError::Validation(_))));

    fx.carts.add_from_catalog(CART, "tt-likes", None, 1, None).await.unwrap();
    let missing_link = fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await;
    assert!(
        matches!(missing_link, Err(StorefrontError::Validation(ref m)) if m == "Please provide a social media link for TikTok Likes")
    );
    assert!(fx.orders.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gateway_failure_keeps_cart_and_pending_order() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_checkout_session()
        .returning(|_| Err("connection refused".into()));
    let fx = checkout_fixture(gateway, log_notifier());
    fill_cart(&fx.carts, CART).await;

    let result = fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await;

    assert!(matches!(result, Err(StorefrontError::Gateway(_))));
    assert_eq!(fx.carts.items(CART).await.unwrap().len(), 1);
    let orders = fx.orders.get_all().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_confirmation_completes_order_and_awards_points_once() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_checkout_session()
        .returning(|_| Ok("cs_test_1".to_string()));
    gateway
        .expect_check_payment_status()
        .returning(|id| Ok(session_details(id, SessionPaymentStatus::Succeeded, Some("ORD-0001"))));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut notifier = MockNotifier::new();
    notifier.expect_order_confirmed().times(1).returning(move |order| {
        let _ = tx.send(order.id.clone());
        Ok(())
    });

    let fx = checkout_fixture(gateway, Arc::new(notifier));
    fill_cart(&fx.carts, CART).await;
    fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await.unwrap();

    let confirmation = fx.checkout.confirm_session("cs_test_1").await.unwrap();
    assert_eq!(confirmation.status, SessionPaymentStatus::Succeeded);
    let order = confirmation.order.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);

    // polling again must not credit twice
    fx.checkout.confirm_session("cs_test_1").await.unwrap();

    let user = fx.loyalty.get_user_by_email("jean@example.com").await.unwrap().unwrap();
    assert_eq!(user.points, 100 + 60);
    assert_eq!(fx.loyalty.transactions_for_user(&user.id).await.unwrap().len(), 2);

    let notified = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(notified.unwrap().as_str(), "ORD-0001");
}

#[tokio::test]
async fn test_reopened_order_is_not_rewarded_again() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_checkout_session()
        .returning(|_| Ok("cs_test_1".to_string()));
    gateway
        .expect_check_payment_status()
        .returning(|id| Ok(session_details(id, SessionPaymentStatus::Succeeded, Some("ORD-0001"))));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut notifier = MockNotifier::new();
    notifier.expect_order_confirmed().returning(move |order| {
        let _ = tx.send(order.id.clone());
        Ok(())
    });

    let fx = checkout_fixture(gateway, Arc::new(notifier));
    fill_cart(&fx.carts, CART).await;
    let started = fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await.unwrap();

    let first = fx.checkout.confirm_session("cs_test_1").await.unwrap().order.unwrap();
    let completed_at = first.completed_at;
    assert!(completed_at.is_some());

    let reopened = fx
        .orders
        .update_status(&started.order.id, PaymentStatus::Pending, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.payment_status, PaymentStatus::Pending);

    let again = fx.checkout.confirm_session("cs_test_1").await.unwrap().order.unwrap();
    assert_eq!(again.payment_status, PaymentStatus::Completed);
    assert_eq!(again.completed_at, completed_at);

    let user = fx.loyalty.get_user_by_email("jean@example.com").await.unwrap().unwrap();
    assert_eq!(user.points, 100 + 60);
    assert_eq!(fx.loyalty.transactions_for_user(&user.id).await.unwrap().len(), 2);

    let notified = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(notified.unwrap().as_str(), "ORD-0001");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_and_processing_outcomes() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_checkout_session()
        .returning(|_| Ok("cs_test_1".to_string()));
    let polls = AtomicUsize::new(0);
    gateway.expect_check_payment_status().times(2).returning(move |id| {
        let status = match polls.fetch_add(1, Ordering::SeqCst) {
            0 => SessionPaymentStatus::Processing,
            _ => SessionPaymentStatus::Failed,
        };
        Ok(session_details(id, status, None))
    });

    let fx = checkout_fixture(gateway, log_notifier());
    fill_cart(&fx.carts, CART).await;
    fx.checkout.start_checkout(CART, "Jean", "jean@example.com").await.unwrap();

    // order resolved through the stored session id
    let processing = fx.checkout.confirm_session("cs_test_1").await.unwrap();
    assert_eq!(processing.order.unwrap().payment_status, PaymentStatus::Pending);

    let failed = fx.checkout.confirm_session("cs_test_1").await.unwrap();
    assert_eq!(failed.order.unwrap().payment_status, PaymentStatus::Failed);
    assert!(fx.loyalty.get_user_by_email("jean@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_status_check_failure_is_a_gateway_error() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_check_payment_status()
        .returning(|_| Err("timeout".into()));
    let fx = checkout_fixture(gateway, log_notifier());

    let result = fx.checkout.confirm_session("cs_unknown").await;
    assert!(matches!(result, Err(StorefrontError::Gateway(_))));
}

#[tokio::test]
async fn test_unknown_session_yields_no_order() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_check_payment_status()
        .returning(|id| Ok(session_details(id, SessionPaymentStatus::Succeeded, None)));
    let fx = checkout_fixture(gateway, log_notifier());

    let confirmation = fx.checkout.confirm_session("cs_orphan").await.unwrap();
    assert!(confirmation.order.is_none());
}
