//! Authenticated cart behavior: mirror, optimistic mutation, rollback

use crate::support::{price, Harness};
use bookstall_cart::error::CartError;
use std::sync::atomic::Ordering;

fn logged_in() -> Harness {
    let h = Harness::new();
    h.auth.login("tok_test").unwrap();
    h
}

#[tokio::test]
async fn load_replaces_the_mirror() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));

    h.cart.load().await.unwrap();

    assert_eq!(h.cart.count(), 2);
    assert_eq!(h.cart.total(), price(2000));
    assert_eq!(h.cart.items()[0].line_id, 1);
}

#[tokio::test]
async fn missing_server_cart_reads_as_empty() {
    let h = logged_in();
    h.api.missing_cart.store(true, Ordering::SeqCst);

    h.cart.load().await.unwrap();

    assert_eq!(h.cart.count(), 0);
    assert!(h.cart.items().is_empty());
}

#[tokio::test]
async fn expired_session_on_load_is_an_error_not_an_empty_cart() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));
    h.cart.load().await.unwrap();

    *h.api.show_status.lock().unwrap() = Some(401);

    let err = h.cart.load().await.unwrap_err();
    assert!(matches!(err, CartError::Api { status: 401 }));
    // The mirror keeps its last confirmed state rather than reading empty
    assert_eq!(h.cart.count(), 2);
}

#[tokio::test]
async fn add_refreshes_from_the_server_response() {
    let h = logged_in();
    h.api.prices.lock().unwrap().insert(11, price(1000));
    h.cart.load().await.unwrap();

    h.cart.add_item(11, 2).await.unwrap();

    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    // Row id and price come from the server, not the local placeholder
    assert_eq!(items[0].line_id, 1);
    assert_eq!(items[0].unit_price, price(1000));
}

#[tokio::test]
async fn failed_add_rolls_back_to_the_snapshot() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));
    h.cart.load().await.unwrap();
    let before = h.cart.items();

    h.api.fail_mutations.store(true, Ordering::SeqCst);
    let err = h.cart.add_item(12, 1).await.unwrap_err();

    assert!(matches!(err, CartError::CartMutationFailed { operation: "add", .. }));
    assert_eq!(h.cart.items(), before);
}

#[tokio::test]
async fn failed_remove_restores_the_line() {
    let h = logged_in();
    h.api.seed_row(1, 11, 1, price(1000));
    h.cart.load().await.unwrap();

    h.api.fail_mutations.store(true, Ordering::SeqCst);
    let err = h.cart.remove_item(1).await.unwrap_err();

    assert!(matches!(
        err,
        CartError::CartMutationFailed { operation: "remove", .. }
    ));
    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
}

#[tokio::test]
async fn remove_applies_the_server_state_on_success() {
    let h = logged_in();
    h.api.seed_row(1, 11, 1, price(1000));
    h.api.seed_row(2, 12, 1, price(500));
    h.cart.load().await.unwrap();

    h.cart.remove_item(1).await.unwrap();

    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].line_id, 2);
}

#[tokio::test]
async fn failed_update_keeps_the_last_loaded_state() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));
    h.cart.load().await.unwrap();

    h.api.fail_mutations.store(true, Ordering::SeqCst);
    let err = h.cart.update_quantity(1, 5).await.unwrap_err();

    assert!(matches!(
        err,
        CartError::CartMutationFailed { operation: "update", .. }
    ));
    assert_eq!(h.cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn update_to_zero_removes_the_line() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));
    h.cart.load().await.unwrap();

    h.cart.update_quantity(1, 0).await.unwrap();

    assert!(h.cart.items().is_empty());
    assert!(h.api.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn clear_honors_intent_even_when_the_server_fails() {
    let h = logged_in();
    h.api.seed_row(1, 11, 2, price(1000));
    h.cart.load().await.unwrap();

    h.api.fail_clear.store(true, Ordering::SeqCst);
    h.cart.clear().await.unwrap();

    assert_eq!(h.cart.count(), 0);
    assert!(h.cart.items().is_empty());
}

#[tokio::test]
async fn overlapping_mutations_cannot_clobber_each_other() {
    let h = logged_in();
    h.api.prices.lock().unwrap().insert(12, price(500));
    h.cart.load().await.unwrap();

    // First add stalls inside the server call and is then rejected; the
    // second is issued while the first is still in flight
    let gate = std::sync::Arc::new(tokio::sync::Notify::new());
    *h.api.gate.lock().unwrap() = Some((11, gate.clone()));
    *h.api.fail_item.lock().unwrap() = Some(11);

    let cart = h.cart.clone();
    let failing = tokio::spawn(async move { cart.add_item(11, 1).await });
    let cart = h.cart.clone();
    let succeeding = tokio::spawn(async move { cart.add_item(12, 2).await });

    // Let both calls queue up before releasing the stalled one
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    gate.notify_one();

    let err = failing.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        CartError::CartMutationFailed { operation: "add", .. }
    ));
    succeeding.await.unwrap().unwrap();

    // The rollback restored its own snapshot only; the confirmed add of
    // item 12 survives regardless of completion order
    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, 12);
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
async fn reads_never_mix_guest_and_server_lines() {
    let h = Harness::new();
    h.catalog.seed(101, "Foo", price(999));
    h.cart.add_item(101, 1).await.unwrap();
    h.api.seed_row(1, 11, 2, price(1000));

    // Authenticated: only the mirror is live, and it has not loaded yet
    h.auth.login("tok_test").unwrap();
    assert!(h.cart.items().is_empty());
    assert_eq!(h.cart.count(), 0);

    h.cart.load().await.unwrap();
    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, 11);

    // Back to guest: the local cart is live again, untouched
    h.auth.logout().unwrap();
    let items = h.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, 101);
}
