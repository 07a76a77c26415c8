//! The merge-on-login protocol

use crate::support::{price, Harness};
use bookstall_cart::error::CartError;
use bookstall_cart::storage::{KeyValueStore, CART_KEY};
use std::sync::atomic::Ordering;

async fn guest_with_lines(h: &Harness, lines: &[(u64, u32, i64)]) {
    for &(id, qty, cents) in lines {
        h.catalog.seed(id, &format!("Book {id}"), price(cents));
        h.cart.add_item(id, qty).await.unwrap();
    }
}

#[tokio::test]
async fn drains_guest_lines_in_insertion_order() {
    let h = Harness::new();
    guest_with_lines(&h, &[(101, 2, 999), (102, 1, 1250)]).await;

    h.auth.login("tok_test").unwrap();
    let migrated = h.cart.sync_on_login().await.unwrap();

    assert_eq!(migrated, 2);
    assert_eq!(*h.api.add_calls.lock().unwrap(), vec![(101, 2), (102, 1)]);
    // Guest cart and its persisted copy are gone
    assert!(h.store.read(CART_KEY).unwrap().is_none());
    // Mirror was loaded from the now-authoritative server cart
    assert_eq!(h.cart.count(), 3);
}

#[tokio::test]
async fn sync_with_empty_guest_cart_is_a_noop() {
    let h = Harness::new();
    h.auth.login("tok_test").unwrap();

    assert_eq!(h.cart.sync_on_login().await.unwrap(), 0);
    assert_eq!(h.cart.sync_on_login().await.unwrap(), 0);
    assert!(h.api.add_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partial_failure_preserves_unmigrated_lines() {
    let h = Harness::new();
    guest_with_lines(&h, &[(11, 1, 100), (12, 2, 200), (13, 1, 300)]).await;

    h.auth.login("tok_test").unwrap();
    *h.api.fail_item.lock().unwrap() = Some(12);

    let err = h.cart.sync_on_login().await.unwrap_err();
    match err {
        CartError::SyncFailed {
            migrated,
            remaining,
            ..
        } => {
            assert_eq!(migrated, 1);
            assert_eq!(remaining, 2);
        }
        other => panic!("expected SyncFailed, got {other:?}"),
    }

    // The guest cart still holds exactly the two unconfirmed lines
    assert_eq!(*h.api.add_calls.lock().unwrap(), vec![(11, 1), (12, 2)]);
    let blob = h.store.read(CART_KEY).unwrap().unwrap();
    assert!(!blob.contains("\"item_id\":11"));
    assert!(blob.contains("\"item_id\":12"));
    assert!(blob.contains("\"item_id\":13"));
}

#[tokio::test]
async fn retry_resumes_from_the_first_unconfirmed_line() {
    let h = Harness::new();
    guest_with_lines(&h, &[(11, 1, 100), (12, 2, 200), (13, 1, 300)]).await;

    h.auth.login("tok_test").unwrap();
    *h.api.fail_item.lock().unwrap() = Some(12);
    h.cart.sync_on_login().await.unwrap_err();

    *h.api.fail_item.lock().unwrap() = None;
    let migrated = h.cart.sync_on_login().await.unwrap();

    assert_eq!(migrated, 2);
    // Item 11 was never re-submitted
    assert_eq!(
        *h.api.add_calls.lock().unwrap(),
        vec![(11, 1), (12, 2), (12, 2), (13, 1)]
    );
    assert!(h.store.read(CART_KEY).unwrap().is_none());
}

#[tokio::test]
async fn persist_failure_mid_sync_surfaces_progress_and_resumes() {
    let (h, flaky) = Harness::with_flaky_store();
    guest_with_lines(&h, &[(11, 1, 100), (12, 2, 200)]).await;

    h.auth.login("tok_test").unwrap();
    flaky.fail_writes.store(true, Ordering::SeqCst);

    let err = h.cart.sync_on_login().await.unwrap_err();
    match err {
        CartError::SyncFailed {
            migrated,
            remaining,
            ..
        } => {
            assert_eq!(migrated, 1);
            assert_eq!(remaining, 1);
        }
        other => panic!("expected SyncFailed, got {other:?}"),
    }

    // The in-memory pending set already dropped the migrated line, so the
    // retry picks up from the first unconfirmed one
    flaky.fail_writes.store(false, Ordering::SeqCst);
    h.cart.sync_on_login().await.unwrap();
    assert_eq!(*h.api.add_calls.lock().unwrap(), vec![(11, 1), (12, 2)]);
}

#[tokio::test]
async fn sync_requires_a_session() {
    let h = Harness::new();
    guest_with_lines(&h, &[(11, 1, 100)]).await;

    assert!(matches!(
        h.cart.sync_on_login().await,
        Err(CartError::NotAuthenticated)
    ));
    // Nothing drained
    assert_eq!(h.cart.count(), 1);
}

#[tokio::test]
async fn auth_transition_triggers_sync_exactly_once() {
    let h = Harness::new();
    guest_with_lines(&h, &[(101, 1, 999)]).await;

    h.auth.login("tok_test").unwrap();
    h.cart.on_auth_change().await.unwrap();
    assert_eq!(h.api.add_calls.lock().unwrap().len(), 1);

    // Same signal again: no new transition, no new adds
    h.cart.on_auth_change().await.unwrap();
    assert_eq!(h.api.add_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn logout_transition_discards_the_mirror() {
    let h = Harness::new();
    h.api.seed_row(1, 11, 2, price(1000));

    h.auth.login("tok_test").unwrap();
    h.cart.on_auth_change().await.unwrap();
    assert_eq!(h.cart.count(), 2);

    h.auth.logout().unwrap();
    h.cart.on_auth_change().await.unwrap();

    assert_eq!(h.cart.count(), 0);
    assert!(h.cart.items().is_empty());
}
