mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use common::{item, InMemoryStore};
use countdown_api::{
    db::WatchlistStore,
    models::MediaType,
    services::{SessionState, SyncPolicy, WatchlistSession},
};

fn quick_policy() -> SyncPolicy {
    SyncPolicy {
        max_retries: 1,
        retry_base: Duration::from_millis(1),
        revert_on_failure: true,
    }
}

#[tokio::test]
async fn test_save_then_unsave_is_net_noop() {
    let store = Arc::new(InMemoryStore::with_delay(Duration::from_millis(5)));
    let user_id = Uuid::new_v4();
    let session = WatchlistSession::new(store.clone(), quick_policy());
    session.init(user_id).await;

    let severance = item(95396, MediaType::WesternSeries);
    assert!(session.toggle(severance.clone()));
    assert!(!session.toggle(severance));
    session.flush().await;

    assert!(!session.contains(95396));
    assert!(store.remote_ids(user_id).is_empty());
}

#[tokio::test]
async fn test_rapid_toggles_settle_on_final_state() {
    let store = Arc::new(InMemoryStore::with_delay(Duration::from_millis(5)));
    let user_id = Uuid::new_v4();
    let session = WatchlistSession::new(store.clone(), quick_policy());
    session.init(user_id).await;

    let show = item(1396, MediaType::WesternSeries);
    session.toggle(show.clone());
    // Let the first add reach the store before toggling again
    tokio::time::sleep(Duration::from_millis(1)).await;
    session.toggle(show.clone());
    session.toggle(show);
    session.flush().await;

    assert!(session.contains(1396));
    assert_eq!(store.remote_ids(user_id), vec![1396]);
    assert!(session.sync_errors().is_empty());
}

#[tokio::test]
async fn test_toggles_while_syncing_apply_after_list() {
    let store = Arc::new(InMemoryStore::with_delay(Duration::from_millis(20)));
    let user_id = Uuid::new_v4();
    assert!(store.add(user_id, &item(1, MediaType::Movie)).await);

    let session = Arc::new(WatchlistSession::new(store.clone(), quick_policy()));
    let syncing = {
        let session = session.clone();
        tokio::spawn(async move { session.init(user_id).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(session.state(), SessionState::Syncing { user_id });

    assert!(session.toggle(item(2, MediaType::Movie)));
    syncing.await.unwrap();
    session.flush().await;

    assert_eq!(session.state(), SessionState::Ready { user_id });
    assert!(session.contains(1));
    assert!(session.contains(2));
    assert_eq!(store.remote_ids(user_id), vec![1, 2]);
}

#[tokio::test]
async fn test_failed_write_reverts_local_entry() {
    let store = Arc::new(InMemoryStore::default());
    let user_id = Uuid::new_v4();
    let session = WatchlistSession::new(store.clone(), quick_policy());
    session.init(user_id).await;

    store.failing.store(true, Ordering::SeqCst);
    session.toggle(item(7, MediaType::AsianSeries));
    session.flush().await;

    assert!(!session.contains(7));
    assert_eq!(store.adds.load(Ordering::SeqCst), 2);
    assert_eq!(session.sync_errors().len(), 1);
}

#[tokio::test]
async fn test_logout_discards_late_completion() {
    let store = Arc::new(InMemoryStore::with_delay(Duration::from_millis(20)));
    let user_id = Uuid::new_v4();
    let session = WatchlistSession::new(store.clone(), quick_policy());
    session.init(user_id).await;

    session.toggle(item(3, MediaType::Movie));
    tokio::time::sleep(Duration::from_millis(5)).await;
    session.teardown();
    session.flush().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.items().is_empty());
    assert!(session.sync_errors().is_empty());
}

#[tokio::test]
async fn test_sessions_are_isolated_per_user() {
    let store = Arc::new(InMemoryStore::default());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let session = WatchlistSession::new(store.clone(), quick_policy());
    session.init(alice).await;
    session.toggle(item(5, MediaType::Movie));
    session.flush().await;
    session.teardown();

    session.init(bob).await;
    assert!(session.items().is_empty());
    assert_eq!(store.remote_ids(alice), vec![5]);
}
