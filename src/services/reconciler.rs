/// Session-scoped watchlist reconciler
///
/// Owns the in-memory map of saved items for one signed-in user and keeps
/// the remote store in line with it. Toggles apply locally at once; remote
/// calls run in background settle tasks.
///
/// Settle tasks are driven by desired state: each compares the local map
/// with the last state the store confirmed for that id and issues only the
/// call still needed. Calls for one id are serialized, and a task that a
/// newer toggle of the same id has superseded exits without calling.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{db::WatchlistStore, models::ContentItem, services::generation::GenerationCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Toggles are local only
    Unauthenticated,
    /// Waiting for the initial `list`
    Syncing { user_id: Uuid },
    Ready { user_id: Uuid },
}

/// What happens when a remote write keeps failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub retry_base: Duration,
    /// Revert the local entry to the last confirmed remote state
    pub revert_on_failure: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_base: Duration::from_millis(250),
            revert_on_failure: true,
        }
    }
}

impl SyncPolicy {
    /// Fire-and-forget: a single attempt and the local map is never reverted
    pub fn log_only() -> Self {
        Self {
            max_retries: 0,
            retry_base: Duration::ZERO,
            revert_on_failure: false,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Add,
    Remove,
}

/// A remote write that failed after every retry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncError {
    pub content_id: i64,
    pub operation: SyncOperation,
    pub attempts: u32,
    /// The local entry went back to the remote state
    pub reverted: bool,
    pub failed_at: DateTime<Utc>,
}

struct Saved {
    seq: u64,
    item: ContentItem,
}

struct Inner {
    state: SessionState,
    /// Bumped by `init` and `teardown`; completions from an older epoch are dropped
    epoch: u64,
    saved: HashMap<i64, Saved>,
    /// Last state the store confirmed, per catalog id
    remote: HashMap<i64, ContentItem>,
    /// Desired states toggled while the initial list was in flight
    pending: HashMap<i64, Option<ContentItem>>,
    generations: GenerationCounter<i64>,
    errors: Vec<SyncError>,
    tasks: Vec<JoinHandle<()>>,
    next_seq: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            epoch: 0,
            saved: HashMap::new(),
            remote: HashMap::new(),
            pending: HashMap::new(),
            generations: GenerationCounter::new(),
            errors: Vec::new(),
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    fn reset(&mut self, state: SessionState) -> u64 {
        self.epoch += 1;
        self.state = state;
        self.saved.clear();
        self.remote.clear();
        self.pending.clear();
        self.generations.clear();
        self.errors.clear();
        self.epoch
    }

    fn insert_saved(&mut self, item: ContentItem) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.saved.insert(item.id, Saved { seq, item });
    }

    /// Remote call still needed for `id`, if any
    fn required_call(&self, id: i64) -> Option<Call> {
        match (self.saved.get(&id), self.remote.contains_key(&id)) {
            (Some(saved), false) => Some(Call::Add(saved.item.clone())),
            (None, true) => Some(Call::Remove),
            _ => None,
        }
    }
}

enum Call {
    Add(ContentItem),
    Remove,
}

impl Call {
    fn operation(&self) -> SyncOperation {
        match self {
            Call::Add(_) => SyncOperation::Add,
            Call::Remove => SyncOperation::Remove,
        }
    }
}

struct Shared {
    store: Arc<dyn WatchlistStore>,
    policy: SyncPolicy,
    inner: Mutex<Inner>,
    id_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl Shared {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id_locks(&self) -> MutexGuard<'_, HashMap<i64, Arc<tokio::sync::Mutex<()>>>> {
        self.id_locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id_lock(&self, id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.id_locks().entry(id).or_default().clone()
    }

    /// Drops the lock entry of `id` unless another task holds or waits on it
    fn release_id_lock(&self, id: i64, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.id_locks();
        let unshared = locks
            .get(&id)
            .map(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(entry) == 2)
            .unwrap_or(false);
        if unshared {
            locks.remove(&id);
        }
    }

    /// Whether a settle task for `(id, generation)` may still act
    fn is_current(&self, epoch: u64, id: i64, generation: u64) -> bool {
        let inner = self.inner();
        inner.epoch == epoch && inner.generations.is_latest(&id, generation)
    }

    async fn call(&self, user_id: Uuid, id: i64, call: &Call) -> bool {
        match call {
            Call::Add(item) => self.store.add(user_id, item).await,
            Call::Remove => self.store.remove(user_id, id).await,
        }
    }

    /// Brings the remote entry for `id` in line with the local map
    async fn settle(self: Arc<Self>, user_id: Uuid, id: i64, generation: u64, epoch: u64) {
        let lock = self.id_lock(id);
        {
            let _serialized = lock.lock().await;
            self.settle_serialized(user_id, id, generation, epoch).await;
        }
        self.release_id_lock(id, lock);

        let mut inner = self.inner();
        if inner.epoch == epoch {
            inner.generations.retire(&id, generation);
        }
    }

    async fn settle_serialized(&self, user_id: Uuid, id: i64, generation: u64, epoch: u64) {
        if !self.is_current(epoch, id, generation) {
            tracing::debug!(content_id = id, generation, "Toggle superseded before sync");
            return;
        }

        let Some(call) = self.inner().required_call(id) else {
            tracing::debug!(content_id = id, "Watchlist entry already in sync");
            return;
        };

        let mut attempts = 0;
        loop {
            attempts += 1;

            if self.call(user_id, id, &call).await {
                let mut inner = self.inner();
                if inner.epoch == epoch {
                    match &call {
                        Call::Add(item) => {
                            inner.remote.insert(id, item.clone());
                        }
                        Call::Remove => {
                            inner.remote.remove(&id);
                        }
                    }
                }
                tracing::debug!(content_id = id, attempts, "Watchlist entry synced");
                return;
            }

            if attempts > self.policy.max_retries {
                break;
            }

            let delay = self.policy.backoff(attempts - 1);
            tracing::warn!(
                content_id = id,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Watchlist sync failed, retrying"
            );
            tokio::time::sleep(delay).await;

            // A newer toggle re-settles from fresh state once this task releases the lock
            if !self.is_current(epoch, id, generation) {
                return;
            }
        }

        let mut inner = self.inner();
        if inner.epoch != epoch {
            return;
        }

        let reverted =
            self.policy.revert_on_failure && inner.generations.is_latest(&id, generation);
        if reverted {
            match inner.remote.get(&id).cloned() {
                Some(item) => inner.insert_saved(item),
                None => {
                    inner.saved.remove(&id);
                }
            }
        }

        tracing::error!(
            %user_id,
            content_id = id,
            operation = ?call.operation(),
            attempts,
            reverted,
            "Watchlist sync gave up"
        );

        inner.errors.push(SyncError {
            content_id: id,
            operation: call.operation(),
            attempts,
            reverted,
            failed_at: Utc::now(),
        });
    }
}

/// The watchlist of the signed-in user
pub struct WatchlistSession {
    shared: Arc<Shared>,
}

impl WatchlistSession {
    pub fn new(store: Arc<dyn WatchlistStore>, policy: SyncPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                policy,
                inner: Mutex::new(Inner::new()),
                id_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Signs `user_id` in and replaces the map with the stored watchlist
    ///
    /// Toggles made while the list is in flight win over the listed state and
    /// are synced once it arrives.
    pub async fn init(&self, user_id: Uuid) {
        let epoch = self
            .shared
            .inner()
            .reset(SessionState::Syncing { user_id });

        tracing::info!(%user_id, "Syncing watchlist");
        let entries = self.shared.store.list(user_id).await;

        let mut inner = self.shared.inner();
        if inner.epoch != epoch {
            tracing::debug!(%user_id, "Watchlist sync outlived its session");
            return;
        }

        // Listed newest first; oldest gets the lowest sequence
        for entry in entries.into_iter().rev() {
            inner.remote.insert(entry.content.id, entry.content.clone());
            inner.insert_saved(entry.content);
        }

        let pending: Vec<(i64, Option<ContentItem>)> = inner.pending.drain().collect();
        for (id, desired) in &pending {
            match desired {
                Some(item) => inner.insert_saved(item.clone()),
                None => {
                    inner.saved.remove(id);
                }
            }
        }

        inner.state = SessionState::Ready { user_id };
        tracing::info!(
            %user_id,
            saved = inner.saved.len(),
            pending = pending.len(),
            "Watchlist ready"
        );

        for (id, _) in pending {
            self.spawn_settle(&mut inner, user_id, id);
        }
    }

    /// Signs out; the map is cleared and nothing is sent to the store
    pub fn teardown(&self) {
        let mut inner = self.shared.inner();
        if let SessionState::Syncing { user_id } | SessionState::Ready { user_id } = inner.state {
            tracing::info!(%user_id, "Watchlist session closed");
        }
        inner.reset(SessionState::Unauthenticated);
        drop(inner);

        // Tasks still running keep their own handle on a cleared lock
        self.shared.id_locks().clear();
    }

    /// Flips the saved state of `item` and returns the new state
    pub fn toggle(&self, item: ContentItem) -> bool {
        let id = item.id;
        let mut inner = self.shared.inner();

        let saved = if inner.saved.remove(&id).is_some() {
            false
        } else {
            inner.insert_saved(item.clone());
            true
        };

        match inner.state {
            SessionState::Unauthenticated => {}
            SessionState::Syncing { .. } => {
                inner.pending.insert(id, saved.then_some(item));
            }
            SessionState::Ready { user_id } => {
                self.spawn_settle(&mut inner, user_id, id);
            }
        }

        saved
    }

    fn spawn_settle(&self, inner: &mut Inner, user_id: Uuid, id: i64) {
        let generation = inner.generations.issue(id);
        let epoch = inner.epoch;

        inner.tasks.retain(|task| !task.is_finished());
        inner.tasks.push(tokio::spawn(self.shared.clone().settle(
            user_id, id, generation, epoch,
        )));
    }

    pub fn contains(&self, id: i64) -> bool {
        self.shared.inner().saved.contains_key(&id)
    }

    /// Saved items, most recently saved first
    pub fn items(&self) -> Vec<ContentItem> {
        let inner = self.shared.inner();
        let mut saved: Vec<&Saved> = inner.saved.values().collect();
        saved.sort_by(|a, b| b.seq.cmp(&a.seq));
        saved.into_iter().map(|s| s.item.clone()).collect()
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner().state
    }

    pub fn sync_errors(&self) -> Vec<SyncError> {
        self.shared.inner().errors.clone()
    }

    pub fn clear_sync_errors(&self) {
        self.shared.inner().errors.clear();
    }

    /// Waits for every remote call issued so far
    pub async fn flush(&self) {
        loop {
            let tasks = std::mem::take(&mut self.shared.inner().tasks);
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "Watchlist settle task failed");
                }
            }
        }
    }
}
