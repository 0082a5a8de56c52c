use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::WatchlistStore,
    error::{AppError, AppResult},
    services::{CatalogProvider, SearchService, SyncPolicy, WatchlistSession},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub store: Arc<dyn WatchlistStore>,
    pub search: Arc<SearchService>,
    pub sync_policy: SyncPolicy,
    /// One watchlist session per signed-in user
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<WatchlistSession>>>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn WatchlistStore>,
        sync_policy: SyncPolicy,
    ) -> Self {
        Self {
            search: Arc::new(SearchService::new(catalog.clone())),
            catalog,
            store,
            sync_policy,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn session(&self, user_id: Uuid) -> AppResult<Arc<WatchlistSession>> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No session for user {}", user_id)))
    }

    /// Existing session for `user_id`, or a new unauthenticated one
    pub async fn session_or_new(&self, user_id: Uuid) -> Arc<WatchlistSession> {
        self.sessions
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| {
                Arc::new(WatchlistSession::new(self.store.clone(), self.sync_policy))
            })
            .clone()
    }

    pub async fn remove_session(&self, user_id: Uuid) -> Option<Arc<WatchlistSession>> {
        self.sessions.write().await.remove(&user_id)
    }
}
