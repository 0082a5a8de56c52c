use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::ContentItem,
    services::{
        feed::{filter_by_category, load_home_feed, trending_feed, Category},
        reconciler::{SessionState, SyncError},
        search::SearchOutcome,
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    /// Search box issuing the query; later queries on it supersede earlier ones
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub session: SessionState,
    pub items: Vec<ContentItem>,
    pub sync_errors: Vec<SyncError>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub saved: bool,
}

// Handlers

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Upcoming movies and airing series, soonest first
pub async fn home_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> Json<Vec<ContentItem>> {
    let feed = load_home_feed(state.catalog.as_ref(), Utc::now()).await;
    Json(filter_by_category(&feed, params.category))
}

pub async fn trending(State(state): State<AppState>) -> Json<Vec<ContentItem>> {
    Json(trending_feed(state.catalog.as_ref(), Utc::now()).await)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchOutcome> {
    Json(state.search.search(&params.channel, &params.q).await)
}

/// Signs a user in and syncs their watchlist from the store
pub async fn start_session(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Json<WatchlistResponse> {
    let session = state.session_or_new(user_id).await;
    session.init(user_id).await;

    Json(WatchlistResponse {
        session: session.state(),
        items: session.items(),
        sync_errors: session.sync_errors(),
    })
}

/// Signs a user out; in-flight writes of the session are discarded
pub async fn end_session(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let session = state.session(user_id).await?;
    session.teardown();
    state.remove_session(user_id).await;

    tracing::info!(%user_id, "Session ended");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_watchlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<WatchlistResponse>> {
    let session = state.session(user_id).await?;

    Ok(Json(WatchlistResponse {
        session: session.state(),
        items: session.items(),
        sync_errors: session.sync_errors(),
    }))
}

pub async fn toggle_watchlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(item): Json<ContentItem>,
) -> AppResult<Json<ToggleResponse>> {
    let session = state.session(user_id).await?;
    let content_id = item.id;
    let saved = session.toggle(item);

    tracing::debug!(%user_id, content_id, saved, "Watchlist toggled");
    Ok(Json(ToggleResponse { saved }))
}
