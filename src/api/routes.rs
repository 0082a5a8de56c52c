use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/feed", get(handlers::home_feed))
        .route("/trending", get(handlers::trending))
        .route("/search", get(handlers::search))
        // Watchlist sessions
        .route(
            "/sessions/:user_id",
            post(handlers::start_session).delete(handlers::end_session),
        )
        .route("/sessions/:user_id/watchlist", get(handlers::get_watchlist))
        .route(
            "/sessions/:user_id/watchlist/toggle",
            post(handlers::toggle_watchlist),
        )
}
