use std::sync::Arc;

use axum::http::{header, Method};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countdown_api::{
    api::{create_router, request_id, AppState},
    config::Config,
    db::{self, Cache, CacheWriterHandle, PgWatchlistStore},
    services::TmdbProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "countdown_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(address = %config.bind_address(), "Starting countdown-api");

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let (cache, cache_writer) = match &config.redis_url {
        Some(redis_url) => {
            let client = db::create_redis_client(redis_url)?;
            let (cache, writer) = Cache::new(client);
            tracing::info!("Catalog cache enabled");
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, catalog cache disabled");
            (None, None)
        }
    };

    let catalog = TmdbProvider::new(
        cache,
        config.tmdb_access_token.clone(),
        config.tmdb_api_url.clone(),
        config.catalog_detail_limit,
    );
    let store = PgWatchlistStore::new(pool);

    let state = AppState::new(Arc::new(catalog), Arc::new(store), config.sync_policy());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(request_id::assign_request_id))
            .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
            .layer(cors),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop_cache_writer(cache_writer).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

async fn stop_cache_writer(writer: Option<CacheWriterHandle>) {
    if let Some(writer) = writer {
        writer.shutdown().await;
    }
}
