pub mod postgres;
pub mod redis;
pub mod watchlist;

pub use postgres::{create_pool, run_migrations, MIGRATOR};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use watchlist::{PgWatchlistStore, WatchlistStore};
