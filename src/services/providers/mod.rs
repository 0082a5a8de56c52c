/// Catalog data provider abstraction
///
/// Providers are pure producers of raw records; normalization happens in
/// [`crate::services::normalizer`]. Callers collapse provider errors to empty
/// lists, so an implementation is free to propagate transport failures.
use crate::{error::AppResult, models::RawRecord};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie/TV catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Movies with an upcoming theatrical release
    async fn upcoming_movies(&self) -> AppResult<Vec<RawRecord>>;

    /// Series currently airing, with next-episode details
    async fn on_the_air_series(&self) -> AppResult<Vec<RawRecord>>;

    /// Popular series from the asian markets, with next-episode details
    async fn asian_series(&self) -> AppResult<Vec<RawRecord>>;

    /// Trending movies and series of the week
    async fn trending(&self) -> AppResult<Vec<RawRecord>>;

    /// Free-text search across movies and series
    async fn search_multi(&self, query: &str) -> AppResult<Vec<RawRecord>>;
}
