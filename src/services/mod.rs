pub mod feed;
pub mod generation;
pub mod normalizer;
pub mod providers;
pub mod reconciler;
pub mod reminders;
pub mod search;

pub use providers::{CatalogProvider, TmdbProvider};
pub use reconciler::{SessionState, SyncPolicy, WatchlistSession};
pub use search::SearchService;
