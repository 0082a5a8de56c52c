pub mod content;
pub mod tmdb;

pub use content::{ContentItem, MediaKey, MediaType, WatchlistEntry};
pub use tmdb::{NextEpisode, PagedResults, RawRecord};
