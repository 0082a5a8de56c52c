#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use countdown_api::{
    db::WatchlistStore,
    error::{AppError, AppResult},
    models::{ContentItem, MediaType, NextEpisode, RawRecord, WatchlistEntry},
    services::CatalogProvider,
};

pub fn movie(id: i64, title: &str, release_date: &str) -> RawRecord {
    RawRecord {
        id,
        title: Some(title.to_string()),
        release_date: Some(release_date.to_string()),
        poster_path: Some(format!("/{}.jpg", id)),
        ..Default::default()
    }
}

pub fn series(id: i64, name: &str, language: &str, air_date: &str) -> RawRecord {
    RawRecord {
        id,
        name: Some(name.to_string()),
        original_language: Some(language.to_string()),
        status: Some("Returning Series".to_string()),
        next_episode_to_air: Some(NextEpisode {
            air_date: Some(air_date.to_string()),
            season_number: Some(2),
            episode_number: Some(3),
            name: Some("Next".to_string()),
        }),
        ..Default::default()
    }
}

pub fn item(id: i64, media_type: MediaType) -> ContentItem {
    ContentItem {
        id,
        title: format!("Title {}", id),
        media_type,
        poster_url: format!("https://image.tmdb.org/t/p/w500/{}.jpg", id),
        description: String::new(),
        release_instant: Some(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()),
        episode_label: String::new(),
        episode_title: None,
        is_completed: false,
    }
}

/// Catalog serving fixed lists; `fail` turns every query into an error
#[derive(Default)]
pub struct FakeCatalog {
    pub movies: Vec<RawRecord>,
    pub on_the_air: Vec<RawRecord>,
    pub asian: Vec<RawRecord>,
    pub trending: Vec<RawRecord>,
    pub fail: bool,
}

impl FakeCatalog {
    fn serve(&self, records: &[RawRecord]) -> AppResult<Vec<RawRecord>> {
        if self.fail {
            return Err(AppError::ExternalApi("catalog unavailable".to_string()));
        }
        Ok(records.to_vec())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    async fn upcoming_movies(&self) -> AppResult<Vec<RawRecord>> {
        self.serve(&self.movies)
    }

    async fn on_the_air_series(&self) -> AppResult<Vec<RawRecord>> {
        self.serve(&self.on_the_air)
    }

    async fn asian_series(&self) -> AppResult<Vec<RawRecord>> {
        self.serve(&self.asian)
    }

    async fn trending(&self) -> AppResult<Vec<RawRecord>> {
        self.serve(&self.trending)
    }

    async fn search_multi(&self, query: &str) -> AppResult<Vec<RawRecord>> {
        let query = query.to_lowercase();
        let hits: Vec<RawRecord> = self
            .movies
            .iter()
            .chain(&self.on_the_air)
            .chain(&self.asian)
            .filter(|raw| {
                raw.title
                    .as_deref()
                    .or(raw.name.as_deref())
                    .map(|title| title.to_lowercase().contains(&query))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        self.serve(&hits)
    }
}

#[derive(Default)]
struct Tables {
    next_content_id: i64,
    /// (tmdb_id, media_type) -> (row id, item)
    contents: HashMap<(i64, MediaType), (i64, ContentItem)>,
    /// (user_id, content row id) -> added_at
    watchlist: HashMap<(Uuid, i64), DateTime<Utc>>,
    tick: i64,
}

/// In-memory stand-in for the `contents` and `watchlist` tables
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    pub delay: Option<Duration>,
    pub failing: AtomicBool,
    pub adds: AtomicU32,
}

impl InMemoryStore {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn watchlist_rows(&self, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .unwrap()
            .watchlist
            .keys()
            .filter(|(user, _)| *user == user_id)
            .count()
    }

    pub fn remote_ids(&self, user_id: Uuid) -> Vec<i64> {
        let tables = self.tables.lock().unwrap();
        let mut ids: Vec<i64> = tables
            .contents
            .values()
            .filter(|(row_id, _)| tables.watchlist.contains_key(&(user_id, *row_id)))
            .map(|(_, item)| item.id)
            .collect();
        ids.sort();
        ids
    }

    async fn latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl WatchlistStore for InMemoryStore {
    async fn list(&self, user_id: Uuid) -> Vec<WatchlistEntry> {
        self.latency().await;
        if self.failing.load(Ordering::SeqCst) {
            return Vec::new();
        }

        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<WatchlistEntry> = tables
            .contents
            .values()
            .filter_map(|(row_id, item)| {
                tables
                    .watchlist
                    .get(&(user_id, *row_id))
                    .map(|added_at| WatchlistEntry {
                        content: item.clone(),
                        added_at: *added_at,
                    })
            })
            .collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        entries
    }

    async fn add(&self, user_id: Uuid, item: &ContentItem) -> bool {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.latency().await;
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }

        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;
        let key = (item.id, item.media_type);
        let existing = tables.contents.get(&key).map(|(row_id, _)| *row_id);
        let row_id = match existing {
            Some(row_id) => row_id,
            None => {
                tables.next_content_id += 1;
                tables.next_content_id
            }
        };
        tables.contents.insert(key, (row_id, item.clone()));

        tables.tick += 1;
        let added_at = Utc.timestamp_opt(1_700_000_000 + tables.tick, 0).unwrap();
        tables.watchlist.entry((user_id, row_id)).or_insert(added_at);
        true
    }

    async fn remove(&self, user_id: Uuid, id: i64) -> bool {
        self.latency().await;
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }

        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;
        let row_ids: Vec<i64> = tables
            .contents
            .iter()
            .filter(|((tmdb_id, _), _)| *tmdb_id == id)
            .map(|(_, (row_id, _))| *row_id)
            .collect();

        if row_ids.is_empty() {
            return false;
        }

        for row_id in row_ids {
            tables.watchlist.remove(&(user_id, row_id));
        }
        true
    }
}
