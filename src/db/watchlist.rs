/// Remote watchlist store
///
/// Two tables back a watchlist: `contents` deduplicates catalog records on
/// `(tmdb_id, media_type)` and `watchlist` joins users to content rows.
/// Failures never reach the caller: `list` degrades to empty, `add` and
/// `remove` to `false`.
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ContentItem, MediaType, WatchlistEntry},
    services::normalizer::{at_default_air_time, MOVIE_LABEL, POSTER_PLACEHOLDER_URL},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Saved items, newest first
    async fn list(&self, user_id: Uuid) -> Vec<WatchlistEntry>;

    /// Saves an item; saving an already saved item succeeds
    async fn add(&self, user_id: Uuid, item: &ContentItem) -> bool;

    /// Unsaves every partition carrying catalog id `id`
    async fn remove(&self, user_id: Uuid, id: i64) -> bool;
}

/// Joined `watchlist` + `contents` row
#[derive(Debug, sqlx::FromRow)]
pub struct SavedRow {
    pub tmdb_id: i64,
    pub media_type: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub added_at: DateTime<Utc>,
}

impl SavedRow {
    /// Maps a stored row back to the app shape
    ///
    /// Fields the tables do not keep get neutral values: series labels are
    /// empty and nothing is completed.
    pub fn into_entry(self) -> AppResult<WatchlistEntry> {
        let media_type: MediaType = self.media_type.parse()?;

        let episode_label = if media_type.is_series() {
            String::new()
        } else {
            MOVIE_LABEL.to_string()
        };

        Ok(WatchlistEntry {
            content: ContentItem {
                id: self.tmdb_id,
                title: self.title,
                media_type,
                poster_url: self
                    .poster_path
                    .filter(|url| !url.is_empty())
                    .unwrap_or_else(|| POSTER_PLACEHOLDER_URL.to_string()),
                description: self.overview.unwrap_or_default(),
                release_instant: self.release_date.map(at_default_air_time),
                episode_label,
                episode_title: None,
                is_completed: false,
            },
            added_at: self.added_at,
        })
    }
}

#[derive(Clone)]
pub struct PgWatchlistStore {
    pool: PgPool,
}

impl PgWatchlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_saved(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let rows: Vec<SavedRow> = sqlx::query_as(
            r#"
            SELECT c.tmdb_id, c.media_type, c.title, c.poster_path, c.overview,
                   c.release_date, w.added_at
            FROM watchlist w
            JOIN contents c ON c.id = w.content_id
            WHERE w.user_id = $1
            ORDER BY w.added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let tmdb_id = row.tmdb_id;
            match row.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(error = %e, tmdb_id, "Skipping unreadable watchlist row")
                }
            }
        }

        Ok(entries)
    }

    async fn upsert_content(&self, item: &ContentItem) -> AppResult<i64> {
        let content_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contents (tmdb_id, media_type, title, poster_path, overview, release_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tmdb_id, media_type) DO UPDATE
            SET title = EXCLUDED.title,
                poster_path = EXCLUDED.poster_path,
                overview = EXCLUDED.overview,
                release_date = EXCLUDED.release_date
            RETURNING id
            "#,
        )
        .bind(item.id)
        .bind(item.media_type.as_str())
        .bind(&item.title)
        .bind(&item.poster_url)
        .bind(&item.description)
        .bind(item.release_instant.map(|at| at.date_naive()))
        .fetch_one(&self.pool)
        .await?;

        Ok(content_id)
    }

    async fn save(&self, user_id: Uuid, item: &ContentItem) -> AppResult<()> {
        let content_id = self.upsert_content(item).await?;

        let inserted = sqlx::query("INSERT INTO watchlist (user_id, content_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(content_id)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(e) => {
                let e = AppError::from(e);
                if e.is_unique_violation() {
                    tracing::debug!(%user_id, content_id, "Already on watchlist");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// `Ok(false)` when no content row carries the catalog id
    async fn unsave(&self, user_id: Uuid, id: i64) -> AppResult<bool> {
        let content_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM contents WHERE tmdb_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        if content_ids.is_empty() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND content_id = ANY($2)")
            .bind(user_id)
            .bind(&content_ids)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }
}

#[async_trait::async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn list(&self, user_id: Uuid) -> Vec<WatchlistEntry> {
        match self.fetch_saved(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, %user_id, "Watchlist list failed");
                Vec::new()
            }
        }
    }

    async fn add(&self, user_id: Uuid, item: &ContentItem) -> bool {
        match self.save(user_id, item).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, %user_id, content_id = item.id, "Watchlist add failed");
                false
            }
        }
    }

    async fn remove(&self, user_id: Uuid, id: i64) -> bool {
        match self.unsave(user_id, id).await {
            Ok(removed) => {
                if !removed {
                    tracing::debug!(%user_id, content_id = id, "Nothing cached for id");
                }
                removed
            }
            Err(e) => {
                tracing::error!(error = %e, %user_id, content_id = id, "Watchlist remove failed");
                false
            }
        }
    }
}
