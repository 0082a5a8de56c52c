/// TMDB catalog provider
///
/// API Flow:
/// 1. Lists: /movie/upcoming, /tv/on_the_air, /discover/tv, /trending/all/week
/// 2. Series details: /tv/{id} → next_episode_to_air, status, last_air_date
/// 3. Search: /search/multi, series hits enriched with their details
///
/// List endpoints only carry basic series info, so series lists are cut to
/// their first `detail_limit` entries, each re-fetched from the detail endpoint.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{PagedResults, RawRecord},
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde_json::Value;

const LANGUAGE: &str = "en-US";
const ASIAN_DISCOVER_LANGUAGES: &str = "ko|zh|ja|th";
/// Animation, excluded from the asian discover list
const ANIMATION_GENRE_ID: &str = "16";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    cache: Option<Cache>,
    detail_limit: usize,
}

impl TmdbProvider {
    pub fn new(
        cache: Option<Cache>,
        access_token: String,
        api_url: String,
        detail_limit: usize,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            detail_limit,
        }
    }

    /// GET an endpoint and return its JSON body
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Value> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Fetch one page of a list endpoint as untyped records
    async fn fetch_page(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Vec<Value>> {
        let body = self.get_json(path, query).await?;
        let page: PagedResults = serde_json::from_value(body)
            .map_err(|e| AppError::ExternalApi(format!("Invalid TMDB list response: {}", e)))?;
        Ok(page.results)
    }

    async fn series_details(&self, id: i64) -> AppResult<Value> {
        cached!(self.cache.as_ref(), CacheKey::SeriesDetails(id), async move {
            self.get_json(&format!("/tv/{}", id), &[("language", LANGUAGE)])
                .await
        })
    }

    /// Keeps the first `detail_limit` series, each replaced by its detail record
    ///
    /// A failed detail call keeps the list record.
    async fn with_series_details(&self, records: Vec<Value>) -> Vec<Value> {
        let mut tasks = Vec::new();

        for record in records.into_iter().take(self.detail_limit) {
            let provider = self.clone();
            tasks.push(tokio::spawn(async move {
                let Some(id) = record_id(&record) else {
                    return record;
                };
                match provider.series_details(id).await {
                    Ok(details) => details,
                    Err(e) => {
                        tracing::warn!(error = %e, series_id = id, "Series detail fetch failed");
                        record
                    }
                }
            }));
        }

        let mut detailed = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(record) => detailed.push(record),
                Err(e) => tracing::error!(error = %e, "Detail task join error"),
            }
        }
        detailed
    }

    /// Merges series details over each series hit of a search
    async fn enrich_search_hits(&self, hits: Vec<Value>) -> Vec<Value> {
        let mut tasks = Vec::new();

        for hit in hits {
            let provider = self.clone();
            tasks.push(tokio::spawn(async move {
                let is_series = typed(&hit)
                    .map(|raw| raw.looks_like_series())
                    .unwrap_or(false);
                let id = record_id(&hit);
                match (is_series, id) {
                    (true, Some(id)) => match provider.series_details(id).await {
                        Ok(details) => merge_over(hit, details),
                        Err(e) => {
                            tracing::warn!(error = %e, series_id = id, "Search hit enrichment failed");
                            hit
                        }
                    },
                    _ => hit,
                }
            }));
        }

        let mut enriched = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(hit) => enriched.push(hit),
                Err(e) => tracing::error!(error = %e, "Enrichment task join error"),
            }
        }
        enriched
    }
}

fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

fn typed(record: &Value) -> Option<RawRecord> {
    serde_json::from_value(record.clone()).ok()
}

/// Converts untyped records, skipping the ones that do not fit
fn into_records(values: Vec<Value>, source: &str) -> Vec<RawRecord> {
    let total = values.len();
    let records: Vec<RawRecord> = values.iter().filter_map(typed).collect();

    if records.len() < total {
        tracing::debug!(
            source = %source,
            skipped = total - records.len(),
            "Skipped malformed catalog records"
        );
    }

    records
}

/// Shallow object merge, `overlay` fields win
fn merge_over(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (base, _) => base,
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn upcoming_movies(&self) -> AppResult<Vec<RawRecord>> {
        cached!(self.cache.as_ref(), CacheKey::UpcomingMovies, async move {
            let page = self
                .fetch_page("/movie/upcoming", &[("language", LANGUAGE), ("page", "1")])
                .await?;
            let records = into_records(page, "upcoming_movies");

            tracing::info!(results = records.len(), provider = "tmdb", "Upcoming movies fetched");
            Ok::<_, AppError>(records)
        })
    }

    async fn on_the_air_series(&self) -> AppResult<Vec<RawRecord>> {
        cached!(self.cache.as_ref(), CacheKey::OnTheAir, async move {
            let page = self
                .fetch_page(
                    "/tv/on_the_air",
                    &[("language", LANGUAGE), ("page", "1"), ("timezone", "UTC")],
                )
                .await?;
            let records = into_records(self.with_series_details(page).await, "on_the_air");

            tracing::info!(results = records.len(), provider = "tmdb", "On-the-air series fetched");
            Ok::<_, AppError>(records)
        })
    }

    async fn asian_series(&self) -> AppResult<Vec<RawRecord>> {
        cached!(self.cache.as_ref(), CacheKey::AsianSeries, async move {
            let page = self
                .fetch_page(
                    "/discover/tv",
                    &[
                        ("language", LANGUAGE),
                        ("sort_by", "popularity.desc"),
                        ("with_original_language", ASIAN_DISCOVER_LANGUAGES),
                        ("without_genres", ANIMATION_GENRE_ID),
                        ("page", "1"),
                    ],
                )
                .await?;
            let records = into_records(self.with_series_details(page).await, "asian_series");

            tracing::info!(results = records.len(), provider = "tmdb", "Asian series fetched");
            Ok::<_, AppError>(records)
        })
    }

    async fn trending(&self) -> AppResult<Vec<RawRecord>> {
        cached!(self.cache.as_ref(), CacheKey::Trending, async move {
            let page = self
                .fetch_page("/trending/all/week", &[("language", LANGUAGE)])
                .await?;
            let records: Vec<RawRecord> = into_records(page, "trending")
                .into_iter()
                .filter(|raw| !raw.is_person())
                .collect();

            tracing::info!(results = records.len(), provider = "tmdb", "Trending fetched");
            Ok::<_, AppError>(records)
        })
    }

    async fn search_multi(&self, query: &str) -> AppResult<Vec<RawRecord>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::Search(query.to_string()),
            async move {
                let hits = self
                    .fetch_page(
                        "/search/multi",
                        &[
                            ("language", LANGUAGE),
                            ("query", query),
                            ("page", "1"),
                            ("include_adult", "false"),
                        ],
                    )
                    .await?;

                let records: Vec<RawRecord> =
                    into_records(self.enrich_search_hits(hits).await, "search_multi")
                        .into_iter()
                        .filter(|raw| !raw.is_person())
                        .collect();

                tracing::info!(
                    query = %query,
                    results = records.len(),
                    provider = "tmdb",
                    "Search completed"
                );

                Ok::<_, AppError>(records)
            }
        )
    }
}
