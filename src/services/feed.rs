use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::{
    error::AppResult,
    models::{ContentItem, MediaType, RawRecord},
    services::{normalizer::normalize, providers::CatalogProvider},
};

/// Home-screen category filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "series-western", alias = "webseries")]
    WesternSeries,
    #[serde(rename = "series-asian", alias = "drama")]
    AsianSeries,
}

impl Category {
    pub fn matches(&self, media_type: MediaType) -> bool {
        match self {
            Category::All => true,
            Category::Movie => media_type == MediaType::Movie,
            Category::WesternSeries => media_type == MediaType::WesternSeries,
            Category::AsianSeries => media_type == MediaType::AsianSeries,
        }
    }
}

/// Normalizes, deduplicates and orders two catalog result lists relative to now
///
/// The ordering depends on the current instant; re-sort on every refresh.
pub fn merge_and_sort(list_a: &[RawRecord], list_b: &[RawRecord]) -> Vec<ContentItem> {
    merge_and_sort_at(list_a, list_b, Utc::now())
}

/// Same as [`merge_and_sort`] with an explicit reference instant
pub fn merge_and_sort_at(
    list_a: &[RawRecord],
    list_b: &[RawRecord],
    now: DateTime<Utc>,
) -> Vec<ContentItem> {
    let normalized = list_a.iter().chain(list_b.iter()).map(normalize);
    let mut items = dedup_last_wins(normalized, |item| item.key());
    sort_by_release(&mut items, now);
    items
}

/// Keeps one element per key: the value last seen, at the position first seen
pub fn dedup_last_wins<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut result: Vec<T> = Vec::new();

    for item in items {
        match positions.get(&key(&item)) {
            Some(&index) => result[index] = item,
            None => {
                positions.insert(key(&item), result.len());
                result.push(item);
            }
        }
    }

    result
}

/// Upcoming items first (soonest first), then everything else (most recent first)
///
/// Stable: ties keep their input order. Items without a release instant are
/// never upcoming and sink below every dated item of the second group.
pub fn sort_by_release(items: &mut [ContentItem], now: DateTime<Utc>) {
    items.sort_by(|a, b| compare_release(a, b, now));
}

fn compare_release(a: &ContentItem, b: &ContentItem, now: DateTime<Utc>) -> Ordering {
    let upcoming = |item: &ContentItem| item.is_upcoming_at(now);

    match (upcoming(a), upcoming(b)) {
        (true, true) => a.release_instant.cmp(&b.release_instant),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // `None` orders below any `Some`, so descending puts undated items last
        (false, false) => b.release_instant.cmp(&a.release_instant),
    }
}

/// Filters a feed by category, preserving its order
pub fn filter_by_category(items: &[ContentItem], category: Category) -> Vec<ContentItem> {
    items
        .iter()
        .filter(|item| category.matches(item.media_type))
        .cloned()
        .collect()
}

/// Builds the home feed from upcoming movies and both series lists
///
/// A failed catalog query contributes an empty list rather than failing the feed.
pub async fn load_home_feed(
    provider: &dyn CatalogProvider,
    now: DateTime<Utc>,
) -> Vec<ContentItem> {
    let (movies, series, asian_series) = tokio::join!(
        provider.upcoming_movies(),
        provider.on_the_air_series(),
        provider.asian_series(),
    );

    let movies = or_empty(movies, "upcoming_movies");
    let series = or_empty(series, "on_the_air_series");
    let asian_series = or_empty(asian_series, "asian_series");

    let combined_series = dedup_last_wins(series.into_iter().chain(asian_series), |raw| raw.id);

    let feed = merge_and_sort_at(&movies, &combined_series, now);

    tracing::info!(
        movies = movies.len(),
        series = combined_series.len(),
        feed = feed.len(),
        "Home feed assembled"
    );

    feed
}

/// Trending titles ordered by the same release policy
pub async fn trending_feed(provider: &dyn CatalogProvider, now: DateTime<Utc>) -> Vec<ContentItem> {
    let trending = or_empty(provider.trending().await, "trending");
    merge_and_sort_at(&[], &trending, now)
}

pub(crate) fn or_empty(result: AppResult<Vec<RawRecord>>, query: &str) -> Vec<RawRecord> {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, query = %query, "Catalog query failed, using empty list");
        Vec::new()
    })
}
