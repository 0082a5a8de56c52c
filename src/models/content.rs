use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Unified media partition used across the app
///
/// Series are split into two partitions by original language. The split is a
/// product rule, not a genre classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "series-western", alias = "webseries")]
    WesternSeries,
    #[serde(rename = "series-asian", alias = "drama")]
    AsianSeries,
}

impl MediaType {
    /// Wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::WesternSeries => "series-western",
            MediaType::AsianSeries => "series-asian",
        }
    }

    pub fn is_series(&self) -> bool {
        !matches!(self, MediaType::Movie)
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "webseries" and "drama" are what older cache rows carry
        match s {
            "movie" => Ok(MediaType::Movie),
            "series-western" | "webseries" => Ok(MediaType::WesternSeries),
            "series-asian" | "drama" => Ok(MediaType::AsianSeries),
            other => Err(AppError::InvalidInput(format!("Unknown media type: {}", other))),
        }
    }
}

/// Natural key of a content record: a movie and a series may share a catalog id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaKey {
    pub id: i64,
    pub media_type: MediaType,
}

/// A movie or series in the unified shape handed to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Catalog primary key, unique within a `media_type` partition
    pub id: i64,
    pub title: String,
    pub media_type: MediaType,
    /// Resolved poster URL, placeholder when the catalog has none
    pub poster_url: String,
    #[serde(default)]
    pub description: String,
    /// Drives "upcoming" vs "live" and feed ordering
    #[serde(default)]
    pub release_instant: Option<DateTime<Utc>>,
    #[serde(default)]
    pub episode_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl ContentItem {
    pub fn key(&self) -> MediaKey {
        MediaKey {
            id: self.id,
            media_type: self.media_type,
        }
    }

    /// Whether the release instant lies strictly after `now`
    ///
    /// Items without a release instant are never upcoming.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.release_instant.map(|at| at > now).unwrap_or(false)
    }
}

/// One saved item on a user's watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub content: ContentItem,
    /// Assigned by the remote store
    pub added_at: DateTime<Utc>,
}
