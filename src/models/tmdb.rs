use serde::{Deserialize, Serialize};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw movie or series record as returned by the catalog
///
/// Every field except `id` is optional: list, search and detail endpoints each
/// return a different subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: i64,
    /// Present on movies only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Present on series (and people in multi-search)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    /// Only set by multi-search: "movie", "tv" or "person"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_episode_to_air: Option<NextEpisode>,
}

/// Next scheduled episode of a series (detail endpoint only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NextEpisode {
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Envelope shared by all paged list endpoints
#[derive(Debug, Deserialize)]
pub struct PagedResults {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl RawRecord {
    /// Treats empty strings the way the catalog means them: absent
    pub(crate) fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_person(&self) -> bool {
        self.media_type.as_deref() == Some("person")
    }

    /// Whether multi-search or list context marks this as a series
    pub fn looks_like_series(&self) -> bool {
        match self.media_type.as_deref() {
            Some(kind) => kind == "tv",
            None => Self::field(&self.name).is_some(),
        }
    }
}
