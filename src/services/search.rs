use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    models::ContentItem,
    services::{
        feed::{merge_and_sort, or_empty},
        generation::GenerationCounter,
        providers::CatalogProvider,
    },
};

/// Result of one search request on a channel
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub generation: u64,
    /// A newer search on the same channel was issued before this one resolved
    pub superseded: bool,
    pub results: Vec<ContentItem>,
}

/// Catalog search that drops results overtaken by a newer query
///
/// A channel is one logical search box; queries on different channels do not
/// supersede each other.
pub struct SearchService {
    provider: Arc<dyn CatalogProvider>,
    generations: Mutex<GenerationCounter<String>>,
}

impl SearchService {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            generations: Mutex::new(GenerationCounter::new()),
        }
    }

    pub async fn search(&self, channel: &str, query: &str) -> SearchOutcome {
        let generation = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .issue(channel.to_string());

        let results = if query.trim().is_empty() {
            Vec::new()
        } else {
            let raw = or_empty(self.provider.search_multi(query).await, "search_multi");
            merge_and_sort(&[], &raw)
        };

        // Retiring the latest generation drops the channel entry again
        let superseded = !self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retire(&channel.to_string(), generation);

        if superseded {
            tracing::debug!(
                channel = %channel,
                query = %query,
                generation,
                "Discarding superseded search results"
            );
        }

        SearchOutcome {
            query: query.to_string(),
            generation,
            superseded,
            results: if superseded { Vec::new() } else { results },
        }
    }
}
