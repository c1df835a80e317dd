use std::sync::Arc;

use crate::{error::AppResult, services::providers::MetadataProvider};

/// Suggestions returned when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 15;

/// Served when the provider cannot produce a popular list
pub const POPULAR_FALLBACK: [&str; 15] = [
    "The Shawshank Redemption",
    "The Godfather",
    "The Dark Knight",
    "Inception",
    "Pulp Fiction",
    "Interstellar",
    "The Matrix",
    "Forrest Gump",
    "Fight Club",
    "Goodfellas",
    "The Lord of the Rings: The Return of the King",
    "Star Wars: Episode V",
    "Avengers: Endgame",
    "Parasite",
    "Titanic",
];

/// Title suggestions backed by the metadata provider
///
/// Searching is strict: a provider failure is reported to the caller.
/// The popular and trending lists degrade to static titles instead.
#[derive(Clone)]
pub struct TitleSearchService {
    provider: Arc<dyn MetadataProvider>,
}

impl TitleSearchService {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Matches for `query`; blank or `popular` (any case) lists popular titles
    pub async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<String>> {
        let query = query.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("popular") {
            return Ok(self.popular(limit).await);
        }

        let titles = self.provider.search(query).await?.titles(limit);
        tracing::debug!(query = %query, count = titles.len(), "Search suggestions");
        Ok(titles)
    }

    pub async fn popular(&self, limit: usize) -> Vec<String> {
        match self.provider.popular().await {
            Ok(list) => list.titles(limit),
            Err(e) => {
                tracing::warn!(error = %e, "Popular list unavailable, serving static titles");
                static_titles(limit)
            }
        }
    }

    pub async fn trending(&self, limit: usize) -> Vec<String> {
        match self.provider.trending().await {
            Ok(list) => list.titles(limit),
            Err(e) => {
                tracing::warn!(error = %e, "Trending list unavailable, serving popular titles");
                self.popular(limit).await
            }
        }
    }
}

fn static_titles(limit: usize) -> Vec<String> {
    POPULAR_FALLBACK
        .iter()
        .take(limit)
        .map(|title| title.to_string())
        .collect()
}
