use std::sync::Arc;

use reqwest::Url;
use tokio::time::{timeout_at, Instant};

use crate::{
    db::{cache::MOVIE_DETAIL_TTL, Cache, CacheKey},
    error::{AppError, AppResult, TransportError},
    models::{
        movie::{clamp_rating, MAX_CAST, MAX_GENRES},
        ApiCredits, ApiMovie, MovieRecord, Runtime, NOT_AVAILABLE,
    },
    services::providers::MetadataProvider,
    similarity::SimilarityModel,
};

const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/500x750";
const UNKNOWN_TITLE: &str = "Unknown";
const UNKNOWN_MOVIE: &str = "Unknown Movie";
const NO_OVERVIEW: &str = "No overview available";
const UNAVAILABLE_OVERVIEW: &str = "Movie information temporarily unavailable";
const FALLBACK_RATING: f64 = 7.0;
const FALLBACK_GENRES: [&str; 2] = ["Drama", "Action"];

/// Builds poster and backdrop URLs on the provider's image CDN
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn poster(&self, path: Option<&str>) -> String {
        match non_empty(path) {
            Some(path) => format!("{}/w500{}", self.base_url, path),
            None => placeholder_poster("No Poster"),
        }
    }

    pub fn backdrop(&self, path: Option<&str>) -> Option<String> {
        non_empty(path).map(|path| format!("{}/original{}", self.base_url, path))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Placeholder image carrying `text`, spaces encoded as `+`
fn placeholder_poster(text: &str) -> String {
    Url::parse_with_params(PLACEHOLDER_POSTER, &[("text", text)])
        .map(String::from)
        .unwrap_or_else(|_| format!("{}?text={}", PLACEHOLDER_POSTER, text.replace(' ', "+")))
}

/// Where a detail record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSource {
    Cache,
    Provider,
    Fallback,
}

/// Fetches full metadata for one movie, degrading to a locally built record
///
/// `fetch_details` never fails: cache problems are misses, provider problems
/// produce a fallback record. Fallback records are not cached so the next
/// request can pick up real data once the provider recovers.
#[derive(Clone)]
pub struct DetailFetcher {
    provider: Arc<dyn MetadataProvider>,
    cache: Cache,
    model: Option<Arc<SimilarityModel>>,
    images: ImageUrls,
}

impl DetailFetcher {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        cache: Cache,
        model: Option<Arc<SimilarityModel>>,
        images: ImageUrls,
    ) -> Self {
        Self {
            provider,
            cache,
            model,
            images,
        }
    }

    pub async fn fetch_details(&self, movie_id: i64) -> MovieRecord {
        self.fetch_with_source(movie_id, None).await.0
    }

    /// Like [`fetch_details`](Self::fetch_details), reporting the source and
    /// giving up on the provider at `deadline`
    pub async fn fetch_with_source(
        &self,
        movie_id: i64,
        deadline: Option<Instant>,
    ) -> (MovieRecord, DetailSource) {
        let key = CacheKey::MovieDetail(movie_id);
        if let Some(record) = self.cache.get_from_cache::<MovieRecord>(&key).await {
            tracing::debug!(movie_id, "Detail cache hit");
            return (record, DetailSource::Cache);
        }

        let remote = self.fetch_remote(movie_id);
        let result = match deadline {
            Some(deadline) => timeout_at(deadline, remote)
                .await
                .unwrap_or_else(|_| Err(AppError::Transport(TransportError::Timeout))),
            None => remote.await,
        };

        match result {
            Ok(record) => {
                self.cache.set_in_cache(&key, &record, MOVIE_DETAIL_TTL).await;
                (record, DetailSource::Provider)
            }
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Detail fetch failed, using fallback");
                (self.fallback(movie_id), DetailSource::Fallback)
            }
        }
    }

    async fn fetch_remote(&self, movie_id: i64) -> AppResult<MovieRecord> {
        let movie = self.provider.movie(movie_id).await?;
        let credits = best_effort(self.provider.credits(movie_id).await, movie_id);
        Ok(self.build_record(movie_id, movie, credits))
    }

    fn build_record(&self, movie_id: i64, movie: ApiMovie, credits: Option<ApiCredits>) -> MovieRecord {
        let (cast, director) = match credits {
            Some(credits) => (
                credits.top_cast(MAX_CAST),
                credits.director().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            None => (Vec::new(), NOT_AVAILABLE.to_string()),
        };

        MovieRecord {
            id: movie_id,
            title: movie.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            poster: self.images.poster(movie.poster_path.as_deref()),
            backdrop: self.images.backdrop(movie.backdrop_path.as_deref()),
            overview: non_empty(movie.overview.as_deref())
                .unwrap_or(NO_OVERVIEW)
                .to_string(),
            rating: clamp_rating(movie.vote_average.unwrap_or(0.0)),
            release_date: non_empty(movie.release_date.as_deref())
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            runtime: Runtime::from_minutes(movie.runtime),
            genres: movie
                .genres
                .into_iter()
                .take(MAX_GENRES)
                .map(|genre| genre.name)
                .collect(),
            cast,
            director,
            similarity: None,
        }
    }

    /// Minimal valid record for when the provider cannot be reached
    pub fn fallback(&self, movie_id: i64) -> MovieRecord {
        let title = self
            .model
            .as_deref()
            .and_then(|model| model.title_for(movie_id))
            .unwrap_or(UNKNOWN_MOVIE)
            .to_string();

        MovieRecord {
            id: movie_id,
            poster: placeholder_poster(&title),
            title,
            backdrop: None,
            overview: UNAVAILABLE_OVERVIEW.to_string(),
            rating: FALLBACK_RATING,
            release_date: NOT_AVAILABLE.to_string(),
            runtime: Runtime::NotAvailable,
            genres: FALLBACK_GENRES.iter().map(|g| g.to_string()).collect(),
            cast: Vec::new(),
            director: NOT_AVAILABLE.to_string(),
            similarity: None,
        }
    }
}

/// Auxiliary lookups may fail without affecting the primary result
fn best_effort<T>(result: AppResult<T>, movie_id: i64) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(movie_id, error = %e, "Auxiliary lookup failed, continuing without it");
            None
        }
    }
}
