/// Movie metadata provider abstraction
///
/// The recommender only needs five read-only lookups from its metadata source.
/// Keeping them behind a trait lets the detail fetcher, the orchestrator and the
/// search service be exercised without a live provider.
use crate::{
    error::AppResult,
    models::{ApiCredits, ApiMovie, ApiMovieList},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Full metadata for one movie (`GET /movie/{id}`)
    async fn movie(&self, movie_id: i64) -> AppResult<ApiMovie>;

    /// Cast and crew for one movie (`GET /movie/{id}/credits`)
    ///
    /// Auxiliary data: implementations should use a shorter timeout.
    async fn credits(&self, movie_id: i64) -> AppResult<ApiCredits>;

    /// First page of currently popular movies
    async fn popular(&self) -> AppResult<ApiMovieList>;

    /// First page of title matches for `query`, adult titles excluded
    async fn search(&self, query: &str) -> AppResult<ApiMovieList>;

    /// Movies trending today
    async fn trending(&self) -> AppResult<ApiMovieList>;
}
