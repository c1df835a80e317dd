use serde::{Deserialize, Deserializer, Serialize};

pub mod movie;

pub use movie::{MovieRecord, Runtime, NOT_AVAILABLE};

/// One ranked neighbour of the query movie, produced per request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityCandidate {
    pub model_index: usize,
    pub movie_id: i64,
    pub score: f32,
}

/// Response body for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: Vec<MovieRecord>,
    pub from_cache: bool,
}

/// Response body for every endpoint that returns a list of titles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleListResponse {
    pub success: bool,
    pub results: Vec<String>,
    pub count: usize,
}

impl From<Vec<String>> for TitleListResponse {
    fn from(results: Vec<String>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// API response from GET /movie/{id}
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<ApiGenre>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiGenre {
    pub name: String,
}

/// API response from GET /movie/{id}/credits
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiCredits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<ApiCastMember>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crew: Vec<ApiCrewMember>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiCastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

impl ApiCredits {
    /// Billing-ordered cast names, at most `limit`
    pub fn top_cast(&self, limit: usize) -> Vec<String> {
        self.cast
            .iter()
            .take(limit)
            .map(|member| member.name.clone())
            .collect()
    }

    pub fn director(&self) -> Option<String> {
        self.crew
            .iter()
            .find(|member| member.job.as_deref() == Some("Director"))
            .map(|member| member.name.clone())
    }
}

/// Paged list response shared by /movie/popular, /search/movie and /trending/movie/day
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiMovieList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ApiMovieSummary>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiMovieSummary {
    pub id: i64,
    pub title: String,
}

impl ApiMovieList {
    /// Titles in provider order, truncated to `limit`
    pub fn titles(self, limit: usize) -> Vec<String> {
        self.results
            .into_iter()
            .take(limit)
            .map(|movie| movie.title)
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
