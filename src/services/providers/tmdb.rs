/// The Movie Database (TMDB) v3 provider
///
/// Endpoints used:
/// 1. `/movie/{id}` and `/movie/{id}/credits` for recommendation details
/// 2. `/movie/popular`, `/trending/movie/day` and `/search/movie` for suggestions
use reqwest::{Method, StatusCode};
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{ApiCredits, ApiMovie, ApiMovieList},
    services::{
        providers::MetadataProvider,
        upstream::{UpstreamClient, AUXILIARY_TIMEOUT, PRIMARY_TIMEOUT},
    },
};

#[derive(Clone)]
pub struct TmdbProvider {
    client: UpstreamClient,
    language: String,
}

impl TmdbProvider {
    pub fn new(client: UpstreamClient, language: String) -> Self {
        Self { client, language }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        timeout: Duration,
    ) -> AppResult<T> {
        query.push(("language", self.language.clone()));

        let response = self
            .client
            .request(Method::GET, path, &query, timeout)
            .await?;

        if response.status != StatusCode::OK {
            tracing::warn!(
                path = %path,
                status = response.status.as_u16(),
                provider = "tmdb",
                "Unexpected provider status"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for {}",
                response.status, path
            )));
        }

        response.json()
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn movie(&self, movie_id: i64) -> AppResult<ApiMovie> {
        self.get_json(&format!("/movie/{}", movie_id), vec![], PRIMARY_TIMEOUT)
            .await
    }

    async fn credits(&self, movie_id: i64) -> AppResult<ApiCredits> {
        self.get_json(
            &format!("/movie/{}/credits", movie_id),
            vec![],
            AUXILIARY_TIMEOUT,
        )
        .await
    }

    async fn popular(&self) -> AppResult<ApiMovieList> {
        self.get_json("/movie/popular", vec![("page", "1".to_string())], PRIMARY_TIMEOUT)
            .await
    }

    async fn search(&self, query: &str) -> AppResult<ApiMovieList> {
        let list: ApiMovieList = self
            .get_json(
                "/search/movie",
                vec![
                    ("query", query.to_string()),
                    ("page", "1".to_string()),
                    ("include_adult", "false".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        tracing::info!(
            query = %query,
            results = list.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(list)
    }

    async fn trending(&self) -> AppResult<ApiMovieList> {
        self.get_json("/trending/movie/day", vec![], PRIMARY_TIMEOUT)
            .await
    }
}
