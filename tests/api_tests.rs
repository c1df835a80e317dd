use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;

use movie_rec_api::{
    db::Cache,
    error::{AppError, AppResult, TransportError},
    models::{ApiCredits, ApiGenre, ApiMovie, ApiMovieList, ApiMovieSummary},
    routes::{create_router, AppState},
    services::{
        details::ImageUrls, providers::MetadataProvider, recommendations::RecommenderSettings,
    },
    similarity::{CatalogEntry, SimilarityModel},
};

/// Provider double: movies above 2000 are unreachable, trending is down and
/// searching for "outage" fails.
struct StubProvider;

fn outage() -> AppError {
    AppError::Transport(TransportError::Exhausted {
        attempts: 3,
        last_status: Some(503),
    })
}

#[async_trait::async_trait]
impl MetadataProvider for StubProvider {
    async fn movie(&self, movie_id: i64) -> AppResult<ApiMovie> {
        if movie_id > 2000 {
            return Err(outage());
        }
        Ok(ApiMovie {
            id: movie_id,
            title: Some(format!("Remote {}", movie_id)),
            poster_path: Some(format!("/{}.jpg", movie_id)),
            overview: Some("Plot".to_string()),
            vote_average: Some(8.1),
            release_date: Some("2010-07-16".to_string()),
            runtime: Some(148),
            genres: vec![ApiGenre {
                name: "Science Fiction".to_string(),
            }],
            ..ApiMovie::default()
        })
    }

    async fn credits(&self, _movie_id: i64) -> AppResult<ApiCredits> {
        Ok(ApiCredits::default())
    }

    async fn popular(&self) -> AppResult<ApiMovieList> {
        Ok(ApiMovieList {
            results: (1..=20)
                .map(|i| ApiMovieSummary {
                    id: i,
                    title: format!("Popular {}", i),
                })
                .collect(),
        })
    }

    async fn search(&self, query: &str) -> AppResult<ApiMovieList> {
        if query == "outage" {
            return Err(outage());
        }
        Ok(ApiMovieList {
            results: vec![ApiMovieSummary {
                id: 27205,
                title: format!("{} (2010)", query),
            }],
        })
    }

    async fn trending(&self) -> AppResult<ApiMovieList> {
        Err(outage())
    }
}

fn model(n: usize) -> SimilarityModel {
    let catalog = (0..n)
        .map(|i| CatalogEntry {
            movie_id: 1000 + i as i64,
            title: format!("Movie {}", i),
        })
        .collect();
    let matrix = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| 1.0 - (i as f32 - j as f32).abs() / n as f32)
                .collect()
        })
        .collect();
    SimilarityModel::new(catalog, matrix).unwrap()
}

fn create_test_server_with(model: Option<SimilarityModel>) -> TestServer {
    let settings = RecommenderSettings {
        batch_pause: std::time::Duration::ZERO,
        ..RecommenderSettings::default()
    };
    let state = AppState::new(
        Arc::new(StubProvider),
        Cache::in_memory(),
        model.map(Arc::new),
        ImageUrls::new("https://image.tmdb.org/t/p"),
        settings,
    );
    TestServer::new(create_router(state)).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with(Some(model(20)))
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_health_reports_missing_model() {
    let server = create_test_server_with(None);
    let body: Value = server.get("/health").await.json();
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_recommendations_then_cache() {
    let server = create_test_server();

    let response = server
        .get("/api/recommendations")
        .add_query_param("movie", "Movie 0")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["from_cache"], false);
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 12);
    assert_eq!(recommendations[0]["id"], 1001);
    assert_eq!(recommendations[0]["title"], "Remote 1001");
    assert_eq!(recommendations[0]["similarity"], 95.0);
    assert_eq!(
        recommendations[0]["poster"],
        "https://image.tmdb.org/t/p/w500/1001.jpg"
    );
    assert_eq!(recommendations[0]["runtime"], 148);

    let again: Value = server
        .get("/api/recommendations")
        .add_query_param("movie", "Movie 0")
        .await
        .json();
    assert_eq!(again["from_cache"], true);
    assert_eq!(again["recommendations"], body["recommendations"]);
}

#[tokio::test]
async fn test_recommendations_validation_and_not_found() {
    let server = create_test_server();

    let response = server.get("/api/recommendations").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No movie selected");

    let response = server
        .get("/api/recommendations")
        .add_query_param("movie", "Movie 404")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Movie not found");
}

#[tokio::test]
async fn test_recommendations_without_model() {
    let server = create_test_server_with(None);

    let response = server
        .get("/api/recommendations")
        .add_query_param("movie", "Movie 0")
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Model data not loaded");
}

#[tokio::test]
async fn test_search_defaults_to_popular() {
    let server = create_test_server();

    let body: Value = server.get("/api/search").await.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 15);
    assert_eq!(body["results"][0], "Popular 1");

    let body: Value = server
        .get("/api/search")
        .add_query_param("q", "popular")
        .add_query_param("limit", "3")
        .await
        .json();
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_search_query_and_errors() {
    let server = create_test_server();

    let body: Value = server
        .get("/api/search")
        .add_query_param("q", "Inception")
        .await
        .json();
    assert_eq!(body["results"][0], "Inception (2010)");

    let response = server
        .get("/api/search")
        .add_query_param("q", "outage")
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    let response = server
        .get("/api/search")
        .add_query_param("limit", "lots")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trending_falls_back_to_popular() {
    let server = create_test_server();

    let body: Value = server
        .get("/api/trending")
        .add_query_param("limit", "2")
        .await
        .json();
    assert_eq!(body["results"], serde_json::json!(["Popular 1", "Popular 2"]));
}

#[tokio::test]
async fn test_catalog_titles() {
    let server = create_test_server_with(Some(model(3)));

    let body: Value = server.get("/api/movies").await.json();
    assert_eq!(body["count"], 3);
    assert_eq!(
        body["results"],
        serde_json::json!(["Movie 0", "Movie 1", "Movie 2"])
    );

    let server = create_test_server_with(None);
    server
        .get("/api/movies")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_movie_details_and_fallback() {
    let server = create_test_server();

    let body: Value = server.get("/api/movie/1005").await.json();
    assert_eq!(body["title"], "Remote 1005");
    assert_eq!(body["release_date"], "2010-07-16");
    assert!(body.get("similarity").is_none());

    let response = server.get("/api/movie/2500").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Unknown Movie");
    assert_eq!(body["rating"], 7.0);
    assert_eq!(body["runtime"], "N/A");

    server
        .get("/api/movie/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/movie/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let server = create_test_server();
    let header = HeaderName::from_static("x-request-id");

    let response = server
        .get("/health")
        .add_header(header.clone(), HeaderValue::from_static("trace-abc-123"))
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc-123");

    let response = server.get("/health").await;
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}
