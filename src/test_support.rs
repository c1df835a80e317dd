//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::models::{ApiGenre, ApiMovie};
use crate::services::rate_limit::RateBudget;
use crate::services::upstream::RetryPolicy;
use crate::similarity::{CatalogEntry, SimilarityModel};

/// Serves `app` on an ephemeral local port and returns its base URL
pub async fn spawn_fake_provider(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Same attempt budget as production, millisecond backoffs
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        backoff_factor: Duration::from_millis(1),
        timeout_backoff: Duration::from_millis(1),
        connect_backoff: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

pub fn test_budget() -> Arc<RateBudget> {
    Arc::new(RateBudget::per_second(10_000))
}

pub fn api_movie(id: i64, title: &str) -> ApiMovie {
    ApiMovie {
        id,
        title: Some(title.to_string()),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: None,
        overview: Some(format!("Overview of {}", title)),
        vote_average: Some(7.1),
        release_date: Some("2009-12-15".to_string()),
        runtime: Some(120),
        genres: vec![ApiGenre {
            name: "Action".to_string(),
        }],
    }
}

/// Catalog of `n` movies with ids `1000 + i` and titles `Movie i`
///
/// Row `i` scores movie `j` as `1 - |i - j| / n`, so the query movie ranks
/// first and neighbours follow by distance.
pub fn linear_model(n: usize) -> SimilarityModel {
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
