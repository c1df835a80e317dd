use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::TitleListResponse,
    routes::AppState,
    services::title_search::DEFAULT_LIMIT,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<String>,
}

/// Parses `limit` ourselves so a bad value gets the JSON error body
fn parse_limit(raw: Option<&str>) -> AppResult<usize> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_LIMIT),
        Some(value) => value.parse().map_err(|_| {
            AppError::Validation(format!("Invalid limit '{}': expected a non-negative integer", value))
        }),
    }
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<TitleListResponse>> {
    let limit = parse_limit(params.limit.as_deref())?;
    let titles = state.search.search(&params.q, limit).await?;
    Ok(Json(titles.into()))
}

/// Handler for trending titles endpoint
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<TitleListResponse>> {
    let limit = parse_limit(params.limit.as_deref())?;
    Ok(Json(state.search.trending(limit).await.into()))
}

/// Handler listing every catalog title
pub async fn catalog(State(state): State<Arc<AppState>>) -> AppResult<Json<TitleListResponse>> {
    let model = state.model.as_ref().ok_or(AppError::DataNotLoaded)?;
    let titles: Vec<String> = model.titles().map(str::to_string).collect();
    Ok(Json(titles.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("")).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("5")).unwrap(), 5);
        assert!(matches!(parse_limit(Some("-1")), Err(AppError::Validation(_))));
        assert!(matches!(parse_limit(Some("ten")), Err(AppError::Validation(_))));
    }
}
