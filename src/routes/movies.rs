use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
    routes::AppState,
};

/// Handler for single movie details
///
/// Never fails for a positive id: an unreachable provider yields the
/// fallback record.
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MovieRecord>> {
    let movie_id = parse_movie_id(&raw_id)?;
    Ok(Json(state.details.fetch_details(movie_id).await))
}

fn parse_movie_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(format!("Invalid movie id '{}'", raw))),
    }
}
