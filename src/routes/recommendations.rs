use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::RecommendationResponse,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub movie: String,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        title = %params.movie,
        "Processing recommendation request"
    );

    let response = state.recommender.recommend(&params.movie).await?;

    tracing::info!(
        request_id = %request_id,
        count = response.recommendations.len(),
        from_cache = response.from_cache,
        "Recommendations served"
    );

    Ok(Json(response))
}
