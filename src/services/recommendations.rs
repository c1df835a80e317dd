use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, Instant};

use crate::{
    db::{cache::RECOMMENDATIONS_TTL, Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieRecord, RecommendationResponse, SimilarityCandidate},
    services::details::{DetailFetcher, DetailSource},
    similarity::SimilarityModel,
};

/// Recommendations returned per query, not counting the query movie itself
pub const MAX_RECOMMENDATIONS: usize = 12;

#[derive(Debug, Clone)]
pub struct RecommenderSettings {
    /// Candidates fetched together; also the throttling group size
    pub batch_size: usize,
    /// Pause after a batch that reached the provider
    pub batch_pause: Duration,
    /// Upper bound on the whole request; later detail fetches fall back
    pub request_deadline: Duration,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            batch_size: 4,
            batch_pause: Duration::from_millis(100),
            request_deadline: Duration::from_secs(10),
        }
    }
}

/// Turns a movie title into a ranked, metadata-enriched recommendation list
#[derive(Clone)]
pub struct Recommender {
    model: Option<Arc<SimilarityModel>>,
    details: DetailFetcher,
    cache: Cache,
    settings: RecommenderSettings,
}

impl Recommender {
    pub fn new(
        model: Option<Arc<SimilarityModel>>,
        details: DetailFetcher,
        cache: Cache,
        settings: RecommenderSettings,
    ) -> Self {
        Self {
            model,
            details,
            cache,
            settings,
        }
    }

    /// Recommends movies similar to `title` (exact catalog title)
    ///
    /// Fails only when the title is blank, the model is not loaded, or the
    /// title is not in the catalog. Provider trouble degrades individual
    /// records, never the whole response.
    pub async fn recommend(&self, title: &str) -> AppResult<RecommendationResponse> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("No movie selected".to_string()));
        }
        let model = self.model.as_ref().ok_or(AppError::DataNotLoaded)?;

        let key = CacheKey::Recommendations(title.to_string());
        if let Some(recommendations) = self.cache.get_from_cache::<Vec<MovieRecord>>(&key).await {
            tracing::info!(title = %title, "Recommendations cache hit");
            return Ok(RecommendationResponse {
                success: true,
                recommendations,
                from_cache: true,
            });
        }

        let index = model
            .lookup_index(title)
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

        // Rank one is the query movie itself.
        let candidates: Vec<SimilarityCandidate> = model
            .top_k_similar(index, MAX_RECOMMENDATIONS + 1)
            .into_iter()
            .skip(1)
            .collect();

        let recommendations = self.enrich(&candidates).await;
        self.cache
            .set_in_cache(&key, &recommendations, RECOMMENDATIONS_TTL)
            .await;

        tracing::info!(
            title = %title,
            count = recommendations.len(),
            "Recommendations assembled"
        );

        Ok(RecommendationResponse {
            success: true,
            recommendations,
            from_cache: false,
        })
    }

    /// Fetches details for each candidate, preserving rank order
    async fn enrich(&self, candidates: &[SimilarityCandidate]) -> Vec<MovieRecord> {
        let deadline = Instant::now() + self.settings.request_deadline;
        let batches: Vec<&[SimilarityCandidate]> =
            candidates.chunks(self.settings.batch_size.max(1)).collect();
        let mut records = Vec::with_capacity(candidates.len());

        for (i, batch) in batches.iter().enumerate() {
            let fetched = join_all(batch.iter().map(|candidate| async move {
                let (record, source) = self
                    .details
                    .fetch_with_source(candidate.movie_id, Some(deadline))
                    .await;
                (record.with_similarity(candidate.score), source)
            }))
            .await;

            let reached_provider = fetched
                .iter()
                .any(|(_, source)| *source != DetailSource::Cache);
            records.extend(fetched.into_iter().map(|(record, _)| record));

            let more_batches = i + 1 < batches.len();
            if reached_provider && more_batches && !self.settings.batch_pause.is_zero() {
                sleep(self.settings.batch_pause).await;
            }
        }

        records
    }
}
