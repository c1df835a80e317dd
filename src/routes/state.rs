use std::sync::Arc;

use crate::{
    config::Config,
    db::{create_redis_store, Cache},
    services::{
        details::{DetailFetcher, ImageUrls},
        providers::{MetadataProvider, TmdbProvider},
        rate_limit::RateBudget,
        recommendations::{Recommender, RecommenderSettings},
        title_search::TitleSearchService,
        upstream::UpstreamClient,
    },
    similarity::SimilarityModel,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Option<Arc<SimilarityModel>>,
    pub cache: Cache,
    pub details: DetailFetcher,
    pub recommender: Recommender,
    pub search: TitleSearchService,
}

impl AppState {
    /// Wires the services around one provider, cache and (optional) model
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        cache: Cache,
        model: Option<Arc<SimilarityModel>>,
        images: ImageUrls,
        settings: RecommenderSettings,
    ) -> Self {
        let details = DetailFetcher::new(provider.clone(), cache.clone(), model.clone(), images);
        let recommender = Recommender::new(model.clone(), details.clone(), cache.clone(), settings);

        Self {
            model,
            cache,
            details,
            recommender,
            search: TitleSearchService::new(provider),
        }
    }

    /// Builds production state: model files, cache backend and TMDB client
    ///
    /// A model that fails to load leaves the service up with recommendation
    /// and catalog endpoints answering `DataNotLoaded`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = match SimilarityModel::load(&config.catalog_path, &config.similarity_path) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                tracing::warn!(error = %e, "Similarity model not loaded");
                None
            }
        };

        let cache = match &config.redis_url {
            Some(url) => match create_redis_store(url).await {
                Ok(store) => Cache::new(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, using in-process cache");
                    Cache::in_memory()
                }
            },
            None => Cache::in_memory(),
        };
        tracing::info!(backend = cache.backend(), "Cache ready");

        let budget = Arc::new(RateBudget::per_second(config.provider_requests_per_second));
        let client = UpstreamClient::new(
            config.tmdb_api_url.clone(),
            config.tmdb_api_key.clone(),
            budget,
        )?;
        let provider: Arc<dyn MetadataProvider> =
            Arc::new(TmdbProvider::new(client, config.tmdb_language.clone()));

        let settings = RecommenderSettings {
            batch_size: config.detail_concurrency,
            batch_pause: config.batch_pause(),
            request_deadline: config.request_deadline(),
        };

        Ok(Self::new(
            provider,
            cache,
            model,
            ImageUrls::new(config.tmdb_image_url.clone()),
            settings,
        ))
    }
}
