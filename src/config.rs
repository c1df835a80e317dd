use std::time::Duration;

use serde::Deserialize;

/// Log output format selected by `LOG_FORMAT`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key (v3 auth)
    pub tmdb_api_key: String,

    /// TMDB REST API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Language sent with every metadata request
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Redis connection URL. The in-process cache is used when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Movie catalog (JSON array of `{movie_id, title}`)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Square similarity matrix (JSON array of rows)
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a whole recommendation request
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// Outbound request budget shared by all in-flight requests
    #[serde(default = "default_provider_requests_per_second")]
    pub provider_requests_per_second: u32,

    /// Number of candidate detail fetches run together
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Pause between candidate batches that reached the provider
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_catalog_path() -> String {
    "model/movie_list.json".to_string()
}

fn default_similarity_path() -> String {
    "model/similarity.json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_deadline_secs() -> u64 {
    10
}

fn default_provider_requests_per_second() -> u32 {
    20
}

fn default_detail_concurrency() -> usize {
    4
}

fn default_batch_pause_ms() -> u64 {
    100
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
