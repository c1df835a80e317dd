use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker used for fields the provider did not supply
pub const NOT_AVAILABLE: &str = "N/A";

/// Upper bound of the provider's vote scale
pub const MAX_RATING: f64 = 10.0;

pub const MAX_GENRES: usize = 3;
pub const MAX_CAST: usize = 5;

/// Movie runtime in minutes, or `"N/A"` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Minutes(u32),
    NotAvailable,
}

impl Runtime {
    /// A zero or missing runtime means the provider does not know it
    pub fn from_minutes(minutes: Option<u32>) -> Self {
        match minutes {
            Some(m) if m > 0 => Runtime::Minutes(m),
            _ => Runtime::NotAvailable,
        }
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Runtime::Minutes(minutes) => serializer.serialize_u32(*minutes),
            Runtime::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(u32),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Minutes(minutes) => Runtime::from_minutes(Some(minutes)),
            Raw::Text(_) => Runtime::NotAvailable,
        })
    }
}

/// Movie metadata returned to clients
///
/// Built once from provider data (or the fallback path) and never mutated;
/// the recommender attaches `similarity` through [`MovieRecord::with_similarity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub poster: String,
    pub backdrop: Option<String>,
    pub overview: String,
    pub rating: f64,
    pub release_date: String,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl MovieRecord {
    /// Returns a copy carrying the similarity percentage for `score` (0.0..=1.0)
    pub fn with_similarity(self, score: f32) -> Self {
        Self {
            similarity: Some(similarity_percent(score)),
            ..self
        }
    }
}

/// `score * 100`, rounded to two decimals and kept inside 0..=100
pub fn similarity_percent(score: f32) -> f64 {
    let percent = (f64::from(score) * 100.0 * 100.0).round() / 100.0;
    percent.clamp(0.0, 100.0)
}

/// Normalizes a provider vote average onto the 0..=10 scale
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, MAX_RATING)
    } else {
        0.0
    }
}
