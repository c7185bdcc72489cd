use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

use super::WeatherCondition;

/// Smallest and largest number of recommendations a caller may ask for
pub const MIN_RESULTS: usize = 3;
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Persona the caller is talking to. Ranking ignores it; it is only logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Companion,
    #[default]
    LocalGuide,
    StudyGuide,
}

impl Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            RoleType::Companion => "companion",
            RoleType::LocalGuide => "local_guide",
            RoleType::StudyGuide => "study_guide",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Transit,
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
            TravelMode::Driving => "driving",
        }
    }
}

impl Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_max_results() -> usize {
    MAX_RESULTS
}

/// Incoming request for nearby place recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: RoleType,
    pub query: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub preference_tags: Vec<String>,
    #[serde(default)]
    pub travel_mode: TravelMode,
}

impl RecommendationRequest {
    /// Rejects requests that must never reach the recommendation engine
    pub fn validate(&self) -> AppResult<()> {
        if self.user_id.is_empty() {
            return Err(AppError::InvalidInput("user_id must not be empty".to_string()));
        }
        if self.query.is_empty() {
            return Err(AppError::InvalidInput("query must not be empty".to_string()));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.max_results) {
            return Err(AppError::InvalidInput(format!(
                "max_results must be between {} and {}",
                MIN_RESULTS, MAX_RESULTS
            )));
        }
        Ok(())
    }

    /// `max_results` forced into the supported range
    pub fn clamped_max_results(&self) -> usize {
        self.max_results.clamp(MIN_RESULTS, MAX_RESULTS)
    }

    pub fn origin(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// One ranked place returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u64>,
    pub types: Vec<String>,
    pub location: Coordinates,
    pub photo_url: Option<String>,
    pub maps_uri: Option<String>,
    pub distance_text: Option<String>,
    pub duration_text: Option<String>,
    pub fit_score: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationContext {
    pub weather_condition: WeatherCondition,
    pub temperature_c: Option<f64>,
    pub degraded: bool,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub request_id: String,
    pub recommendations: Vec<RecommendationItem>,
    pub context: RecommendationContext,
}
