//! External data providers consumed by the recommendation engine
//!
//! Each capability (current weather, place search, route lookup) is a trait
//! with a live implementation and a stub. Which one runs is decided once at
//! startup by [`router::ProviderRouter`].
//!
//! Trait methods never fail. A live provider that cannot reach its upstream
//! logs the problem and returns the "no data" value (stub weather, no places,
//! no route); the engine folds that into default scores and degradation flags.
use serde_json::Value;

use crate::models::{Coordinates, PlaceCandidate, RouteInfo, TravelMode, WeatherData};

pub mod google_maps;
pub mod open_meteo;
pub mod router;

/// Parameters for a single place text search
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearchRequest {
    pub query: String,
    pub location: Coordinates,
    pub radius_meters: u32,
    pub language: String,
    pub max_results: usize,
}

/// Current weather lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn get_current_weather(&self, latitude: f64, longitude: f64, timezone: &str)
        -> WeatherData;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;

    /// Whether this is the disabled/stub implementation
    fn is_stub(&self) -> bool {
        false
    }
}

/// Nearby place text search
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlacesSearch: Send + Sync {
    /// Returns at most `request.max_results` candidates, each with valid coordinates
    async fn search_places(&self, request: &PlaceSearchRequest) -> Vec<PlaceCandidate>;

    fn name(&self) -> &'static str;

    fn is_stub(&self) -> bool {
        false
    }
}

/// Distance and duration between two points
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RouteLookup: Send + Sync {
    async fn get_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        travel_mode: TravelMode,
    ) -> Option<RouteInfo>;

    fn name(&self) -> &'static str;

    fn is_stub(&self) -> bool {
        false
    }
}

/// Reads a float from a JSON number or numeric string
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Reads an integer from a JSON number or integer string, truncating floats
pub(crate) fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
                .map(|v| v.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Like [`lenient_i64`] but rejects negative values
pub(crate) fn lenient_u64(value: &Value) -> Option<u64> {
    lenient_i64(value).and_then(|v| u64::try_from(v).ok())
}
