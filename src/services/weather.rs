use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::{WeatherCondition, WeatherResponse},
    services::providers::WeatherLookup,
};

/// Fallback reason reported when weather came from the stub
pub const WEATHER_FALLBACK_REASON: &str = "provider_disabled_or_unavailable";

/// Wraps the configured weather provider and flags degraded readings
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherLookup>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherLookup>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Current weather at a coordinate
    ///
    /// Degraded when the reading came from the stub or the condition could
    /// not be classified. Only a stub reading carries a fallback reason.
    pub async fn get_current_weather(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> WeatherResponse {
        let weather = self
            .provider
            .get_current_weather(latitude, longitude, timezone)
            .await;

        let stubbed = weather.is_stub();
        let degraded = stubbed || weather.condition == WeatherCondition::Unknown;

        WeatherResponse {
            request_id: Uuid::new_v4().to_string(),
            weather,
            degraded,
            fallback_reason: stubbed.then(|| WEATHER_FALLBACK_REASON.to_string()),
        }
    }
}
