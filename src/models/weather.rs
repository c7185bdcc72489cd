use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Source tag reported by the weather stub
pub const STUB_WEATHER_SOURCE: &str = "stub";

/// Normalized current weather condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Maps a WMO weather interpretation code onto a condition
    pub fn from_weather_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => WeatherCondition::Clear,
            Some(1 | 2) => WeatherCondition::PartlyCloudy,
            Some(3) => WeatherCondition::Cloudy,
            Some(45 | 48) => WeatherCondition::Fog,
            Some(51 | 53 | 55 | 56 | 57) => WeatherCondition::Drizzle,
            Some(61 | 63 | 65 | 66 | 67 | 80 | 81 | 82) => WeatherCondition::Rain,
            Some(71 | 73 | 75 | 77 | 85 | 86) => WeatherCondition::Snow,
            Some(95 | 96 | 99) => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }

    /// Conditions that favour indoor venues
    pub fn favours_indoor(&self) -> bool {
        matches!(
            self,
            WeatherCondition::Rain
                | WeatherCondition::Drizzle
                | WeatherCondition::Thunderstorm
                | WeatherCondition::Snow
        )
    }

    /// Conditions that favour outdoor venues
    pub fn favours_outdoor(&self) -> bool {
        matches!(self, WeatherCondition::Clear | WeatherCondition::PartlyCloudy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::PartlyCloudy => "partly_cloudy",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Drizzle => "drizzle",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Thunderstorm => "thunderstorm",
            WeatherCondition::Unknown => "unknown",
        }
    }
}

impl Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current weather at a coordinate as reported by a weather provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherData {
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: Option<f64>,
    pub weather_code: Option<i64>,
    pub is_day: Option<bool>,
    pub condition: WeatherCondition,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherData {
    /// Placeholder payload used whenever no live reading is available
    pub fn stub(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            temperature_c: None,
            weather_code: None,
            is_day: None,
            condition: WeatherCondition::Unknown,
            source: STUB_WEATHER_SOURCE.to_string(),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.source == STUB_WEATHER_SOURCE
    }
}

/// Weather lookup result with degradation flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherResponse {
    pub request_id: String,
    pub weather: WeatherData,
    pub degraded: bool,
    pub fallback_reason: Option<String>,
}

// ============================================================================
// Open-Meteo API Types
// ============================================================================

/// Raw forecast response from Open-Meteo `/v1/forecast`
#[derive(Debug, Clone, Deserialize)]
pub struct OpenMeteoForecast {
    #[serde(default)]
    pub current: Option<OpenMeteoCurrent>,
}

/// Values are kept loose; Open-Meteo occasionally returns nulls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoCurrent {
    #[serde(default)]
    pub temperature_2m: Option<serde_json::Value>,
    #[serde(default)]
    pub weather_code: Option<serde_json::Value>,
    #[serde(default)]
    pub is_day: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_code_mapping() {
        assert_eq!(WeatherCondition::from_weather_code(Some(0)), WeatherCondition::Clear);
        assert_eq!(
            WeatherCondition::from_weather_code(Some(2)),
            WeatherCondition::PartlyCloudy
        );
        assert_eq!(WeatherCondition::from_weather_code(Some(48)), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_weather_code(Some(81)), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_weather_code(Some(86)), WeatherCondition::Snow);
        assert_eq!(
            WeatherCondition::from_weather_code(Some(99)),
            WeatherCondition::Thunderstorm
        );
    }

    #[test]
    fn test_unmapped_weather_code_is_unknown() {
        assert_eq!(WeatherCondition::from_weather_code(Some(4)), WeatherCondition::Unknown);
        assert_eq!(WeatherCondition::from_weather_code(None), WeatherCondition::Unknown);
    }

    #[test]
    fn test_condition_serialization() {
        let json = serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly_cloudy\"");
        assert_eq!(WeatherCondition::Thunderstorm.to_string(), "thunderstorm");
    }

    #[test]
    fn test_stub_payload() {
        let weather = WeatherData::stub(22.3, 114.2);
        assert!(weather.is_stub());
        assert_eq!(weather.condition, WeatherCondition::Unknown);
        assert_eq!(weather.temperature_c, None);
    }

    #[test]
    fn test_open_meteo_forecast_deserialization() {
        let json = r#"{
            "latitude": 22.3,
            "longitude": 114.2,
            "current": { "temperature_2m": 27.4, "weather_code": 61, "is_day": 1 }
        }"#;

        let forecast: OpenMeteoForecast = serde_json::from_str(json).unwrap();
        let current = forecast.current.unwrap();
        assert_eq!(current.weather_code, Some(serde_json::json!(61)));
    }
}
