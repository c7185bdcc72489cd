/// Open-Meteo current weather provider
///
/// Calls /v1/forecast with `current=temperature_2m,weather_code,is_day` and
/// normalizes the WMO weather code into a [`WeatherCondition`]. Any failure
/// yields the stub payload so callers always receive weather data.
use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{weather::OpenMeteoForecast, WeatherCondition, WeatherData},
    services::providers::{lenient_f64, lenient_i64, WeatherLookup},
};
use chrono::Utc;
use reqwest::Client as HttpClient;

pub const OPEN_METEO_PROVIDER_NAME: &str = "open-meteo";
pub const WEATHER_STUB_PROVIDER_NAME: &str = "weather-stub";

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,is_day";

#[derive(Clone)]
pub struct OpenMeteoProvider {
    http_client: HttpClient,
    base_url: String,
    cache: Cache,
    cache_ttl: u64,
}

impl OpenMeteoProvider {
    pub fn new(config: &Config, cache: Cache) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.provider_timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.open_meteo_base_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl: config.weather_cache_ttl_seconds,
        })
    }

    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> AppResult<WeatherData> {
        let url = format!("{}/v1/forecast", self.base_url);
        let timezone = if timezone.is_empty() { "auto" } else { timezone };

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", timezone.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Open-Meteo API returned status {}: {}",
                status, body
            )));
        }

        let forecast: OpenMeteoForecast = response.json().await?;
        let weather = weather_from_forecast(forecast, latitude, longitude);

        tracing::info!(
            condition = %weather.condition,
            temperature_c = ?weather.temperature_c,
            provider = OPEN_METEO_PROVIDER_NAME,
            "Current weather fetched"
        );

        Ok(weather)
    }
}

fn weather_from_forecast(forecast: OpenMeteoForecast, latitude: f64, longitude: f64) -> WeatherData {
    let current = forecast.current.unwrap_or_default();

    let weather_code = current.weather_code.as_ref().and_then(lenient_i64);
    let temperature_c = current.temperature_2m.as_ref().and_then(lenient_f64);
    let is_day = current.is_day.as_ref().and_then(lenient_i64).map(|v| v != 0);

    WeatherData {
        latitude,
        longitude,
        temperature_c,
        weather_code,
        is_day,
        condition: WeatherCondition::from_weather_code(weather_code),
        source: OPEN_METEO_PROVIDER_NAME.to_string(),
        fetched_at: Utc::now(),
    }
}

#[async_trait::async_trait]
impl WeatherLookup for OpenMeteoProvider {
    async fn get_current_weather(&self, latitude: f64, longitude: f64, timezone: &str) -> WeatherData {
        let key = CacheKey::Weather {
            latitude,
            longitude,
            timezone: timezone.to_string(),
        };

        let result: AppResult<WeatherData> = cached!(
            self.cache,
            key,
            self.cache_ttl,
            self.fetch_weather(latitude, longitude, timezone)
        );

        match result {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    latitude = latitude,
                    longitude = longitude,
                    provider = OPEN_METEO_PROVIDER_NAME,
                    "Weather request failed, using stub payload"
                );
                WeatherData::stub(latitude, longitude)
            }
        }
    }

    fn name(&self) -> &'static str {
        OPEN_METEO_PROVIDER_NAME
    }
}

/// Weather provider used when the weather feature is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct StubWeatherProvider;

#[async_trait::async_trait]
impl WeatherLookup for StubWeatherProvider {
    async fn get_current_weather(&self, latitude: f64, longitude: f64, _timezone: &str) -> WeatherData {
        WeatherData::stub(latitude, longitude)
    }

    fn name(&self) -> &'static str {
        WEATHER_STUB_PROVIDER_NAME
    }

    fn is_stub(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(json: &str) -> OpenMeteoForecast {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_weather_from_forecast() {
        let weather = weather_from_forecast(
            forecast(r#"{"current": {"temperature_2m": 27.1, "weather_code": 1, "is_day": 1}}"#),
            22.3193,
            114.1694,
        );

        assert_eq!(weather.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(weather.temperature_c, Some(27.1));
        assert_eq!(weather.weather_code, Some(1));
        assert_eq!(weather.is_day, Some(true));
        assert_eq!(weather.source, OPEN_METEO_PROVIDER_NAME);
        assert!(!weather.is_stub());
    }

    #[test]
    fn test_weather_from_forecast_with_bad_values() {
        let weather = weather_from_forecast(
            forecast(r#"{"current": {"temperature_2m": "warm", "weather_code": null, "is_day": 0}}"#),
            0.0,
            0.0,
        );

        assert_eq!(weather.condition, WeatherCondition::Unknown);
        assert_eq!(weather.temperature_c, None);
        assert_eq!(weather.weather_code, None);
        assert_eq!(weather.is_day, Some(false));
    }

    #[test]
    fn test_weather_from_forecast_without_current_block() {
        let weather = weather_from_forecast(forecast("{}"), 1.0, 2.0);
        assert_eq!(weather.condition, WeatherCondition::Unknown);
        assert_eq!(weather.source, OPEN_METEO_PROVIDER_NAME);
    }

    #[test]
    fn test_stub_weather_provider() {
        let weather = tokio_test::block_on(StubWeatherProvider.get_current_weather(22.3, 114.2, "auto"));
        assert!(weather.is_stub());
        assert_eq!(weather.latitude, 22.3);
        assert!(StubWeatherProvider.is_stub());
        assert_eq!(StubWeatherProvider.name(), WEATHER_STUB_PROVIDER_NAME);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_falls_back_to_stub() {
        let config = Config {
            open_meteo_base_url: "http://127.0.0.1:9".to_string(),
            provider_timeout_seconds: 1.0,
            ..Config::default()
        };
        let provider = OpenMeteoProvider::new(&config, Cache::disabled()).unwrap();

        let weather = provider.get_current_weather(22.3, 114.2, "auto").await;
        assert!(weather.is_stub());
        assert_eq!(weather.condition, WeatherCondition::Unknown);
    }
}
