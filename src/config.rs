use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by the CORS layer
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,

    /// Redis connection URL. Provider response caching is off when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_true")]
    pub feature_weather_enabled: bool,

    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,

    #[serde(default = "default_true")]
    pub feature_google_maps_enabled: bool,

    /// Google Maps Platform API key. An empty key selects the maps stub.
    #[serde(default)]
    pub google_maps_api_key: String,

    #[serde(default = "default_google_maps_api_url")]
    pub google_maps_api_url: String,

    #[serde(default = "default_google_maps_language")]
    pub google_maps_language: String,

    #[serde(default = "default_google_maps_region")]
    pub google_maps_region: String,

    /// Radius used for every place text search
    #[serde(default = "default_radius_meters")]
    pub google_maps_default_radius_meters: u32,

    #[serde(default = "default_photo_max_width")]
    pub google_maps_photo_max_width: u32,

    /// HTTP timeout applied to every live provider call
    #[serde(default = "default_provider_timeout_seconds")]
    pub provider_timeout_seconds: f64,

    #[serde(default = "default_place_cache_ttl")]
    pub place_cache_ttl_seconds: u64,

    #[serde(default = "default_weather_cache_ttl")]
    pub weather_cache_ttl_seconds: u64,

    #[serde(default = "default_route_cache_ttl")]
    pub route_cache_ttl_seconds: u64,
}

/// Search parameters handed to the recommendation engine
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub radius_meters: u32,
    pub language: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_frontend_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_google_maps_api_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_google_maps_language() -> String {
    "en".to_string()
}

fn default_google_maps_region() -> String {
    "hk".to_string()
}

fn default_radius_meters() -> u32 {
    5000
}

fn default_photo_max_width() -> u32 {
    800
}

fn default_provider_timeout_seconds() -> f64 {
    6.0
}

fn default_place_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_weather_cache_ttl() -> u64 {
    600 // 10 minutes
}

fn default_route_cache_ttl() -> u64 {
    3600 // 1 hour
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_origin: default_frontend_origin(),
            redis_url: None,
            feature_weather_enabled: true,
            open_meteo_base_url: default_open_meteo_base_url(),
            feature_google_maps_enabled: true,
            google_maps_api_key: String::new(),
            google_maps_api_url: default_google_maps_api_url(),
            google_maps_language: default_google_maps_language(),
            google_maps_region: default_google_maps_region(),
            google_maps_default_radius_meters: default_radius_meters(),
            google_maps_photo_max_width: default_photo_max_width(),
            provider_timeout_seconds: default_provider_timeout_seconds(),
            place_cache_ttl_seconds: default_place_cache_ttl(),
            weather_cache_ttl_seconds: default_weather_cache_ttl(),
            route_cache_ttl_seconds: default_route_cache_ttl(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            radius_meters: self.google_maps_default_radius_meters,
            language: self.google_maps_language.clone(),
        }
    }

    /// Provider HTTP timeout, falling back to the default for non-positive values
    pub fn provider_timeout(&self) -> std::time::Duration {
        let seconds = if self.provider_timeout_seconds.is_finite() && self.provider_timeout_seconds > 0.0 {
            self.provider_timeout_seconds
        } else {
            default_provider_timeout_seconds()
        };
        std::time::Duration::from_secs_f64(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envy_defaults_when_unset() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.google_maps_default_radius_meters, 5000);
        assert_eq!(config.google_maps_language, "en");
        assert!(config.feature_weather_enabled);
        assert!(config.google_maps_api_key.is_empty());
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_envy_overrides() {
        let vars = vec![
            ("PORT".to_string(), "9100".to_string()),
            ("FEATURE_GOOGLE_MAPS_ENABLED".to_string(), "false".to_string()),
            ("GOOGLE_MAPS_LANGUAGE".to_string(), "zh-HK".to_string()),
            ("REDIS_URL".to_string(), "redis://cache:6379".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9100);
        assert!(!config.feature_google_maps_enabled);
        assert_eq!(config.discovery_settings().language, "zh-HK");
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn test_provider_timeout_rejects_non_positive() {
        let config = Config {
            provider_timeout_seconds: 0.0,
            ..Config::default()
        };
        assert_eq!(config.provider_timeout(), std::time::Duration::from_secs(6));
    }
}
