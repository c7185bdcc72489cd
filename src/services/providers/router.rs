use std::sync::Arc;

use crate::{
    config::Config,
    db::Cache,
    error::AppResult,
    services::providers::{
        google_maps::{GoogleMapsProvider, StubMapsProvider},
        open_meteo::{OpenMeteoProvider, StubWeatherProvider},
        PlacesSearch, RouteLookup, WeatherLookup,
    },
};

/// The two capabilities served by one maps provider
#[derive(Clone)]
pub struct MapsProviders {
    pub places: Arc<dyn PlacesSearch>,
    pub routes: Arc<dyn RouteLookup>,
}

/// Chooses live or stub implementations from feature flags and credentials
pub struct ProviderRouter {
    config: Config,
    cache: Cache,
}

impl ProviderRouter {
    pub fn new(config: Config, cache: Cache) -> Self {
        Self { config, cache }
    }

    pub fn resolve_weather_provider(&self) -> AppResult<Arc<dyn WeatherLookup>> {
        let provider: Arc<dyn WeatherLookup> = if self.config.feature_weather_enabled {
            Arc::new(OpenMeteoProvider::new(&self.config, self.cache.clone())?)
        } else {
            Arc::new(StubWeatherProvider)
        };

        tracing::info!(provider = provider.name(), "Weather provider resolved");
        Ok(provider)
    }

    pub fn resolve_maps_provider(&self) -> AppResult<MapsProviders> {
        let providers = if self.config.feature_google_maps_enabled
            && !self.config.google_maps_api_key.trim().is_empty()
        {
            let google = Arc::new(GoogleMapsProvider::new(&self.config, self.cache.clone())?);
            MapsProviders {
                places: google.clone(),
                routes: google,
            }
        } else {
            let stub = Arc::new(StubMapsProvider);
            MapsProviders {
                places: stub.clone(),
                routes: stub,
            }
        };

        tracing::info!(provider = providers.places.name(), "Maps provider resolved");
        Ok(providers)
    }
}
