use std::sync::Arc;

use crate::{
    config::Config,
    db::Cache,
    error::AppResult,
    services::{providers::router::ProviderRouter, RecommendationService, WeatherService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub weather: WeatherService,
    pub recommendations: RecommendationService,
}

impl AppState {
    /// Resolves providers from the configuration and wires the services
    pub fn new(config: Config, cache: Cache) -> AppResult<Arc<Self>> {
        let router = ProviderRouter::new(config.clone(), cache);
        let weather = WeatherService::new(router.resolve_weather_provider()?);
        let maps = router.resolve_maps_provider()?;

        let recommendations = RecommendationService::new(
            weather.clone(),
            maps.places,
            maps.routes,
            config.discovery_settings(),
        );

        Ok(Self::with_services(config, weather, recommendations))
    }

    pub fn with_services(
        config: Config,
        weather: WeatherService,
        recommendations: RecommendationService,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            weather,
            recommendations,
        })
    }
}
