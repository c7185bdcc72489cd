use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Coordinates, WeatherResponse},
    routes::AppState,
};

fn default_timezone() -> String {
    "auto".to_string()
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Handler for current weather endpoint
pub async fn current_weather(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<WeatherQuery>,
) -> AppResult<Json<WeatherResponse>> {
    if !Coordinates::new(params.latitude, params.longitude).is_valid() {
        return Err(AppError::InvalidInput(format!(
            "coordinates ({}, {}) are out of range",
            params.latitude, params.longitude
        )));
    }

    let response = state
        .weather
        .get_current_weather(params.latitude, params.longitude, &params.timezone)
        .await;

    tracing::info!(
        request_id = %request_id,
        provider = state.weather.provider_name(),
        condition = %response.weather.condition,
        degraded = response.degraded,
        "Weather lookup completed"
    );

    Ok(Json(response))
}
