use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    request.validate()?;

    tracing::info!(
        request_id = %request_id,
        query = %request.query,
        max_results = request.max_results,
        travel_mode = %request.travel_mode,
        preference_tags = request.preference_tags.len(),
        "Processing recommendation request"
    );

    let response = state.recommendations.generate_recommendations(&request).await;
    Ok(Json(response))
}
