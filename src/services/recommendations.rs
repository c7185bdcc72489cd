use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::{
    config::DiscoverySettings,
    models::{
        Coordinates, PlaceCandidate, RecommendationContext, RecommendationItem,
        RecommendationRequest, RecommendationResponse, RouteInfo, WeatherCondition,
    },
    services::{
        providers::{PlaceSearchRequest, PlacesSearch, RouteLookup},
        scoring::{self, RationaleInput, ScoringInput},
        weather::WeatherService,
    },
};

/// Categories searched in addition to the user's own query
pub const FALLBACK_DISCOVERY_CATEGORIES: [&str; 4] = ["cafe", "park", "museum", "restaurant"];

/// Fewer ranked items than this replaces the live results with the fallback set
pub const MIN_LIVE_RESULTS: usize = 3;

pub const MAPS_FALLBACK_REASON: &str = "maps_provider_disabled_or_unavailable";
pub const INSUFFICIENT_RESULTS_REASON: &str = "insufficient_live_place_results";

pub const FALLBACK_FIT_SCORE: f64 = 0.35;
const FALLBACK_ADDRESS: &str = "Hong Kong";

/// Synthetic places: (name, types, latitude offset, longitude offset)
const FALLBACK_PLACES: [(&str, [&str; 2], f64, f64); 3] = [
    ("Nearby Cafe Option", ["cafe", "food"], 0.002, -0.002),
    ("Nearby Park Walk", ["park", "point_of_interest"], -0.002, 0.002),
    ("Nearby Cultural Stop", ["museum", "point_of_interest"], 0.0035, -0.0035),
];

/// The user's trimmed query followed by `"<category> near me"` for each
/// fallback category the query does not already mention.
pub fn build_search_queries(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut queries = vec![query.trim().to_string()];
    queries.extend(
        FALLBACK_DISCOVERY_CATEGORIES
            .iter()
            .filter(|category| !lowered.contains(*category))
            .map(|category| format!("{} near me", category)),
    );
    queries
}

/// Fixed synthetic recommendations around the origin
pub fn fallback_recommendations(origin: Coordinates, query: &str) -> Vec<RecommendationItem> {
    FALLBACK_PLACES
        .iter()
        .enumerate()
        .map(|(index, (name, types, lat_offset, lon_offset))| RecommendationItem {
            place_id: format!("fallback-{}", index + 1),
            name: name.to_string(),
            address: FALLBACK_ADDRESS.to_string(),
            rating: None,
            user_ratings_total: None,
            types: types.iter().map(|t| t.to_string()).collect(),
            location: Coordinates::new(origin.latitude + lat_offset, origin.longitude + lon_offset),
            photo_url: None,
            maps_uri: None,
            distance_text: None,
            duration_text: None,
            fit_score: FALLBACK_FIT_SCORE,
            rationale: format!(
                "Fallback recommendation for '{}' while live place data is unavailable.",
                query
            ),
        })
        .collect()
}

/// Insertion-ordered set of candidates keyed by [`PlaceCandidate::dedupe_key`]
#[derive(Debug, Default)]
struct CandidatePool {
    seen: HashSet<String>,
    places: Vec<PlaceCandidate>,
}

impl CandidatePool {
    /// Adds the candidate unless its key was already seen; first one wins
    fn insert(&mut self, place: PlaceCandidate) -> bool {
        if !place.location.is_valid() {
            return false;
        }
        if self.seen.insert(place.dedupe_key()) {
            self.places.push(place);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.places.len()
    }
}

/// Generates ranked place recommendations
///
/// For one request:
/// 1. Reads the current weather at the origin
/// 2. Searches places for the query and the fallback categories, merging
///    duplicates, until twice `max_results` candidates are collected
/// 3. Looks up a route to every candidate
/// 4. Scores, sorts and truncates; substitutes the fallback set when too few remain
/// 5. Reports whether any of that ran on stubbed or insufficient data
///
/// Holds no mutable state; one instance serves concurrent requests.
#[derive(Clone)]
pub struct RecommendationService {
    weather: WeatherService,
    places: Arc<dyn PlacesSearch>,
    routes: Arc<dyn RouteLookup>,
    settings: DiscoverySettings,
}

impl RecommendationService {
    pub fn new(
        weather: WeatherService,
        places: Arc<dyn PlacesSearch>,
        routes: Arc<dyn RouteLookup>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            weather,
            places,
            routes,
            settings,
        }
    }

    fn maps_is_stub(&self) -> bool {
        self.places.is_stub() || self.routes.is_stub()
    }

    pub async fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> RecommendationResponse {
        let start = Instant::now();
        let max_results = request.clamped_max_results();
        let origin = request.origin();

        let weather = self
            .weather
            .get_current_weather(origin.latitude, origin.longitude, "auto")
            .await;
        let condition = weather.weather.condition;

        let candidates = self.discover(&request.query, origin, max_results).await;
        let candidate_count = candidates.len();

        let mut scored = Vec::with_capacity(candidate_count);
        for place in candidates {
            let route = self
                .routes
                .get_route(origin, place.location, request.travel_mode)
                .await;
            scored.push(score_candidate(request, condition, place, route));
        }

        // Stable sort keeps discovery order on ties
        scored.sort_by(|a, b| b.fit_score.total_cmp(&a.fit_score));
        scored.truncate(max_results);
        let mut recommendations = scored;

        let mut degraded = weather.degraded;
        let mut fallback_reason = weather.fallback_reason;

        if self.maps_is_stub() {
            degraded = true;
            fallback_reason = Some(MAPS_FALLBACK_REASON.to_string());
        }

        if recommendations.len() < MIN_LIVE_RESULTS {
            degraded = true;
            fallback_reason.get_or_insert_with(|| INSUFFICIENT_RESULTS_REASON.to_string());
            recommendations = fallback_recommendations(origin, &request.query);
            recommendations.truncate(max_results);
        }

        let response = RecommendationResponse {
            request_id: Uuid::new_v4().to_string(),
            recommendations,
            context: RecommendationContext {
                weather_condition: condition,
                temperature_c: weather.weather.temperature_c,
                degraded,
                fallback_reason,
            },
        };

        tracing::info!(
            request_id = %response.request_id,
            user_id = %request.user_id,
            role = %request.role,
            maps_provider = self.places.name(),
            weather_provider = self.weather.provider_name(),
            weather_condition = %condition,
            candidates = candidate_count,
            results = response.recommendations.len(),
            degraded = response.context.degraded,
            fallback_reason = ?response.context.fallback_reason,
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Recommendations generated"
        );

        response
    }

    /// Runs the expanded queries and merges their results
    ///
    /// Stops issuing queries once `2 * max_results` distinct candidates are held.
    async fn discover(
        &self,
        query: &str,
        origin: Coordinates,
        max_results: usize,
    ) -> Vec<PlaceCandidate> {
        let target = max_results * 2;
        let mut pool = CandidatePool::default();

        for search_query in build_search_queries(query) {
            let search = PlaceSearchRequest {
                query: search_query,
                location: origin,
                radius_meters: self.settings.radius_meters,
                language: self.settings.language.clone(),
                max_results: target,
            };

            let results = self.places.search_places(&search).await;
            let returned = results.len();
            let added = results
                .into_iter()
                .map(|place| pool.insert(place))
                .filter(|inserted| *inserted)
                .count();

            tracing::debug!(
                query = %search.query,
                returned = returned,
                added = added,
                pool = pool.len(),
                "Discovery query merged"
            );

            if pool.len() >= target {
                break;
            }
        }

        pool.places
    }
}

fn score_candidate(
    request: &RecommendationRequest,
    condition: WeatherCondition,
    place: PlaceCandidate,
    route: Option<RouteInfo>,
) -> RecommendationItem {
    let (distance_meters, distance_text, duration_text) = match route {
        Some(route) => (route.distance_meters, route.distance_text, route.duration_text),
        None => (None, None, None),
    };

    let fit_score = scoring::total_fit_score(&ScoringInput {
        query: &request.query,
        place_name: &place.name,
        place_types: &place.types,
        rating: place.rating,
        review_count: place.user_ratings_total,
        distance_meters,
        condition,
        preference_tags: &request.preference_tags,
    });

    let rationale = scoring::build_rationale(&RationaleInput {
        query: &request.query,
        condition,
        place_types: &place.types,
        rating: place.rating,
        distance_text: distance_text.as_deref(),
        duration_text: duration_text.as_deref(),
    });

    RecommendationItem {
        place_id: place.place_id,
        name: place.name,
        address: place.address,
        rating: place.rating,
        user_ratings_total: place.user_ratings_total,
        types: place.types,
        location: place.location,
        photo_url: place.photo_url,
        maps_uri: place.maps_uri,
        distance_text,
        duration_text,
        fit_score,
        rationale,
    }
}
