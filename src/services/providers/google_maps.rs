/// Google Maps Platform provider
///
/// Serves both place discovery and route enrichment:
/// 1. Place search: /maps/api/place/textsearch/json → candidates near the origin
/// 2. Routes: /maps/api/directions/json → distance and duration of the first leg
///
/// Responses are cached per query/route when a Redis cache is configured.
use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        place::{GoogleEnvelope, GoogleTextValue},
        Coordinates, PlaceCandidate, RouteInfo, TravelMode,
    },
    services::providers::{
        lenient_f64, lenient_u64, PlaceSearchRequest, PlacesSearch, RouteLookup,
    },
};
use reqwest::{Client as HttpClient, Url};
use serde_json::Value;

pub const GOOGLE_MAPS_PROVIDER_NAME: &str = "google-maps";
pub const MAPS_STUB_PROVIDER_NAME: &str = "maps-stub";

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";
const DIRECTIONS_PATH: &str = "/maps/api/directions/json";
const PHOTO_PATH: &str = "/maps/api/place/photo";
const UNKNOWN_PLACE_NAME: &str = "Unknown place";
const UNKNOWN_ADDRESS: &str = "Address unavailable";

#[derive(Clone)]
pub struct GoogleMapsProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    default_language: String,
    region: String,
    photo_max_width: u32,
    cache: Cache,
    place_cache_ttl: u64,
    route_cache_ttl: u64,
}

impl GoogleMapsProvider {
    pub fn new(config: &Config, cache: Cache) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.provider_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.google_maps_api_key.clone(),
            api_url: config.google_maps_api_url.trim_end_matches('/').to_string(),
            default_language: config.google_maps_language.clone(),
            region: config.google_maps_region.clone(),
            photo_max_width: config.google_maps_photo_max_width,
            cache,
            place_cache_ttl: config.place_cache_ttl_seconds,
            route_cache_ttl: config.route_cache_ttl_seconds,
        })
    }

    /// GETs a Maps endpoint and decodes the common envelope
    async fn get_envelope(&self, path: &str, params: &[(&str, String)]) -> AppResult<GoogleEnvelope> {
        let url = format!("{}{}", self.api_url, path);

        let response = self.http_client.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Google Maps API returned status {}: {}",
                status, body
            )));
        }

        let envelope: GoogleEnvelope = response.json().await?;
        Ok(envelope)
    }

    /// Request language, or the configured default when the request has none
    fn effective_language<'a>(&'a self, request: &'a PlaceSearchRequest) -> &'a str {
        if request.language.is_empty() {
            &self.default_language
        } else {
            &request.language
        }
    }

    fn place_search_key(&self, request: &PlaceSearchRequest) -> CacheKey {
        CacheKey::PlaceSearch {
            query: request.query.clone(),
            language: self.effective_language(request).to_string(),
            latitude: request.location.latitude,
            longitude: request.location.longitude,
            radius_meters: request.radius_meters,
            max_results: request.max_results,
        }
    }

    async fn fetch_places(&self, request: &PlaceSearchRequest) -> AppResult<Vec<PlaceCandidate>> {
        let language = self.effective_language(request).to_string();

        let envelope = self
            .get_envelope(
                TEXT_SEARCH_PATH,
                &[
                    ("query", request.query.clone()),
                    (
                        "location",
                        format!("{},{}", request.location.latitude, request.location.longitude),
                    ),
                    ("radius", request.radius_meters.to_string()),
                    ("language", language),
                    ("region", self.region.clone()),
                    ("key", self.api_key.clone()),
                ],
            )
            .await?;

        match envelope.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(Vec::new()),
            other => {
                return Err(AppError::ExternalApi(format!(
                    "Unexpected text search status {}",
                    other
                )))
            }
        }

        let raw_count = envelope.results.len();
        let places: Vec<PlaceCandidate> = envelope
            .results
            .iter()
            .take(request.max_results)
            .filter_map(|item| self.parse_place(item))
            .collect();

        tracing::info!(
            query = %request.query,
            raw_results = raw_count,
            results = places.len(),
            provider = GOOGLE_MAPS_PROVIDER_NAME,
            "Place search completed"
        );

        Ok(places)
    }

    /// Converts a raw text search result, dropping it when it has no usable location
    fn parse_place(&self, item: &Value) -> Option<PlaceCandidate> {
        let location = &item["geometry"]["location"];
        let coordinates = Coordinates::new(
            lenient_f64(&location["lat"])?,
            lenient_f64(&location["lng"])?,
        );
        if !coordinates.is_valid() {
            return None;
        }

        let place_id = match &item["place_id"] {
            Value::String(id) => id.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        let photo_reference = item["photos"]
            .as_array()
            .and_then(|photos| photos.first())
            .and_then(|photo| photo["photo_reference"].as_str());

        let maps_uri = if place_id.is_empty() {
            None
        } else {
            Some(format!(
                "https://www.google.com/maps/place/?q=place_id:{}",
                place_id
            ))
        };

        Some(PlaceCandidate {
            name: item["name"]
                .as_str()
                .unwrap_or(UNKNOWN_PLACE_NAME)
                .to_string(),
            address: item["formatted_address"]
                .as_str()
                .unwrap_or(UNKNOWN_ADDRESS)
                .to_string(),
            rating: lenient_f64(&item["rating"]),
            user_ratings_total: lenient_u64(&item["user_ratings_total"]),
            types: item["types"]
                .as_array()
                .map(|types| {
                    types
                        .iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            location: coordinates,
            photo_url: photo_reference.and_then(|reference| self.build_photo_url(reference)),
            maps_uri,
            place_id,
        })
    }

    fn build_photo_url(&self, photo_reference: &str) -> Option<String> {
        if photo_reference.is_empty() {
            return None;
        }

        Url::parse_with_params(
            &format!("{}{}", self.api_url, PHOTO_PATH),
            &[
                ("maxwidth", self.photo_max_width.to_string()),
                ("photo_reference", photo_reference.to_string()),
                ("key", self.api_key.clone()),
            ],
        )
        .ok()
        .map(|url| url.to_string())
    }

    async fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        travel_mode: TravelMode,
    ) -> AppResult<Option<RouteInfo>> {
        let envelope = self
            .get_envelope(
                DIRECTIONS_PATH,
                &[
                    ("origin", format!("{},{}", origin.latitude, origin.longitude)),
                    (
                        "destination",
                        format!("{},{}", destination.latitude, destination.longitude),
                    ),
                    ("mode", travel_mode.as_str().to_string()),
                    ("region", self.region.clone()),
                    ("language", self.default_language.clone()),
                    ("key", self.api_key.clone()),
                ],
            )
            .await?;

        match envelope.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => return Ok(None),
            other => {
                return Err(AppError::ExternalApi(format!(
                    "Unexpected directions status {}",
                    other
                )))
            }
        }

        Ok(route_from_envelope(envelope, travel_mode))
    }
}

/// Route info from the first leg of the first route
fn route_from_envelope(envelope: GoogleEnvelope, travel_mode: TravelMode) -> Option<RouteInfo> {
    let leg = envelope.routes.into_iter().next()?.legs.into_iter().next()?;

    let value_of = |pair: &Option<GoogleTextValue>| {
        pair.as_ref()
            .and_then(|p| p.value.as_ref())
            .and_then(lenient_u64)
    };
    let text_of = |pair: &Option<GoogleTextValue>| pair.as_ref().and_then(|p| p.text.clone());

    Some(RouteInfo {
        distance_meters: value_of(&leg.distance),
        distance_text: text_of(&leg.distance),
        duration_seconds: value_of(&leg.duration),
        duration_text: text_of(&leg.duration),
        travel_mode,
    })
}

#[async_trait::async_trait]
impl PlacesSearch for GoogleMapsProvider {
    async fn search_places(&self, request: &PlaceSearchRequest) -> Vec<PlaceCandidate> {
        if self.api_key.is_empty() {
            tracing::warn!(provider = GOOGLE_MAPS_PROVIDER_NAME, "API key missing, search skipped");
            return Vec::new();
        }

        let key = self.place_search_key(request);

        let result: AppResult<Vec<PlaceCandidate>> =
            cached!(self.cache, key, self.place_cache_ttl, self.fetch_places(request));

        match result {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = %request.query,
                    provider = GOOGLE_MAPS_PROVIDER_NAME,
                    "Place search failed"
                );
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        GOOGLE_MAPS_PROVIDER_NAME
    }
}

#[async_trait::async_trait]
impl RouteLookup for GoogleMapsProvider {
    async fn get_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        travel_mode: TravelMode,
    ) -> Option<RouteInfo> {
        if self.api_key.is_empty() {
            tracing::warn!(provider = GOOGLE_MAPS_PROVIDER_NAME, "API key missing, route skipped");
            return None;
        }

        let key = CacheKey::Route {
            origin_latitude: origin.latitude,
            origin_longitude: origin.longitude,
            destination_latitude: destination.latitude,
            destination_longitude: destination.longitude,
            travel_mode,
        };

        let result: AppResult<Option<RouteInfo>> = cached!(
            self.cache,
            key,
            self.route_cache_ttl,
            self.fetch_route(origin, destination, travel_mode)
        );

        match result {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = GOOGLE_MAPS_PROVIDER_NAME,
                    "Route lookup failed"
                );
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        GOOGLE_MAPS_PROVIDER_NAME
    }
}

/// Maps provider used when Google Maps is disabled or has no API key
#[derive(Debug, Clone, Copy, Default)]
pub struct StubMapsProvider;

#[async_trait::async_trait]
impl PlacesSearch for StubMapsProvider {
    async fn search_places(&self, _request: &PlaceSearchRequest) -> Vec<PlaceCandidate> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        MAPS_STUB_PROVIDER_NAME
    }

    fn is_stub(&self) -> bool {
        true
    }
}

#[async_trait::async_trait]
impl RouteLookup for StubMapsProvider {
    async fn get_route(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
        _travel_mode: TravelMode,
    ) -> Option<RouteInfo> {
        None
    }

    fn name(&self) -> &'static str {
        MAPS_STUB_PROVIDER_NAME
    }

    fn is_stub(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_provider(api_key: &str) -> GoogleMapsProvider {
        let config = Config {
            google_maps_api_key: api_key.to_string(),
            google_maps_api_url: "http://test.local/".to_string(),
            ..Config::default()
        };
        GoogleMapsProvider::new(&config, Cache::disabled()).unwrap()
    }

    #[test]
    fn test_place_search_key_uses_default_language_when_unset() {
        let provider = create_test_provider("test_key");
        let mut request = PlaceSearchRequest {
            query: "Quiet Cafe".to_string(),
            location: Coordinates::new(22.28, 114.15),
            radius_meters: 5000,
            language: String::new(),
            max_results: 10,
        };

        let implicit = provider.place_search_key(&request);
        request.language = "en".to_string();
        let explicit = provider.place_search_key(&request);

        assert_eq!(provider.effective_language(&request), "en");
        assert_eq!(implicit, explicit);
        assert_eq!(implicit.to_string(), "places:en:22.2800,114.1500:5000:10:quiet cafe");
    }

    #[test]
    fn test_parse_place_full_result() {
        let provider = create_test_provider("test_key");
        let item = json!({
            "place_id": "ChIJ123",
            "name": "Cupping Room",
            "formatted_address": "Central, Hong Kong",
            "rating": 4.4,
            "user_ratings_total": 1520,
            "types": ["cafe", "food", "point_of_interest"],
            "geometry": { "location": { "lat": 22.2833, "lng": 114.1542 } },
            "photos": [{ "photo_reference": "abc def" }]
        });

        let place = provider.parse_place(&item).unwrap();
        assert_eq!(place.place_id, "ChIJ123");
        assert_eq!(place.name, "Cupping Room");
        assert_eq!(place.rating, Some(4.4));
        assert_eq!(place.user_ratings_total, Some(1520));
        assert_eq!(place.types, vec!["cafe", "food", "point_of_interest"]);
        assert_eq!(place.location, Coordinates::new(22.2833, 114.1542));
        assert_eq!(
            place.maps_uri.as_deref(),
            Some("https://www.google.com/maps/place/?q=place_id:ChIJ123")
        );
        let photo_url = place.photo_url.unwrap();
        assert!(photo_url.starts_with("http://test.local/maps/api/place/photo?"));
        assert!(photo_url.contains("maxwidth=800"));
        assert!(photo_url.contains("photo_reference=abc+def"));
    }

    #[test]
    fn test_parse_place_defaults_for_missing_fields() {
        let provider = create_test_provider("test_key");
        let item = json!({
            "geometry": { "location": { "lat": "22.28", "lng": 114.15 } },
            "rating": "not a number"
        });

        let place = provider.parse_place(&item).unwrap();
        assert_eq!(place.place_id, "");
        assert_eq!(place.name, UNKNOWN_PLACE_NAME);
        assert_eq!(place.address, UNKNOWN_ADDRESS);
        assert_eq!(place.rating, None);
        assert!(place.types.is_empty());
        assert_eq!(place.maps_uri, None);
        assert_eq!(place.photo_url, None);
    }

    #[test]
    fn test_parse_place_drops_missing_coordinates() {
        let provider = create_test_provider("test_key");
        assert!(provider.parse_place(&json!({ "name": "Nowhere" })).is_none());
        assert!(provider
            .parse_place(&json!({ "geometry": { "location": { "lat": 22.2 } } }))
            .is_none());
        assert!(provider
            .parse_place(&json!({ "geometry": { "location": { "lat": 122.2, "lng": 1.0 } } }))
            .is_none());
    }

    #[test]
    fn test_route_from_envelope() {
        let envelope: GoogleEnvelope = serde_json::from_value(json!({
            "status": "OK",
            "routes": [{
                "legs": [{
                    "distance": { "text": "1.4 km", "value": 1400 },
                    "duration": { "text": "18 mins", "value": 1080 }
                }]
            }]
        }))
        .unwrap();

        let route = route_from_envelope(envelope, TravelMode::Walking).unwrap();
        assert_eq!(route.distance_meters, Some(1400));
        assert_eq!(route.distance_text.as_deref(), Some("1.4 km"));
        assert_eq!(route.duration_seconds, Some(1080));
        assert_eq!(route.duration_text.as_deref(), Some("18 mins"));
        assert_eq!(route.travel_mode, TravelMode::Walking);
    }

    #[test]
    fn test_route_from_envelope_without_legs() {
        let envelope: GoogleEnvelope =
            serde_json::from_value(json!({ "status": "OK", "routes": [{ "legs": [] }] })).unwrap();
        assert!(route_from_envelope(envelope, TravelMode::Driving).is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_returns_no_data() {
        let provider = create_test_provider("");
        let request = PlaceSearchRequest {
            query: "cafe".to_string(),
            location: Coordinates::new(22.28, 114.15),
            radius_meters: 5000,
            language: "en".to_string(),
            max_results: 10,
        };

        assert!(provider.search_places(&request).await.is_empty());
        let route = provider
            .get_route(
                Coordinates::new(22.28, 114.15),
                Coordinates::new(22.29, 114.16),
                TravelMode::Walking,
            )
            .await;
        assert!(route.is_none());
    }

    #[tokio::test]
    async fn test_stub_provider() {
        let stub = StubMapsProvider;
        let request = PlaceSearchRequest {
            query: "park".to_string(),
            location: Coordinates::new(0.0, 0.0),
            radius_meters: 1000,
            language: String::new(),
            max_results: 6,
        };

        assert!(stub.search_places(&request).await.is_empty());
        assert!(PlacesSearch::is_stub(&stub));
        assert_eq!(PlacesSearch::name(&stub), MAPS_STUB_PROVIDER_NAME);
        assert!(RouteLookup::is_stub(&stub));
    }
}
