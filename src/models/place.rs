use serde::{Deserialize, Serialize};

use super::{Coordinates, TravelMode};

/// A place returned by a places search, before scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceCandidate {
    /// Provider identifier. Empty when the provider did not return one.
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u64>,
    pub types: Vec<String>,
    pub location: Coordinates,
    pub photo_url: Option<String>,
    pub maps_uri: Option<String>,
}

impl PlaceCandidate {
    /// Identity used when merging results from several queries
    ///
    /// The place id when present, otherwise `name|address`.
    pub fn dedupe_key(&self) -> String {
        if self.place_id.is_empty() {
            format!("{}|{}", self.name, self.address)
        } else {
            self.place_id.clone()
        }
    }
}

/// Distance and travel time from the request origin to a candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteInfo {
    pub distance_meters: Option<u64>,
    pub distance_text: Option<String>,
    pub duration_seconds: Option<u64>,
    pub duration_text: Option<String>,
    pub travel_mode: TravelMode,
}

// ============================================================================
// Google Maps API Types
// ============================================================================

/// Envelope shared by the text search and directions endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEnvelope {
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub routes: Vec<GoogleRoute>,
}

fn unknown_status() -> String {
    "UNKNOWN".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleRoute {
    #[serde(default)]
    pub legs: Vec<GoogleLeg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleLeg {
    #[serde(default)]
    pub distance: Option<GoogleTextValue>,
    #[serde(default)]
    pub duration: Option<GoogleTextValue>,
}

/// `{ "text": "1.2 km", "value": 1200 }` pairs used for distance and duration
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTextValue {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(place_id: &str) -> PlaceCandidate {
        PlaceCandidate {
            place_id: place_id.to_string(),
            name: "Sample Cafe".to_string(),
            address: "Central, Hong Kong".to_string(),
            rating: Some(4.5),
            user_ratings_total: Some(120),
            types: vec!["cafe".to_string()],
            location: Coordinates::new(22.28, 114.15),
            photo_url: None,
            maps_uri: None,
        }
    }

    #[test]
    fn test_dedupe_key_prefers_place_id() {
        assert_eq!(candidate("abc123").dedupe_key(), "abc123");
    }

    #[test]
    fn test_dedupe_key_falls_back_to_name_and_address() {
        assert_eq!(candidate("").dedupe_key(), "Sample Cafe|Central, Hong Kong");
    }

    #[test]
    fn test_directions_envelope_deserialization() {
        let json = r#"{
            "status": "OK",
            "routes": [{
                "legs": [{
                    "distance": { "text": "1.2 km", "value": 1200 },
                    "duration": { "text": "15 mins", "value": 900 }
                }]
            }]
        }"#;

        let envelope: GoogleEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "OK");
        assert!(envelope.results.is_empty());
        let leg = &envelope.routes[0].legs[0];
        assert_eq!(
            leg.distance.as_ref().and_then(|d| d.text.clone()),
            Some("1.2 km".to_string())
        );
    }

    #[test]
    fn test_envelope_without_status() {
        let envelope: GoogleEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.status, "UNKNOWN");
    }
}
