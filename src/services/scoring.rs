//! Fit scoring for place candidates
//!
//! A candidate's fit score is a fixed-weight blend of six signals, each
//! clamped to `[0, 1]` before weighting:
//!
//! | Signal           | Weight | Missing-data default |
//! |------------------|--------|----------------------|
//! | query relevance  | 0.25   | 0.0 (no tokens)      |
//! | rating           | 0.20   | 0.35                 |
//! | review volume    | 0.15   | 0.1                  |
//! | distance         | 0.20   | 0.4                  |
//! | weather fit      | 0.10   | 0.7 (neutral sky)    |
//! | preference match | 0.10   | 0.5 (no tags)        |
//!
//! The blend is clamped again and rounded to four decimals. These numbers are
//! the ranking contract; change them only together with the tests below.
use std::collections::HashSet;

use crate::models::WeatherCondition;

pub const QUERY_RELEVANCE_WEIGHT: f64 = 0.25;
pub const RATING_WEIGHT: f64 = 0.20;
pub const REVIEW_VOLUME_WEIGHT: f64 = 0.15;
pub const DISTANCE_WEIGHT: f64 = 0.20;
pub const WEATHER_FIT_WEIGHT: f64 = 0.10;
pub const PREFERENCE_WEIGHT: f64 = 0.10;

pub const DEFAULT_RATING_SCORE: f64 = 0.35;
pub const DEFAULT_REVIEW_VOLUME_SCORE: f64 = 0.1;
pub const DEFAULT_DISTANCE_SCORE: f64 = 0.4;
pub const DEFAULT_PREFERENCE_SCORE: f64 = 0.5;

pub const WEATHER_MATCH_SCORE: f64 = 1.0;
/// Outdoor-friendly sky, but the place is not an outdoor venue
pub const OUTDOOR_MISMATCH_SCORE: f64 = 0.6;
/// Wet or snowy weather, but the place is not an indoor venue
pub const INDOOR_MISMATCH_SCORE: f64 = 0.45;
pub const NEUTRAL_WEATHER_SCORE: f64 = 0.7;

/// Distance at or below which the distance signal is maxed out
pub const WALKABLE_DISTANCE_METERS: f64 = 1000.0;
/// Distance at which the distance signal reaches zero
pub const MAX_USEFUL_DISTANCE_METERS: f64 = 12000.0;

/// Rating at or above which the rationale mentions reviews
pub const STRONG_RATING_THRESHOLD: f64 = 4.2;

pub const INDOOR_PLACE_TYPES: [&str; 5] = ["cafe", "restaurant", "museum", "shopping_mall", "library"];
pub const OUTDOOR_PLACE_TYPES: [&str; 5] =
    ["park", "tourist_attraction", "campground", "hiking_area", "beach"];

/// Everything the scorer needs to know about one candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub query: &'a str,
    pub place_name: &'a str,
    pub place_types: &'a [String],
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub distance_meters: Option<u64>,
    pub condition: WeatherCondition,
    pub preference_tags: &'a [String],
}

/// Per-signal scores before weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalScores {
    pub query_relevance: f64,
    pub rating: f64,
    pub review_volume: f64,
    pub distance: f64,
    pub weather_fit: f64,
    pub preference: f64,
}

impl SignalScores {
    pub fn compute(input: &ScoringInput<'_>) -> Self {
        Self {
            query_relevance: query_relevance_score(input.query, input.place_name, input.place_types),
            rating: rating_score(input.rating),
            review_volume: review_volume_score(input.review_count),
            distance: distance_score(input.distance_meters),
            weather_fit: weather_fit_score(input.condition, input.place_types),
            preference: preference_score(input.preference_tags, input.place_name, input.place_types),
        }
    }

    /// Weighted blend, clamped and rounded to four decimals
    pub fn total(&self) -> f64 {
        let score = QUERY_RELEVANCE_WEIGHT * self.query_relevance
            + RATING_WEIGHT * self.rating
            + REVIEW_VOLUME_WEIGHT * self.review_volume
            + DISTANCE_WEIGHT * self.distance
            + WEATHER_FIT_WEIGHT * self.weather_fit
            + PREFERENCE_WEIGHT * self.preference;
        round4(clamp_score(score))
    }
}

pub fn total_fit_score(input: &ScoringInput<'_>) -> f64 {
    SignalScores::compute(input).total()
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Distinct lower-cased whitespace tokens
fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `"<name> <type> <type> ..."`, lower-cased
fn haystack(place_name: &str, place_types: &[String]) -> String {
    format!("{} {}", place_name, place_types.join(" ")).to_lowercase()
}

fn type_set(place_types: &[String]) -> HashSet<String> {
    place_types.iter().map(|t| t.to_lowercase()).collect()
}

fn intersects(types: &HashSet<String>, category: &[&str]) -> bool {
    category.iter().any(|c| types.contains(*c))
}

/// Share of query tokens found anywhere in the place name or types
pub fn query_relevance_score(query: &str, place_name: &str, place_types: &[String]) -> f64 {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return 0.0;
    }
    let haystack = haystack(place_name, place_types);
    let overlaps = tokens.iter().filter(|token| haystack.contains(token.as_str())).count();
    clamp_score(overlaps as f64 / tokens.len() as f64)
}

pub fn rating_score(rating: Option<f64>) -> f64 {
    match rating {
        Some(rating) => clamp_score(rating / 5.0),
        None => DEFAULT_RATING_SCORE,
    }
}

pub fn review_volume_score(review_count: Option<u64>) -> f64 {
    match review_count {
        Some(count) if count > 0 => clamp_score(((count + 1) as f64).log10() / 3.0),
        _ => DEFAULT_REVIEW_VOLUME_SCORE,
    }
}

pub fn distance_score(distance_meters: Option<u64>) -> f64 {
    match distance_meters {
        None => DEFAULT_DISTANCE_SCORE,
        Some(meters) if meters as f64 <= WALKABLE_DISTANCE_METERS => 1.0,
        Some(meters) => clamp_score(1.0 - meters as f64 / MAX_USEFUL_DISTANCE_METERS),
    }
}

pub fn weather_fit_score(condition: WeatherCondition, place_types: &[String]) -> f64 {
    let types = type_set(place_types);
    if condition.favours_indoor() {
        if intersects(&types, &INDOOR_PLACE_TYPES) {
            WEATHER_MATCH_SCORE
        } else {
            INDOOR_MISMATCH_SCORE
        }
    } else if condition.favours_outdoor() {
        if intersects(&types, &OUTDOOR_PLACE_TYPES) {
            WEATHER_MATCH_SCORE
        } else {
            OUTDOOR_MISMATCH_SCORE
        }
    } else {
        NEUTRAL_WEATHER_SCORE
    }
}

/// Share of preference tags found in the place name or types
pub fn preference_score(preference_tags: &[String], place_name: &str, place_types: &[String]) -> f64 {
    if preference_tags.is_empty() {
        return DEFAULT_PREFERENCE_SCORE;
    }
    let haystack = haystack(place_name, place_types);
    let matches = preference_tags
        .iter()
        .filter(|tag| haystack.contains(&tag.to_lowercase()))
        .count();
    clamp_score(matches as f64 / preference_tags.len() as f64)
}

/// Inputs for the human-readable explanation of a score
#[derive(Debug, Clone, Copy)]
pub struct RationaleInput<'a> {
    pub query: &'a str,
    pub condition: WeatherCondition,
    pub place_types: &'a [String],
    pub rating: Option<f64>,
    pub distance_text: Option<&'a str>,
    pub duration_text: Option<&'a str>,
}

/// Deterministic sentence explaining why a place was recommended
pub fn build_rationale(input: &RationaleInput<'_>) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if input.rating.is_some_and(|r| r >= STRONG_RATING_THRESHOLD) {
        reasons.push("strong review score".to_string());
    }

    match (non_empty(input.distance_text), non_empty(input.duration_text)) {
        (Some(distance), Some(duration)) => {
            reasons.push(format!("about {} away ({})", distance, duration))
        }
        (Some(distance), None) => reasons.push(format!("about {} away", distance)),
        _ => {}
    }

    let types = type_set(input.place_types);
    if input.condition.favours_indoor() && intersects(&types, &INDOOR_PLACE_TYPES) {
        reasons.push("indoor-friendly for current weather".to_string());
    } else if input.condition.favours_outdoor() && intersects(&types, &OUTDOOR_PLACE_TYPES) {
        reasons.push("great fit for outdoor weather".to_string());
    }

    if reasons.is_empty() {
        reasons.push("balanced option near your current area".to_string());
    }

    format!("Matches '{}' with {}.", input.query, reasons.join(", "))
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}
