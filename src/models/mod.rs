pub mod place;
pub mod recommendation;
pub mod weather;

pub use place::{PlaceCandidate, RouteInfo};
pub use recommendation::{
    Coordinates, RecommendationContext, RecommendationItem, RecommendationRequest,
    RecommendationResponse, RoleType, TravelMode,
};
pub use weather::{WeatherCondition, WeatherData, WeatherResponse};
