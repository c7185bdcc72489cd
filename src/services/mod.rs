pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod weather;

pub use recommendations::RecommendationService;
pub use weather::WeatherService;
