//! `taqs` — weather lookup web service for Saudi Arabia
//!
//! This library provides the weather-data normalization and caching layer
//! between the Open-Meteo forecast API and the browser client, plus city
//! search and nearest-city name resolution.

pub mod api;
pub mod cache;
pub mod cities;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::ForecastClient;
pub use cache::WeatherCache;
pub use cities::{CityDirectory, CityRecord};
pub use config::TaqsConfig;
pub use error::TaqsError;
pub use models::{Coordinates, PlaceName, WeatherReport};
pub use weather::WeatherService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TaqsError>;
