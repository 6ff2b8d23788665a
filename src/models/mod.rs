//! Data models for the `taqs` service

pub mod location;
pub mod weather;

pub use location::{Coordinates, PlaceName, ServiceBounds};
pub use weather::{CurrentConditions, DailySeries, HourlySeries, WeatherReport};
