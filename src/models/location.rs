//! Coordinate parsing, validation and cache-key derivation

use serde::{Deserialize, Serialize};

use crate::TaqsError;

/// A validated pair of geographic coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Parse raw query-string values into validated coordinates
    ///
    /// Pure: no I/O, no side effects. Rejects non-finite numbers before
    /// range checks so `NaN`/`inf` never reach the range comparisons.
    pub fn parse(lat_raw: &str, lon_raw: &str) -> Result<Self, TaqsError> {
        let latitude: f64 = lat_raw
            .trim()
            .parse()
            .map_err(|_| TaqsError::InvalidCoordinates)?;
        let longitude: f64 = lon_raw
            .trim()
            .parse()
            .map_err(|_| TaqsError::InvalidCoordinates)?;

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(TaqsError::InvalidCoordinates);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(TaqsError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(TaqsError::LongitudeOutOfRange);
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Round coordinates to `precision` decimal places
    ///
    /// Four decimals (~11 m) is the cache granularity: near-identical
    /// requests collapse onto one key.
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate the weather cache key for this position
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded(4);
        format!("weather:{lat}:{lon}")
    }

    /// Coordinate string used as a display name when no city is nearby
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Rectangular geographic boundary the service answers for
#[derive(Debug, Clone, Copy)]
pub struct ServiceBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl ServiceBounds {
    #[must_use]
    pub fn contains(&self, coords: &Coordinates) -> bool {
        coords.latitude >= self.min_lat
            && coords.latitude <= self.max_lat
            && coords.longitude >= self.min_lon
            && coords.longitude <= self.max_lon
    }
}

impl From<&crate::config::BoundsConfig> for ServiceBounds {
    fn from(config: &crate::config::BoundsConfig) -> Self {
        Self {
            min_lat: config.min_lat,
            max_lat: config.max_lat,
            min_lon: config.min_lon,
            max_lon: config.max_lon,
        }
    }
}

/// Resolved place name returned by the reverse-geocode endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceName {
    pub name: String,
    pub country: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl PlaceName {
    /// Fallback value used when geocoding fails
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: "Unknown Location".to_string(),
            country: String::new(),
            country_code: String::new(),
            display_name: "Unknown Location".to_string(),
        }
    }
}
