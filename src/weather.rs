//! Weather request orchestration
//!
//! Composes the validator, cache, upstream client, normalizer and city
//! directory per request. Owns no state beyond its injected components.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::TaqsError;
use crate::api::ForecastClient;
use crate::cache::WeatherCache;
use crate::cities::CityDirectory;
use crate::config::TaqsConfig;
use crate::models::{Coordinates, PlaceName, ServiceBounds, WeatherReport};
use crate::normalize::normalize;

/// Request-level coordinator for weather lookups
pub struct WeatherService {
    client: ForecastClient,
    cache: WeatherCache,
    cities: Arc<CityDirectory>,
    bounds: ServiceBounds,
    weather_ttl: Duration,
}

impl WeatherService {
    #[must_use]
    pub fn new(
        client: ForecastClient,
        cache: WeatherCache,
        cities: Arc<CityDirectory>,
        config: &TaqsConfig,
    ) -> Self {
        Self {
            client,
            cache,
            cities,
            bounds: ServiceBounds::from(&config.bounds),
            weather_ttl: Duration::from_secs(config.cache.weather_ttl_seconds),
        }
    }

    /// Handle one weather request for raw coordinate strings
    ///
    /// Validation and bounds failures return before any cache or upstream
    /// access. A cache hit short-circuits the upstream call and the
    /// directory lookup (the cached value already carries its name). Any
    /// upstream or decode failure aborts the whole request; partially
    /// normalized data is never returned.
    #[instrument(skip(self))]
    pub async fn get_weather(
        &self,
        lat_raw: &str,
        lon_raw: &str,
    ) -> Result<WeatherReport, TaqsError> {
        let coords = Coordinates::parse(lat_raw, lon_raw)?;
        if !self.bounds.contains(&coords) {
            return Err(TaqsError::OutOfBounds);
        }

        let key = coords.cache_key();
        if let Some(report) = self.cache.get::<WeatherReport>(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(report);
        }

        info!("Cache miss for {}, fetching forecast", key);
        let raw = self
            .client
            .fetch_forecast(coords.latitude, coords.longitude)
            .await?;
        let mut report = normalize(&raw);

        match self.cities.find_nearest(coords.latitude, coords.longitude) {
            Some((city, km)) => {
                debug!("Nearest city {} at {:.1} km", city.name_en, km);
                report.name = city.name_en.clone();
                report.name_ar = Some(city.name_ar.clone());
            }
            None => {
                report.name = coords.display_name();
            }
        }

        self.cache.set(&key, &report, self.weather_ttl).await;
        Ok(report)
    }

    /// Resolve a place name for raw coordinate strings
    ///
    /// Validation failures propagate; geocoding failures do not — the
    /// enrichment is best-effort and degrades to a generic fallback.
    #[instrument(skip(self))]
    pub async fn resolve_place(
        &self,
        lat_raw: &str,
        lon_raw: &str,
    ) -> Result<PlaceName, TaqsError> {
        let coords = Coordinates::parse(lat_raw, lon_raw)?;

        let response = match self
            .client
            .reverse_geocode(coords.latitude, coords.longitude)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Reverse geocoding failed, using fallback name: {}", e);
                return Ok(PlaceName::unknown());
            }
        };

        let address = response.address.unwrap_or_default();
        let name = address
            .place_name()
            .unwrap_or("Unknown Location")
            .to_string();

        Ok(PlaceName {
            display_name: response.display_name.unwrap_or_else(|| name.clone()),
            country: address.country.unwrap_or_default(),
            country_code: address
                .country_code
                .map(|code| code.to_uppercase())
                .unwrap_or_default(),
            name,
        })
    }
}
