//! Configuration management for the `taqs` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::TaqsError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `taqs` service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaqsConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Forecast provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Reverse-geocoding provider settings
    #[serde(default)]
    pub geocode: GeocodeConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Geographic service boundary
    #[serde(default)]
    pub bounds: BoundsConfig,
    /// City dataset settings
    #[serde(default)]
    pub cities: CitiesConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment name (development, production)
    #[serde(default = "default_env")]
    pub env: String,
}

/// Forecast provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    /// User agent sent on upstream requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Reverse-geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Base URL for the Nominatim reverse-geocoding API
    #[serde(default = "default_geocode_base_url")]
    pub base_url: String,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Weather response TTL in seconds
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_seconds: u64,
    /// Optional Redis connection URL; in-memory cache is used when absent
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Geographic service boundary (defaults cover Saudi Arabia)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
    #[serde(default = "default_min_lon")]
    pub min_lon: f64,
    #[serde(default = "default_max_lon")]
    pub max_lon: f64,
}

/// City dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesConfig {
    /// Path to the static city list JSON file
    #[serde(default = "default_cities_path")]
    pub dataset: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_env() -> String {
    "development".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("taqs/{}", env!("CARGO_PKG_VERSION"))
}

fn default_geocode_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_weather_ttl() -> u64 {
    300
}

fn default_min_lat() -> f64 {
    16.0
}

fn default_max_lat() -> f64 {
    32.0
}

fn default_min_lon() -> f64 {
    34.0
}

fn default_max_lon() -> f64 {
    56.0
}

fn default_cities_path() -> String {
    "assets/saudi_cities.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            env: default_env(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_upstream_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocode_base_url(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            weather_ttl_seconds: default_weather_ttl(),
            redis_url: None,
        }
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
            min_lon: default_min_lon(),
            max_lon: default_max_lon(),
        }
    }
}

impl Default for CitiesConfig {
    fn default() -> Self {
        Self {
            dataset: default_cities_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TaqsConfig {
    /// Load configuration from `config.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with TAQS_ prefix,
        // e.g. TAQS_CACHE__REDIS_URL, TAQS_SERVER__PORT
        builder = builder.add_source(
            Environment::with_prefix("TAQS")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: TaqsConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 60 {
            return Err(
                TaqsError::config("Upstream timeout must be between 1 and 60 seconds").into(),
            );
        }

        if self.cache.weather_ttl_seconds == 0 || self.cache.weather_ttl_seconds > 86_400 {
            return Err(
                TaqsError::config("Weather cache TTL must be between 1 second and 1 day").into(),
            );
        }

        if self.bounds.min_lat >= self.bounds.max_lat
            || self.bounds.min_lon >= self.bounds.max_lon
        {
            return Err(TaqsError::config("Service bounds are empty or inverted").into());
        }

        if self.bounds.min_lat < -90.0
            || self.bounds.max_lat > 90.0
            || self.bounds.min_lon < -180.0
            || self.bounds.max_lon > 180.0
        {
            return Err(TaqsError::config("Service bounds exceed valid coordinates").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TaqsError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        for url in [&self.weather.base_url, &self.geocode.base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    TaqsError::config("Provider base URLs must be HTTP or HTTPS URLs").into(),
                );
            }
        }

        if let Some(redis_url) = &self.cache.redis_url {
            if !redis_url.starts_with("redis://") && !redis_url.starts_with("rediss://") {
                return Err(TaqsError::config("Redis URL must start with redis://").into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TaqsConfig::default();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.weather.timeout_seconds, 10);
        assert_eq!(config.cache.weather_ttl_seconds, 300);
        assert!(config.cache.redis_url.is_none());
        assert_eq!(config.bounds.min_lat, 16.0);
        assert_eq!(config.bounds.max_lon, 56.0);
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = TaqsConfig::default();
        config.weather.timeout_seconds = 120;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_config_validation_inverted_bounds() {
        let mut config = TaqsConfig::default();
        config.bounds.min_lat = 40.0;
        config.bounds.max_lat = 20.0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bounds"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TaqsConfig::default();
        config.logging.level = "chatty".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_redis_url_scheme() {
        let mut config = TaqsConfig::default();
        config.cache.redis_url = Some("http://localhost:6379".to_string());
        assert!(config.validate().is_err());

        config.cache.redis_url = Some("redis://localhost:6379".to_string());
        assert!(config.validate().is_ok());
    }
}
