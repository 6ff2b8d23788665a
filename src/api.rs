//! Upstream provider clients
//!
//! One HTTP client serves both the Open-Meteo forecast API and the
//! Nominatim reverse-geocoding API. Every call is a single attempt with a
//! bounded timeout; retries are the caller's responsibility (and none are
//! implemented — transient failures surface as errors).

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::TaqsError;
use crate::config::TaqsConfig;

/// HTTP client for the forecast and geocoding providers
pub struct ForecastClient {
    client: Client,
    forecast_base: String,
    geocode_base: String,
}

impl ForecastClient {
    /// Create a client from service configuration
    pub fn new(config: &TaqsConfig) -> Result<Self, TaqsError> {
        Self::with_base_urls(
            &config.weather.base_url,
            &config.geocode.base_url,
            Duration::from_secs(u64::from(config.weather.timeout_seconds)),
            &config.weather.user_agent,
        )
    }

    /// Create a client against explicit base URLs
    ///
    /// Tests point this at a local mock server.
    pub fn with_base_urls(
        forecast_base: &str,
        geocode_base: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, TaqsError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TaqsError::UpstreamRequest {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            forecast_base: forecast_base.trim_end_matches('/').to_string(),
            geocode_base: geocode_base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the raw 7-day forecast for a position
    ///
    /// Requests hourly temperature/weather-code series, the daily
    /// code/min/max/sunrise/sunset series and current conditions, with the
    /// provider resolving the timezone from the coordinates.
    #[instrument(skip(self))]
    pub async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<open_meteo::ForecastResponse, TaqsError> {
        let url = format!(
            "{}/forecast?latitude={lat}&longitude={lon}&hourly=temperature_2m,weathercode&daily=weathercode,temperature_2m_max,temperature_2m_min,sunrise,sunset&timezone=auto&forecast_days=7&current_weather=true",
            self.forecast_base
        );

        debug!("Forecast request: {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Forecast provider returned {}: {}", status, body);
            return Err(TaqsError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(map_decode_error)
    }

    /// Reverse geocode a position into an address payload
    ///
    /// Best-effort enrichment: callers absorb failures rather than letting
    /// them block a weather response.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<nominatim::ReverseResponse, TaqsError> {
        let url = format!(
            "{}/reverse?format=json&lat={lat}&lon={lon}&zoom=10&addressdetails=1",
            self.geocode_base
        );

        debug!("Reverse geocode request: {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Geocoding provider returned {}: {}", status, body);
            return Err(TaqsError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(map_decode_error)
    }
}

fn map_request_error(e: reqwest::Error) -> TaqsError {
    if e.is_timeout() {
        TaqsError::UpstreamTimeout
    } else {
        TaqsError::UpstreamRequest {
            message: e.to_string(),
        }
    }
}

fn map_decode_error(e: reqwest::Error) -> TaqsError {
    if e.is_timeout() {
        TaqsError::UpstreamTimeout
    } else {
        TaqsError::UpstreamDecode {
            message: e.to_string(),
        }
    }
}

/// Raw Open-Meteo response structures
///
/// Every field the provider may omit is an `Option`; defaults are decided
/// by the normalizer, not during deserialization.
pub mod open_meteo {
    use serde::Deserialize;

    /// Forecast response from Open-Meteo
    #[derive(Debug, Deserialize, Default)]
    pub struct ForecastResponse {
        pub timezone: Option<String>,
        pub current_weather: Option<CurrentWeather>,
        pub hourly: Option<HourlyData>,
        pub daily: Option<DailyData>,
    }

    /// Current conditions block (`current_weather=true`)
    #[derive(Debug, Deserialize, Default)]
    pub struct CurrentWeather {
        pub time: Option<String>,
        pub temperature: Option<f64>,
        #[serde(rename = "weathercode")]
        pub weather_code: Option<i32>,
        pub is_day: Option<u8>,
    }

    /// Hourly series block
    #[derive(Debug, Deserialize, Default)]
    pub struct HourlyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<Vec<Option<f64>>>,
        #[serde(rename = "weathercode")]
        pub weather_code: Option<Vec<Option<i32>>>,
    }

    /// Daily series block
    #[derive(Debug, Deserialize, Default)]
    pub struct DailyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "weathercode")]
        pub weather_code: Option<Vec<Option<i32>>>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f64>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f64>>>,
        pub sunrise: Option<Vec<String>>,
        pub sunset: Option<Vec<String>>,
    }
}

/// Raw Nominatim response structures
pub mod nominatim {
    use serde::Deserialize;

    /// Reverse-geocoding response
    #[derive(Debug, Deserialize, Default)]
    pub struct ReverseResponse {
        pub address: Option<Address>,
        pub display_name: Option<String>,
    }

    /// Address details block
    #[derive(Debug, Deserialize, Default)]
    pub struct Address {
        pub city: Option<String>,
        pub town: Option<String>,
        pub village: Option<String>,
        pub municipality: Option<String>,
        pub county: Option<String>,
        pub suburb: Option<String>,
        pub country: Option<String>,
        pub country_code: Option<String>,
    }

    impl Address {
        /// Most specific populated place field, largest first
        #[must_use]
        pub fn place_name(&self) -> Option<&str> {
            self.city
                .as_deref()
                .or(self.town.as_deref())
                .or(self.village.as_deref())
                .or(self.municipality.as_deref())
                .or(self.county.as_deref())
                .or(self.suburb.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base: &str) -> ForecastClient {
        ForecastClient::with_base_urls(base, base, Duration::from_millis(500), "taqs-test").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_forecast_parses_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("timezone", "auto"))
            .and(query_param("forecast_days", "7"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "timezone": "Asia/Riyadh",
                "current_weather": {
                    "time": "2024-01-01T10:00",
                    "temperature": 21.4,
                    "weathercode": 1,
                    "is_day": 1
                },
                "hourly": {
                    "time": ["2024-01-01T09:00", "2024-01-01T10:00"],
                    "temperature_2m": [20.1, 21.4],
                    "weathercode": [1, 1]
                },
                "daily": {
                    "time": ["2024-01-01"],
                    "weathercode": [1],
                    "temperature_2m_max": [24.0],
                    "temperature_2m_min": [12.0],
                    "sunrise": ["2024-01-01T06:33"],
                    "sunset": ["2024-01-01T17:08"]
                }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let raw = client.fetch_forecast(24.7136, 46.6753).await.unwrap();

        assert_eq!(raw.timezone.as_deref(), Some("Asia/Riyadh"));
        let current = raw.current_weather.unwrap();
        assert_eq!(current.weather_code, Some(1));
        assert_eq!(raw.hourly.unwrap().time.len(), 2);
        assert_eq!(raw.daily.unwrap().time.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_forecast_surfaces_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Minutely API request limit exceeded"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.fetch_forecast(24.7, 46.7).await.unwrap_err();

        match err {
            TaqsError::UpstreamStatus { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("limit exceeded"));
            }
            other => panic!("expected UpstreamStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_forecast_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.fetch_forecast(24.7, 46.7).await.unwrap_err();
        assert!(matches!(err, TaqsError::UpstreamTimeout));
    }

    #[tokio::test]
    async fn test_reverse_geocode_parses_address() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .and(query_param("zoom", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Riyadh, Riyadh Region, Saudi Arabia",
                "address": {
                    "city": "Riyadh",
                    "country": "Saudi Arabia",
                    "country_code": "sa"
                }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let raw = client.reverse_geocode(24.7136, 46.6753).await.unwrap();

        let address = raw.address.unwrap();
        assert_eq!(address.place_name(), Some("Riyadh"));
        assert_eq!(address.country_code.as_deref(), Some("sa"));
    }

    #[test]
    fn test_place_name_prefers_most_specific_field() {
        let address = nominatim::Address {
            town: Some("Thuwal".to_string()),
            county: Some("Jeddah".to_string()),
            ..Default::default()
        };
        assert_eq!(address.place_name(), Some("Thuwal"));

        let empty = nominatim::Address::default();
        assert_eq!(empty.place_name(), None);
    }
}
