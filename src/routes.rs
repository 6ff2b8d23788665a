//! HTTP API surface
//!
//! Thin handlers over the weather service and city directory. Error
//! bodies carry a stable machine-readable `error` code; raw upstream
//! details stay in the logs.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::TaqsError;
use crate::cities::CityDirectory;
use crate::models::{PlaceName, WeatherReport};
use crate::weather::WeatherService;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherService>,
    pub cities: Arc<CityDirectory>,
    pub environment: String,
    pub started_at: Instant,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/search", get(search_cities))
        .route("/reverse-geocode", get(reverse_geocode))
        .route("/health", get(health))
        .fallback(api_not_found)
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for TaqsError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            TaqsError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            TaqsError::UpstreamStatus { .. }
            | TaqsError::UpstreamRequest { .. }
            | TaqsError::UpstreamDecode { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() || status == StatusCode::GATEWAY_TIMEOUT {
            // Full detail (including any provider body) goes to the log only
            error!("Request failed: {}", self);
        }

        let body = ErrorBody {
            error: self.error_code(),
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CoordParams {
    lat: Option<String>,
    lon: Option<String>,
}

impl CoordParams {
    fn require(&self) -> Result<(&str, &str), TaqsError> {
        match (self.lat.as_deref(), self.lon.as_deref()) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(TaqsError::MissingCoordinates),
        }
    }
}

async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<CoordParams>,
) -> Result<Json<WeatherReport>, TaqsError> {
    let (lat, lon) = params.require()?;
    let report = state.weather.get_weather(lat, lon).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// One search hit, in the shape the frontend consumes
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub region: String,
    pub arabic: String,
}

async fn search_cities(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, TaqsError> {
    let query = params.q.as_deref().ok_or(TaqsError::MissingQuery)?;
    let hits = state.cities.search(query)?;

    let results = hits
        .into_iter()
        .map(|city| SearchResult {
            name: city.name_en.clone(),
            lat: city.latitude(),
            lon: city.longitude(),
            country: "Saudi Arabia".to_string(),
            region: String::new(),
            arabic: city.name_ar.clone(),
        })
        .collect();

    Ok(Json(results))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Query(params): Query<CoordParams>,
) -> Result<Json<PlaceName>, TaqsError> {
    let (lat, lon) = params.require()?;
    let place = state.weather.resolve_place(lat, lon).await?;
    Ok(Json(place))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs(),
        environment: state.environment.clone(),
    })
}

async fn api_not_found(method: Method, uri: Uri) -> Response {
    let body = serde_json::json!({
        "error": "Not Found",
        "message": format!("API endpoint {method} {uri} does not exist"),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
