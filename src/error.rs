//! Error types and handling for the `taqs` service

use thiserror::Error;

/// Main error type for the `taqs` service
#[derive(Error, Debug)]
pub enum TaqsError {
    /// Coordinates missing from the request
    #[error("Latitude and longitude are required")]
    MissingCoordinates,

    /// Coordinates did not parse as finite numbers
    #[error("Invalid coordinates")]
    InvalidCoordinates,

    /// Latitude outside [-90, 90]
    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    /// Longitude outside [-180, 180]
    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    /// Coordinates outside the configured service region
    #[error("Weather data is only available for locations within Saudi Arabia")]
    OutOfBounds,

    /// Search query missing from the request
    #[error("Search query is required")]
    MissingQuery,

    /// Search query shorter than 2 characters after trimming
    #[error("Search query must be at least 2 characters")]
    QueryTooShort,

    /// Search query longer than 64 characters after trimming
    #[error("Search query too long")]
    QueryTooLong,

    /// Upstream provider did not answer within the request timeout
    #[error("Upstream request timed out")]
    UpstreamTimeout,

    /// Upstream provider answered with a non-success status
    #[error("Upstream provider returned status {status}")]
    UpstreamStatus { status: u16, body: String },

    /// Upstream request failed before a response arrived
    #[error("Upstream request failed: {message}")]
    UpstreamRequest { message: String },

    /// Upstream payload could not be decoded
    #[error("Failed to decode upstream payload: {message}")]
    UpstreamDecode { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TaqsError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable machine-readable code surfaced in API error bodies
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            TaqsError::MissingCoordinates => "missing_coordinates",
            TaqsError::InvalidCoordinates => "invalid_coordinates",
            TaqsError::LatitudeOutOfRange => "lat_out_of_range",
            TaqsError::LongitudeOutOfRange => "lon_out_of_range",
            TaqsError::OutOfBounds => "coords_out_of_bounds",
            TaqsError::MissingQuery => "missing_query",
            TaqsError::QueryTooShort => "query_too_short",
            TaqsError::QueryTooLong => "query_too_long",
            TaqsError::UpstreamTimeout => "upstream_timeout",
            TaqsError::UpstreamStatus { .. }
            | TaqsError::UpstreamRequest { .. }
            | TaqsError::UpstreamDecode { .. } => "upstream_error",
            TaqsError::Config { .. } => "config_error",
        }
    }

    /// Get a user-friendly error message
    ///
    /// Upstream errors collapse to a generic message; raw provider bodies
    /// are logged server-side, never relayed to the client.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TaqsError::UpstreamTimeout => "Weather service timeout".to_string(),
            TaqsError::UpstreamStatus { .. }
            | TaqsError::UpstreamRequest { .. }
            | TaqsError::UpstreamDecode { .. } => "Weather service error".to_string(),
            TaqsError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for errors caused by the caller's input
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TaqsError::MissingCoordinates
                | TaqsError::InvalidCoordinates
                | TaqsError::LatitudeOutOfRange
                | TaqsError::LongitudeOutOfRange
                | TaqsError::OutOfBounds
                | TaqsError::MissingQuery
                | TaqsError::QueryTooShort
                | TaqsError::QueryTooLong
        )
    }
}
