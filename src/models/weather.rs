//! Stable weather response contract served to clients
//!
//! Every field the provider may omit is an `Option` that serializes as
//! JSON `null` — clients never see absent keys.

use serde::{Deserialize, Serialize};

/// Normalized weather response for one location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    /// Display name (nearest city, or a rounded coordinate string)
    pub name: String,
    /// Arabic name of the nearest city, when one was resolved
    pub name_ar: Option<String>,
    /// Timestamp of the current conditions (provider-local, `%Y-%m-%dT%H:%M`)
    pub dt: Option<String>,
    /// Whether the current observation falls in daylight
    pub is_day: Option<bool>,
    /// IANA timezone resolved by the provider from the coordinates
    pub timezone: String,
    /// Current conditions
    pub current: CurrentConditions,
    /// Hourly series, truncated to the first 24 entries
    pub hourly: HourlySeries,
    /// Daily series over the full forecast horizon
    pub daily: DailySeries,
}

/// Current conditions block of a [`WeatherReport`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CurrentConditions {
    /// Temperature in °C, rounded to one decimal
    pub temperature: Option<f64>,
    /// WMO weather code
    pub weather_code: Option<i32>,
    /// Human-readable condition description
    pub description: String,
}

/// Hourly series block of a [`WeatherReport`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i32>>,
}

/// Daily series block of a [`WeatherReport`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub weather_code: Vec<Option<i32>>,
    pub temp_max: Vec<Option<f64>>,
    pub temp_min: Vec<Option<f64>>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_serialize_as_null() {
        let report = WeatherReport {
            name: "Riyadh".to_string(),
            name_ar: None,
            dt: None,
            is_day: None,
            timezone: "Asia/Riyadh".to_string(),
            current: CurrentConditions::default(),
            hourly: HourlySeries::default(),
            daily: DailySeries::default(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["dt"].is_null());
        assert!(json["is_day"].is_null());
        assert!(json["current"]["temperature"].is_null());
        // Keys are present even when null
        assert!(json.as_object().unwrap().contains_key("name_ar"));
        assert!(json["hourly"]["time"].as_array().unwrap().is_empty());
    }
}
