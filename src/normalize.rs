//! Weather normalization: raw Open-Meteo payload to the stable contract
//!
//! Every optional provider field is enumerated here with its default, so
//! missing-field behavior is auditable in one place. The display name is
//! left empty; the orchestrator resolves it against the city directory.

use chrono::NaiveDateTime;

use crate::api::open_meteo::ForecastResponse;
use crate::models::{CurrentConditions, DailySeries, HourlySeries, WeatherReport};

/// Hourly series are truncated to one day of entries
const HOURLY_LIMIT: usize = 24;

/// Build a normalized report from a raw forecast payload
#[must_use]
pub fn normalize(raw: &ForecastResponse) -> WeatherReport {
    let current = raw.current_weather.as_ref();
    let hourly = raw.hourly.as_ref();
    let daily = raw.daily.as_ref();

    let hourly_times: &[String] = hourly.map_or(&[], |h| h.time.as_slice());
    let aligned_idx = current
        .and_then(|c| c.time.as_deref())
        .and_then(|t| align_current_index(t, hourly_times));

    let temperature = current
        .and_then(|c| c.temperature)
        .or_else(|| series_value(hourly.and_then(|h| h.temperature.as_ref()), aligned_idx))
        .map(round_one_decimal);

    let weather_code = current
        .and_then(|c| c.weather_code)
        .or_else(|| series_value(hourly.and_then(|h| h.weather_code.as_ref()), aligned_idx));

    let first_daily_code = daily
        .and_then(|d| d.weather_code.as_ref())
        .and_then(|codes| codes.first().copied())
        .flatten();

    let description = weather_code
        .or(first_daily_code)
        .map_or("Unknown", weather_code_to_description)
        .to_string();

    let dt = current
        .and_then(|c| c.time.clone())
        .or_else(|| hourly_times.first().cloned());

    WeatherReport {
        name: String::new(),
        name_ar: None,
        dt,
        is_day: current.and_then(|c| c.is_day).map(|d| d != 0),
        timezone: raw.timezone.clone().unwrap_or_else(|| "UTC".to_string()),
        current: CurrentConditions {
            temperature,
            weather_code,
            description,
        },
        hourly: HourlySeries {
            time: truncated(hourly_times),
            temperature: truncated(
                hourly
                    .and_then(|h| h.temperature.as_deref())
                    .unwrap_or(&[]),
            ),
            weather_code: truncated(
                hourly
                    .and_then(|h| h.weather_code.as_deref())
                    .unwrap_or(&[]),
            ),
        },
        daily: DailySeries {
            time: daily.map(|d| d.time.clone()).unwrap_or_default(),
            weather_code: daily
                .and_then(|d| d.weather_code.clone())
                .unwrap_or_default(),
            temp_max: daily
                .and_then(|d| d.temperature_max.clone())
                .unwrap_or_default(),
            temp_min: daily
                .and_then(|d| d.temperature_min.clone())
                .unwrap_or_default(),
            sunrise: daily.and_then(|d| d.sunrise.clone()).unwrap_or_default(),
            sunset: daily.and_then(|d| d.sunset.clone()).unwrap_or_default(),
        },
    }
}

/// Match the current-conditions timestamp to an hourly index
///
/// Exact string match first; otherwise the entry with the smallest
/// absolute time difference (first occurrence wins ties). `None` when the
/// series is empty or the current timestamp does not parse.
fn align_current_index(current_time: &str, hourly_times: &[String]) -> Option<usize> {
    if let Some(idx) = hourly_times.iter().position(|t| t == current_time) {
        return Some(idx);
    }

    let current = parse_provider_time(current_time)?;
    let mut best: Option<(usize, i64)> = None;
    for (idx, time) in hourly_times.iter().enumerate() {
        let Some(parsed) = parse_provider_time(time) else {
            continue;
        };
        let diff = (parsed - current).num_seconds().abs();
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((idx, diff));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Parse a provider-local timestamp (`2024-01-01T10:00`, seconds optional)
fn parse_provider_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Value of an optional series at an optional index
fn series_value<T: Copy>(series: Option<&Vec<Option<T>>>, idx: Option<usize>) -> Option<T> {
    series
        .zip(idx)
        .and_then(|(values, idx)| values.get(idx).copied())
        .flatten()
}

fn truncated<T: Clone>(values: &[T]) -> Vec<T> {
    values.iter().take(HOURLY_LIMIT).cloned().collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Map a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
