//! OpenWeatherMap current-weather API client.
//!
//! Fetches one observation per monitored location from the
//! `/data/2.5/weather` endpoint with metric units. Rainfall arrives as the
//! optional `rain.1h` field, omitted entirely in dry conditions.
//!
//! API documentation: https://openweathermap.org/current

use serde::Deserialize;
use std::time::Duration;

use crate::ingest::WeatherProvider;
use crate::model::{ProviderError, ProviderReading};

/// Production endpoint. Overridable through config for tests and proxies.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Default per-call timeout. One slow provider call must not starve the
/// collector's worker pool for the whole cycle.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// OpenWeatherMap response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainSection,
    wind: Option<WindSection>,
    rain: Option<RainSection>,
    weather: Option<Vec<ConditionSection>>,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    /// Temperature in °C (units=metric).
    temp: f64,
    /// Relative humidity, percent.
    humidity: f64,
    /// Sea-level adjusted pressure, hPa.
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WindSection {
    /// Wind speed in m/s (units=metric).
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainSection {
    /// Rainfall over the last hour, mm.
    #[serde(rename = "1h")]
    last_hour_mm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionSection {
    description: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Blocking HTTP client for the OpenWeatherMap current-weather endpoint.
pub struct OpenWeatherClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Builds a client with a bounded per-call timeout.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(OpenWeatherClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl WeatherProvider for OpenWeatherClient {
    fn fetch_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ProviderReading, ProviderError> {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, latitude, longitude, self.api_key
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        parse_current_payload(&body)
    }
}

/// Parses a current-weather JSON payload into a [`ProviderReading`].
///
/// Separated from the HTTP call so payload handling is testable offline.
pub fn parse_current_payload(body: &str) -> Result<ProviderReading, ProviderError> {
    let payload: CurrentWeatherResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let wind_speed_ms = payload
        .wind
        .and_then(|w| w.speed)
        .ok_or(ProviderError::MissingField("wind.speed"))?;

    // No rain section (or no 1h value) simply means no recent rain.
    let rainfall_1h_mm = payload
        .rain
        .and_then(|r| r.last_hour_mm)
        .unwrap_or(0.0);

    let condition = payload
        .weather
        .and_then(|entries| entries.into_iter().next())
        .and_then(|entry| entry.description);

    Ok(ProviderReading {
        temperature_c: payload.main.temp,
        humidity_pct: payload.main.humidity,
        wind_speed_ms,
        pressure_hpa: payload.main.pressure,
        rainfall_1h_mm,
        condition,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{
            "weather": [{"id": 501, "main": "Rain", "description": "moderate rain"}],
            "main": {"temp": 28.4, "humidity": 87, "pressure": 1006},
            "wind": {"speed": 4.6, "deg": 230},
            "rain": {"1h": 7.2}
        }"#;
        let reading = parse_current_payload(body).expect("payload should parse");
        assert_eq!(reading.temperature_c, 28.4);
        assert_eq!(reading.humidity_pct, 87.0);
        assert_eq!(reading.wind_speed_ms, 4.6);
        assert_eq!(reading.pressure_hpa, 1006.0);
        assert_eq!(reading.rainfall_1h_mm, 7.2);
        assert_eq!(reading.condition.as_deref(), Some("moderate rain"));
    }

    #[test]
    fn test_parse_payload_without_rain_section_defaults_to_zero() {
        // Dry conditions: OpenWeatherMap omits "rain" entirely.
        let body = r#"{
            "weather": [{"description": "clear sky"}],
            "main": {"temp": 31.0, "humidity": 60, "pressure": 1012},
            "wind": {"speed": 2.1}
        }"#;
        let reading = parse_current_payload(body).expect("payload should parse");
        assert_eq!(reading.rainfall_1h_mm, 0.0);
        assert_eq!(reading.condition.as_deref(), Some("clear sky"));
    }

    #[test]
    fn test_parse_payload_with_empty_weather_array_has_no_condition() {
        let body = r#"{
            "weather": [],
            "main": {"temp": 30.0, "humidity": 70, "pressure": 1010},
            "wind": {"speed": 3.0}
        }"#;
        let reading = parse_current_payload(body).expect("payload should parse");
        assert_eq!(reading.condition, None);
    }

    #[test]
    fn test_parse_payload_missing_wind_speed_is_reported() {
        let body = r#"{
            "main": {"temp": 30.0, "humidity": 70, "pressure": 1010},
            "wind": {}
        }"#;
        let err = parse_current_payload(body).unwrap_err();
        assert_eq!(err, ProviderError::MissingField("wind.speed"));
    }

    #[test]
    fn test_parse_payload_missing_main_section_is_a_parse_error() {
        let body = r#"{"wind": {"speed": 3.0}}"#;
        let err = parse_current_payload(body).unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_parse_garbage_body_is_a_parse_error() {
        let err = parse_current_payload("<html>rate limit</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
