//! Core data types for the FloodSense monitoring service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no logic beyond trivial accessors, no I/O, and no external
//! dependencies apart from `chrono` — only types and the error taxonomy.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Primary key of a row in `locations`.
pub type LocationId = i32;

/// Primary key of a row in `risk_assessments`.
pub type AssessmentId = i64;

/// Primary key of a row in `alerts`.
pub type AlertId = i64;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A monitored geographic location.
///
/// Created by administrative action outside the core; the pipeline only ever
/// reads these. `historical_flood_count` is derived at read time from the
/// flood record table (floods in the trailing five years), so it is a plain
/// number here rather than a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation above sea level, in meters.
    pub elevation_m: f64,
    /// Recorded floods at this location in the trailing five years.
    pub historical_flood_count: u32,
}

// ---------------------------------------------------------------------------
// Weather types
// ---------------------------------------------------------------------------

/// One raw reading from the external weather provider, before it is stamped
/// with a location and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub pressure_hpa: f64,
    /// Rainfall over the last hour, in millimeters. Providers omit this
    /// field entirely when there was no rain; absent means 0.0 here.
    pub rainfall_1h_mm: f64,
    /// Free-text condition description ("light rain", "overcast clouds").
    pub condition: Option<String>,
}

/// A stored weather observation for one location.
///
/// Created by the collector each cycle. The `rainfall_24h_mm` /
/// `rainfall_72h_mm` fields start out `None` and are written by the
/// aggregator onto the most recent row only; older rows are never rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub location_id: LocationId,
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub pressure_hpa: f64,
    pub rainfall_1h_mm: f64,
    pub rainfall_24h_mm: Option<f64>,
    pub rainfall_72h_mm: Option<f64>,
    pub condition: Option<String>,
}

impl WeatherObservation {
    /// Builds the observation the collector stores for a fresh provider
    /// reading. Rolling aggregates are filled in later by the aggregator.
    pub fn from_reading(
        location_id: LocationId,
        timestamp: DateTime<Utc>,
        reading: &ProviderReading,
    ) -> Self {
        WeatherObservation {
            location_id,
            timestamp,
            temperature_c: reading.temperature_c,
            humidity_pct: reading.humidity_pct,
            wind_speed_ms: reading.wind_speed_ms,
            pressure_hpa: reading.pressure_hpa,
            rainfall_1h_mm: reading.rainfall_1h_mm,
            rainfall_24h_mm: None,
            rainfall_72h_mm: None,
            condition: reading.condition.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Risk types
// ---------------------------------------------------------------------------

/// Flood risk levels, in ascending order of severity.
///
/// The derived `Ord` follows declaration order, so
/// `Low < Moderate < High < Critical` — subscriber threshold matching
/// relies on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Canonical uppercase name, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Parses the canonical uppercase name. Returns `None` for anything else;
    /// callers decide whether an unknown level in stored data is an error.
    pub fn parse(s: &str) -> Option<RiskLevel> {
        match s {
            "LOW" => Some(RiskLevel::Low),
            "MODERATE" => Some(RiskLevel::Moderate),
            "HIGH" => Some(RiskLevel::High),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One appended row of `risk_assessments`: the score and level computed for a
/// location in one pipeline cycle, together with the rainfall inputs used.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub id: AssessmentId,
    pub location_id: LocationId,
    pub timestamp: DateTime<Utc>,
    /// Additive factor score, clamped to 0..=15.
    pub score: u8,
    pub level: RiskLevel,
    pub rainfall_24h_mm: f64,
    pub rainfall_72h_mm: f64,
}

// ---------------------------------------------------------------------------
// Subscription and alert types
// ---------------------------------------------------------------------------

/// A subscriber contact endpoint. Email and SMS are handled uniformly by the
/// notification transport; this enum is the only place the channel shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Sms(String),
}

impl Contact {
    /// Channel tag stored on alert rows ("EMAIL" / "SMS").
    pub fn channel(&self) -> &'static str {
        match self {
            Contact::Email(_) => "EMAIL",
            Contact::Sms(_) => "SMS",
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Contact::Email(addr) => addr,
            Contact::Sms(number) => number,
        }
    }
}

impl std::fmt::Display for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel(), self.address())
    }
}

/// An alert subscription for one location.
///
/// At least one of `phone` / `email` is present on any row that passed
/// admin-side validation; a row with neither is skipped at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: i32,
    pub location_id: LocationId,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Minimum risk level at which this subscriber wants to be notified.
    pub min_risk_level: RiskLevel,
    pub is_active: bool,
}

impl Subscription {
    /// The contact to deliver to. Email is preferred when both are on file
    /// (one alert row per subscriber per dispatch, not one per channel).
    pub fn contact(&self) -> Option<Contact> {
        if let Some(addr) = &self.email {
            return Some(Contact::Email(addr.clone()));
        }
        self.phone.clone().map(Contact::Sms)
    }
}

/// Delivery status of an alert row.
///
/// The dispatcher owns `Active -> Sent | Failed`; `Resolved` is applied by
/// external cleanup after a retention window and never set by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Active,
    Sent,
    Failed,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Sent => "sent",
            AlertStatus::Failed => "failed",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from the external weather provider. Recoverable: the location is
/// skipped this cycle and retried on the next scheduled run.
#[derive(Debug, PartialEq)]
pub enum ProviderError {
    /// Non-2xx HTTP response from the provider.
    Http(u16),
    /// The provider rate-limited us (HTTP 429).
    RateLimited,
    /// Connection-level failure (DNS, TLS, timeout).
    Network(String),
    /// The response body could not be deserialized.
    Parse(String),
    /// The payload parsed but lacked a required field.
    MissingField(&'static str),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http(code) => write!(f, "HTTP error: {}", code),
            ProviderError::RateLimited => write!(f, "rate limited by provider"),
            ProviderError::Network(msg) => write!(f, "network error: {}", msg),
            ProviderError::Parse(msg) => write!(f, "parse error: {}", msg),
            ProviderError::MissingField(field) => {
                write!(f, "payload missing required field '{}'", field)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// A store read or write failed. The affected location is skipped for the
/// remainder of its pipeline this cycle.
#[derive(Debug, PartialEq)]
pub struct PersistenceError {
    /// Which operation failed, e.g. "append_observation".
    pub context: &'static str,
    pub detail: String,
}

impl PersistenceError {
    pub fn new(context: &'static str, detail: impl Into<String>) -> Self {
        PersistenceError {
            context,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.context, self.detail)
    }
}

impl std::error::Error for PersistenceError {}

/// A notification send failed. The alert row is marked `failed`; no in-cycle
/// retry, and sibling subscribers are unaffected.
#[derive(Debug, PartialEq)]
pub enum TransportError {
    /// The contact address could not be parsed or is unusable.
    BadAddress(String),
    /// The underlying transport (SMTP session, SMS gateway call) failed.
    Send(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::BadAddress(addr) => write!(f, "bad contact address: {}", addr),
            TransportError::Send(msg) => write!(f, "send failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors outside per-location scope. Aborts the current cycle only; the
/// scheduler keeps running and the next tick proceeds normally.
#[derive(Debug, PartialEq)]
pub enum CycleError {
    /// The location directory itself was unreachable — nothing to iterate.
    DirectoryUnavailable(PersistenceError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::DirectoryUnavailable(err) => {
                write!(f, "location directory unavailable: {}", err)
            }
        }
    }
}

impl std::error::Error for CycleError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
