//! Persistence trait seams.
//!
//! The pipeline never touches a database handle directly: every read and
//! write goes through one of these traits, injected by the process entry
//! point. Production binds them all to [`postgres_store::PgStore`] over a
//! single connection; integration tests bind them to an in-memory fake.
//!
//! All methods take `&mut self` because the backing `postgres::Client`
//! requires it; the single-handle design also serializes writes to a
//! location's latest observation row within a cycle.

pub mod postgres_store;

use chrono::{DateTime, Utc};

use crate::model::{
    AlertId, AlertStatus, AssessmentId, Contact, Location, LocationId, PersistenceError,
    RiskAssessment, RiskLevel, Subscription, WeatherObservation,
};

/// Read-only directory of monitored locations.
pub trait LocationDirectory {
    /// All tracked locations, each with its trailing-5-year flood count.
    fn list_locations(&mut self) -> Result<Vec<Location>, PersistenceError>;
}

/// Time-stamped observation storage per location.
pub trait WeatherStore {
    /// Appends a new observation row. Aggregate fields are stored as given
    /// (normally `None` at append time).
    fn append_observation(&mut self, obs: &WeatherObservation) -> Result<(), PersistenceError>;

    /// Sums `rainfall_1h` over observations with
    /// `timestamp >= now - window_hours` (window boundary inclusive).
    /// A location with no rows in the window sums to 0.0.
    fn sum_rainfall(
        &mut self,
        location_id: LocationId,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<f64, PersistenceError>;

    /// The max-timestamp observation for a location, if any exist.
    fn latest_observation(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<WeatherObservation>, PersistenceError>;

    /// Writes both rolling sums onto the max-timestamp row only. Queried by
    /// timestamp, not insertion order, so a backfilled row can never steal
    /// the update. No-op if the location has no observations.
    fn update_aggregates(
        &mut self,
        location_id: LocationId,
        rainfall_24h_mm: f64,
        rainfall_72h_mm: f64,
    ) -> Result<(), PersistenceError>;
}

/// Append-only risk assessment storage.
pub trait AssessmentStore {
    fn append_assessment(
        &mut self,
        assessment: &NewAssessment,
    ) -> Result<AssessmentId, PersistenceError>;

    /// Most recent assessment for a location, if one exists.
    fn latest_assessment(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<RiskAssessment>, PersistenceError>;
}

/// A risk assessment about to be appended (no id yet).
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub location_id: LocationId,
    pub timestamp: DateTime<Utc>,
    pub score: u8,
    pub level: RiskLevel,
    pub rainfall_24h_mm: f64,
    pub rainfall_72h_mm: f64,
}

/// Read-only subscription lookup for dispatch.
pub trait SubscriptionDirectory {
    /// Active subscriptions for a location whose threshold is satisfied by
    /// `level` (`min_risk_level <= level`).
    fn find_active_matching(
        &mut self,
        location_id: LocationId,
        level: RiskLevel,
    ) -> Result<Vec<Subscription>, PersistenceError>;
}

/// Record of dispatch attempts and their outcomes.
pub trait AlertLog {
    /// Inserts one alert row (normally with status `active`) and returns
    /// its id.
    fn record_alert(
        &mut self,
        location_id: LocationId,
        assessment_id: AssessmentId,
        contact: &Contact,
        message: &str,
        status: AlertStatus,
    ) -> Result<AlertId, PersistenceError>;

    /// Transitions an alert row's status (`active -> sent | failed`).
    fn mark_alert_status(
        &mut self,
        alert_id: AlertId,
        status: AlertStatus,
    ) -> Result<(), PersistenceError>;
}
