//! PostgreSQL implementation of the store traits.
//!
//! One [`PgStore`] wraps one `postgres::Client` and implements every
//! persistence seam the pipeline needs. Schema (managed outside the core):
//! `locations`, `historical_floods`, `weather_data`, `risk_assessments`,
//! `alert_subscriptions`, and `alerts`.

use chrono::{DateTime, Duration, Utc};
use postgres::{Client, NoTls};

use crate::model::{
    AlertId, AlertStatus, AssessmentId, Contact, Location, LocationId, PersistenceError,
    RiskAssessment, RiskLevel, Subscription, WeatherObservation,
};
use crate::store::{
    AlertLog, AssessmentStore, LocationDirectory, NewAssessment, SubscriptionDirectory,
    WeatherStore,
};

/// Flood history window used for the derived per-location count.
const FLOOD_HISTORY_YEARS: i64 = 5;

fn db_err(context: &'static str, err: postgres::Error) -> PersistenceError {
    PersistenceError::new(context, err.to_string())
}

/// The injected persistence handle. Constructed once by the entry point and
/// passed into the pipeline — never ambient or global.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let client = Client::connect(database_url, NoTls)
            .map_err(|e| db_err("connect", e))?;
        Ok(PgStore { client })
    }

    /// For tests that set up their own connection.
    pub fn from_client(client: Client) -> Self {
        PgStore { client }
    }
}

/// Level names at or below `level`, for SQL-side threshold filtering.
fn levels_at_or_below(level: RiskLevel) -> Vec<String> {
    [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ]
    .iter()
    .filter(|candidate| **candidate <= level)
    .map(|candidate| candidate.as_str().to_string())
    .collect()
}

fn observation_from_row(row: &postgres::Row) -> WeatherObservation {
    WeatherObservation {
        location_id: row.get(0),
        timestamp: row.get(1),
        temperature_c: row.get(2),
        humidity_pct: row.get(3),
        wind_speed_ms: row.get(4),
        pressure_hpa: row.get(5),
        rainfall_1h_mm: row.get(6),
        rainfall_24h_mm: row.get(7),
        rainfall_72h_mm: row.get(8),
        condition: row.get(9),
    }
}

// ---------------------------------------------------------------------------
// LocationDirectory
// ---------------------------------------------------------------------------

impl LocationDirectory for PgStore {
    fn list_locations(&mut self) -> Result<Vec<Location>, PersistenceError> {
        let rows = self
            .client
            .query(
                "SELECT l.id, l.name, l.district, l.latitude, l.longitude, l.elevation,
                        (SELECT COUNT(*) FROM historical_floods hf
                          WHERE hf.location_id = l.id
                            AND hf.flood_date > NOW() - ($1::BIGINT || ' years')::INTERVAL)
                            AS flood_count
                 FROM locations l
                 ORDER BY l.id",
                &[&FLOOD_HISTORY_YEARS],
            )
            .map_err(|e| db_err("list_locations", e))?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            let flood_count: i64 = row.get(6);
            locations.push(Location {
                id: row.get(0),
                name: row.get(1),
                district: row.get(2),
                latitude: row.get(3),
                longitude: row.get(4),
                elevation_m: row.get(5),
                historical_flood_count: flood_count.max(0) as u32,
            });
        }
        Ok(locations)
    }
}

// ---------------------------------------------------------------------------
// WeatherStore
// ---------------------------------------------------------------------------

impl WeatherStore for PgStore {
    fn append_observation(&mut self, obs: &WeatherObservation) -> Result<(), PersistenceError> {
        self.client
            .execute(
                "INSERT INTO weather_data
                 (location_id, timestamp, temperature, humidity, wind_speed, pressure,
                  rainfall_1h, rainfall_24h, rainfall_72h, weather_condition)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &obs.location_id,
                    &obs.timestamp,
                    &obs.temperature_c,
                    &obs.humidity_pct,
                    &obs.wind_speed_ms,
                    &obs.pressure_hpa,
                    &obs.rainfall_1h_mm,
                    &obs.rainfall_24h_mm,
                    &obs.rainfall_72h_mm,
                    &obs.condition,
                ],
            )
            .map_err(|e| db_err("append_observation", e))?;
        Ok(())
    }

    fn sum_rainfall(
        &mut self,
        location_id: LocationId,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<f64, PersistenceError> {
        let boundary = now - Duration::hours(window_hours);
        let row = self
            .client
            .query_one(
                "SELECT COALESCE(SUM(rainfall_1h), 0.0)
                 FROM weather_data
                 WHERE location_id = $1 AND timestamp >= $2",
                &[&location_id, &boundary],
            )
            .map_err(|e| db_err("sum_rainfall", e))?;
        Ok(row.get(0))
    }

    fn latest_observation(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<WeatherObservation>, PersistenceError> {
        let row = self
            .client
            .query_opt(
                "SELECT location_id, timestamp, temperature, humidity, wind_speed, pressure,
                        rainfall_1h, rainfall_24h, rainfall_72h, weather_condition
                 FROM weather_data
                 WHERE location_id = $1
                 ORDER BY timestamp DESC
                 LIMIT 1",
                &[&location_id],
            )
            .map_err(|e| db_err("latest_observation", e))?;
        Ok(row.as_ref().map(observation_from_row))
    }

    fn update_aggregates(
        &mut self,
        location_id: LocationId,
        rainfall_24h_mm: f64,
        rainfall_72h_mm: f64,
    ) -> Result<(), PersistenceError> {
        // Target the max-timestamp row explicitly rather than trusting
        // insertion order; a backfilled older row must never take the update.
        self.client
            .execute(
                "UPDATE weather_data
                 SET rainfall_24h = $1, rainfall_72h = $2
                 WHERE location_id = $3
                   AND timestamp = (SELECT MAX(timestamp) FROM weather_data
                                     WHERE location_id = $3)",
                &[&rainfall_24h_mm, &rainfall_72h_mm, &location_id],
            )
            .map_err(|e| db_err("update_aggregates", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AssessmentStore
// ---------------------------------------------------------------------------

impl AssessmentStore for PgStore {
    fn append_assessment(
        &mut self,
        assessment: &NewAssessment,
    ) -> Result<AssessmentId, PersistenceError> {
        let row = self
            .client
            .query_one(
                "INSERT INTO risk_assessments
                 (location_id, timestamp, risk_level, risk_score, rainfall_24h, rainfall_72h)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id",
                &[
                    &assessment.location_id,
                    &assessment.timestamp,
                    &assessment.level.as_str(),
                    &(assessment.score as i32),
                    &assessment.rainfall_24h_mm,
                    &assessment.rainfall_72h_mm,
                ],
            )
            .map_err(|e| db_err("append_assessment", e))?;
        Ok(row.get(0))
    }

    fn latest_assessment(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<RiskAssessment>, PersistenceError> {
        let row = self
            .client
            .query_opt(
                "SELECT id, location_id, timestamp, risk_level, risk_score,
                        rainfall_24h, rainfall_72h
                 FROM risk_assessments
                 WHERE location_id = $1
                 ORDER BY timestamp DESC
                 LIMIT 1",
                &[&location_id],
            )
            .map_err(|e| db_err("latest_assessment", e))?;

        match row {
            None => Ok(None),
            Some(row) => {
                let level_name: String = row.get(3);
                let level = RiskLevel::parse(&level_name).ok_or_else(|| {
                    PersistenceError::new(
                        "latest_assessment",
                        format!("unknown risk level '{}' in storage", level_name),
                    )
                })?;
                let score: i32 = row.get(4);
                Ok(Some(RiskAssessment {
                    id: row.get(0),
                    location_id: row.get(1),
                    timestamp: row.get(2),
                    score: score.clamp(0, 15) as u8,
                    level,
                    rainfall_24h_mm: row.get(5),
                    rainfall_72h_mm: row.get(6),
                }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SubscriptionDirectory
// ---------------------------------------------------------------------------

impl SubscriptionDirectory for PgStore {
    fn find_active_matching(
        &mut self,
        location_id: LocationId,
        level: RiskLevel,
    ) -> Result<Vec<Subscription>, PersistenceError> {
        let allowed = levels_at_or_below(level);
        let rows = self
            .client
            .query(
                "SELECT id, location_id, phone_number, email, min_risk_level, is_active
                 FROM alert_subscriptions
                 WHERE location_id = $1
                   AND is_active = true
                   AND min_risk_level = ANY($2)",
                &[&location_id, &allowed],
            )
            .map_err(|e| db_err("find_active_matching", e))?;

        let mut subscriptions = Vec::with_capacity(rows.len());
        for row in rows {
            let level_name: String = row.get(4);
            let min_risk_level = RiskLevel::parse(&level_name).ok_or_else(|| {
                PersistenceError::new(
                    "find_active_matching",
                    format!("unknown risk level '{}' in storage", level_name),
                )
            })?;
            subscriptions.push(Subscription {
                id: row.get(0),
                location_id: row.get(1),
                phone: row.get(2),
                email: row.get(3),
                min_risk_level,
                is_active: row.get(5),
            });
        }
        Ok(subscriptions)
    }
}

// ---------------------------------------------------------------------------
// AlertLog
// ---------------------------------------------------------------------------

impl AlertLog for PgStore {
    fn record_alert(
        &mut self,
        location_id: LocationId,
        assessment_id: AssessmentId,
        contact: &Contact,
        message: &str,
        status: AlertStatus,
    ) -> Result<AlertId, PersistenceError> {
        let row = self
            .client
            .query_one(
                "INSERT INTO alerts
                 (location_id, risk_assessment_id, alert_type, recipient, message, status, sent_at)
                 VALUES ($1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP)
                 RETURNING id",
                &[
                    &location_id,
                    &assessment_id,
                    &contact.channel(),
                    &contact.address(),
                    &message,
                    &status.as_str(),
                ],
            )
            .map_err(|e| db_err("record_alert", e))?;
        Ok(row.get(0))
    }

    fn mark_alert_status(
        &mut self,
        alert_id: AlertId,
        status: AlertStatus,
    ) -> Result<(), PersistenceError> {
        self.client
            .execute(
                "UPDATE alerts SET status = $1 WHERE id = $2",
                &[&status.as_str(), &alert_id],
            )
            .map_err(|e| db_err("mark_alert_status", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
