//! Rolling rainfall aggregation.
//!
//! For each location, sums the 1-hour rainfall field over the trailing 24-
//! and 72-hour windows and writes both sums onto the most recent observation
//! row. The window boundary is `now - window`, inclusive of observations at
//! or after it.
//!
//! `now` is injected by the caller rather than read internally, so for a
//! fixed store and instant the aggregator is deterministic and idempotent —
//! running it twice yields identical sums and leaves the same row state.

use chrono::{DateTime, Utc};

use crate::logging::{self, Component};
use crate::model::{LocationId, PersistenceError};
use crate::store::WeatherStore;

pub const WINDOW_24H: i64 = 24;
pub const WINDOW_72H: i64 = 72;

/// Both rolling sums for one location, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainfallTotals {
    pub rainfall_24h_mm: f64,
    pub rainfall_72h_mm: f64,
}

/// Computes and persists both windows for one location.
///
/// Returns `Ok(None)` when the location has no observations at all: its
/// aggregates are treated as zero and the caller skips it for scoring —
/// absence of data is distinct from confirmed low risk.
pub fn update_location_aggregates<S: WeatherStore>(
    store: &mut S,
    location_id: LocationId,
    now: DateTime<Utc>,
) -> Result<Option<RainfallTotals>, PersistenceError> {
    if store.latest_observation(location_id)?.is_none() {
        return Ok(None);
    }

    let rainfall_24h_mm = store.sum_rainfall(location_id, WINDOW_24H, now)?;
    let rainfall_72h_mm = store.sum_rainfall(location_id, WINDOW_72H, now)?;
    store.update_aggregates(location_id, rainfall_24h_mm, rainfall_72h_mm)?;

    logging::debug(
        Component::Aggregator,
        Some(location_id),
        &format!("24h {:.1} mm, 72h {:.1} mm", rainfall_24h_mm, rainfall_72h_mm),
    );

    Ok(Some(RainfallTotals {
        rainfall_24h_mm,
        rainfall_72h_mm,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
