//! Weather collection: one provider fetch per tracked location, fanned out
//! across a bounded worker pool, then stored as observations.
//!
//! Fetches are independent — a failure for one location is logged and
//! counted, never fatal for the cycle, and there is no in-cycle retry
//! (recovery happens at the next scheduled run). The pool joins before any
//! persistence so all database writes stay on the caller's thread.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ingest::WeatherProvider;
use crate::logging::{self, Component};
use crate::model::{Location, LocationId, ProviderError, ProviderReading, WeatherObservation};
use crate::store::WeatherStore;

/// Upper bound on concurrent provider calls. Keeps a large location set from
/// hammering the provider and tripping its rate limiter.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// One location's fetch outcome, before storage.
#[derive(Debug)]
pub struct FetchOutcome {
    pub location_id: LocationId,
    pub result: Result<ProviderReading, ProviderError>,
}

/// Per-cycle collection totals for the cycle summary.
#[derive(Debug, Default, PartialEq)]
pub struct CollectSummary {
    /// Observations fetched and stored.
    pub stored: usize,
    /// Provider fetch failures (network, parse, rate limit).
    pub fetch_failures: usize,
    /// Fetches that succeeded but could not be persisted.
    pub store_failures: usize,
}

/// Fetches current conditions for every location concurrently and joins.
///
/// Worker threads pull locations off a shared index so at most
/// [`MAX_CONCURRENT_FETCHES`] calls are in flight at once. Output order is
/// unspecified.
pub fn fetch_all(provider: &dyn WeatherProvider, locations: &[Location]) -> Vec<FetchOutcome> {
    if locations.is_empty() {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let outcomes = Mutex::new(Vec::with_capacity(locations.len()));
    let workers = locations.len().min(MAX_CONCURRENT_FETCHES);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(location) = locations.get(index) else {
                        break;
                    };
                    let result = provider.fetch_current(location.latitude, location.longitude);
                    outcomes.lock().unwrap().push(FetchOutcome {
                        location_id: location.id,
                        result,
                    });
                }
            });
        }
    });

    outcomes.into_inner().unwrap()
}

/// Runs the full collection stage: fetch all, then store each successful
/// reading as a fresh observation stamped `now`.
pub fn collect_and_store<S: WeatherStore>(
    provider: &dyn WeatherProvider,
    store: &mut S,
    locations: &[Location],
    now: DateTime<Utc>,
) -> CollectSummary {
    let mut summary = CollectSummary::default();

    for outcome in fetch_all(provider, locations) {
        match outcome.result {
            Ok(reading) => {
                let observation =
                    WeatherObservation::from_reading(outcome.location_id, now, &reading);
                match store.append_observation(&observation) {
                    Ok(()) => {
                        summary.stored += 1;
                        logging::debug(
                            Component::Collector,
                            Some(outcome.location_id),
                            &format!("stored observation ({} mm/1h)", reading.rainfall_1h_mm),
                        );
                    }
                    Err(err) => {
                        summary.store_failures += 1;
                        logging::error(
                            Component::Store,
                            Some(outcome.location_id),
                            &err.to_string(),
                        );
                    }
                }
            }
            Err(err) => {
                summary.fetch_failures += 1;
                logging::log_provider_failure(outcome.location_id, &err);
            }
        }
    }

    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
