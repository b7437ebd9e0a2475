//! Pipeline orchestration on a fixed cadence.
//!
//! [`run_cycle`] executes one full collect → aggregate → score → dispatch
//! pass. Per-location errors are caught at the location boundary and become
//! counts in the [`CycleSummary`]; only an unreachable location directory
//! aborts a cycle, and even that never stops the scheduling loop.
//!
//! [`Scheduler::run_forever`] drives cycles on a fixed slot grid. The loop is
//! single-threaded, so at most one pipeline run is ever in flight; if a run
//! overruns its slot, the missed slots are skipped and the next future slot
//! is taken (never a concurrent or back-to-back catch-up run).

use chrono::{DateTime, Datelike, Utc};
use std::time::{Duration, Instant};

use crate::ingest::WeatherProvider;
use crate::logging::{self, Component};
use crate::model::{CycleError, Location, PersistenceError};
use crate::notify::NotificationTransport;
use crate::pipeline::{aggregator, collector, dispatcher};
use crate::risk::engine::{self, RiskInputs};
use crate::store::{
    AlertLog, AssessmentStore, LocationDirectory, NewAssessment, SubscriptionDirectory,
    WeatherStore,
};

/// Everything a cycle needs from persistence, as one bound. Production binds
/// this to `PgStore`; tests bind an in-memory fake.
pub trait PipelineStore:
    LocationDirectory + WeatherStore + AssessmentStore + SubscriptionDirectory + AlertLog
{
}

impl<S> PipelineStore for S where
    S: LocationDirectory + WeatherStore + AssessmentStore + SubscriptionDirectory + AlertLog
{
}

// ---------------------------------------------------------------------------
// Cycle summary
// ---------------------------------------------------------------------------

/// The unit of observability for one pipeline run.
#[derive(Debug, Default, PartialEq)]
pub struct CycleSummary {
    pub locations: usize,
    /// Provider fetches that failed (the location may still be scored from
    /// earlier observations).
    pub fetch_failures: usize,
    /// Locations whose aggregate/score/dispatch stage errored out.
    pub location_failures: usize,
    /// Locations skipped because they have no observations at all.
    pub skipped_no_data: usize,
    pub assessments_created: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

// ---------------------------------------------------------------------------
// One cycle
// ---------------------------------------------------------------------------

/// Runs one full pipeline cycle at the injected instant.
pub fn run_cycle<S: PipelineStore>(
    store: &mut S,
    provider: &dyn WeatherProvider,
    transport: &dyn NotificationTransport,
    now: DateTime<Utc>,
) -> Result<CycleSummary, CycleError> {
    let locations = store
        .list_locations()
        .map_err(CycleError::DirectoryUnavailable)?;

    logging::info(
        Component::Scheduler,
        None,
        &format!("cycle started for {} locations", locations.len()),
    );

    let collect = collector::collect_and_store(provider, store, &locations, now);

    let mut summary = CycleSummary {
        locations: locations.len(),
        fetch_failures: collect.fetch_failures + collect.store_failures,
        ..CycleSummary::default()
    };

    for location in &locations {
        match process_location(store, transport, location, now) {
            Ok(Some(outcome)) => {
                summary.assessments_created += 1;
                summary.alerts_sent += outcome.sent;
                summary.alerts_failed += outcome.failed;
            }
            Ok(None) => {
                summary.skipped_no_data += 1;
                logging::debug(
                    Component::Risk,
                    Some(location.id),
                    "no observations on record - skipping assessment",
                );
            }
            Err(err) => {
                summary.location_failures += 1;
                logging::error(Component::Scheduler, Some(location.id), &err.to_string());
            }
        }
    }

    logging::log_cycle_summary(
        summary.locations,
        summary.location_failures,
        summary.assessments_created,
        summary.alerts_sent,
        summary.alerts_failed,
    );

    Ok(summary)
}

struct LocationOutcome {
    sent: usize,
    failed: usize,
}

/// Aggregate → score → dispatch for one location. Returns `Ok(None)` when
/// the location has no observations (no assessment is appended — absence of
/// data is not low risk).
fn process_location<S: PipelineStore>(
    store: &mut S,
    transport: &dyn NotificationTransport,
    location: &Location,
    now: DateTime<Utc>,
) -> Result<Option<LocationOutcome>, PersistenceError> {
    let Some(totals) = aggregator::update_location_aggregates(store, location.id, now)? else {
        return Ok(None);
    };

    let assessed = engine::assess(&RiskInputs {
        rainfall_24h_mm: totals.rainfall_24h_mm,
        rainfall_72h_mm: totals.rainfall_72h_mm,
        elevation_m: location.elevation_m,
        historical_flood_count: location.historical_flood_count,
        month: now.month(),
    });

    // Read the previous level before appending, purely for the transition log.
    let previous_level = store
        .latest_assessment(location.id)?
        .map(|assessment| assessment.level);

    let assessment_id = store.append_assessment(&NewAssessment {
        location_id: location.id,
        timestamp: now,
        score: assessed.score,
        level: assessed.level,
        rainfall_24h_mm: totals.rainfall_24h_mm,
        rainfall_72h_mm: totals.rainfall_72h_mm,
    })?;

    match previous_level {
        Some(previous) if previous != assessed.level => logging::info(
            Component::Risk,
            Some(location.id),
            &format!(
                "{}: level {} -> {} (score {})",
                location.name, previous, assessed.level, assessed.score
            ),
        ),
        _ => logging::debug(
            Component::Risk,
            Some(location.id),
            &format!("{}: {} (score {})", location.name, assessed.level, assessed.score),
        ),
    }

    let dispatch = dispatcher::dispatch_alerts(
        store,
        transport,
        location,
        assessment_id,
        assessed.level,
        totals.rainfall_24h_mm,
    )?;

    Ok(Some(LocationOutcome {
        sent: dispatch.sent,
        failed: dispatch.failed + dispatch.skipped_no_contact,
    }))
}

// ---------------------------------------------------------------------------
// Fixed-interval scheduling
// ---------------------------------------------------------------------------

/// First slot on the fixed grid strictly after `now`.
///
/// When a run overruns one or more slots, those slots are dropped rather
/// than queued — running catch-up cycles back to back would double-count
/// rainfall windows and double-dispatch alerts.
pub fn next_slot(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let mut slot = previous + interval;
    while slot <= now {
        slot += interval;
    }
    slot
}

/// Drives the pipeline on a fixed interval until the process terminates.
///
/// The loop runs cycles on its own thread, so at most one run is ever in
/// flight; no separate state token is needed to enforce that.
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Scheduler { interval }
    }

    /// Runs one cycle immediately, then one per interval slot, forever.
    /// A fatal cycle error is logged and the next tick still fires.
    pub fn run_forever<S: PipelineStore>(
        &mut self,
        store: &mut S,
        provider: &dyn WeatherProvider,
        transport: &dyn NotificationTransport,
    ) -> ! {
        let mut slot = Instant::now();
        loop {
            if let Err(err) = run_cycle(store, provider, transport, Utc::now()) {
                logging::error(
                    Component::Scheduler,
                    None,
                    &format!("cycle aborted: {}", err),
                );
            }

            slot = next_slot(slot, self.interval, Instant::now());
            std::thread::sleep(slot.saturating_duration_since(Instant::now()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
