//! End-to-end pipeline cycle tests against in-memory collaborators.
//!
//! Every store trait is backed by one `MemStore` that mirrors the SQL
//! semantics (inclusive window boundaries, max-timestamp aggregate updates,
//! threshold filtering), the provider and transport are scripted fakes, and
//! the clock is a fixed instant — so whole cycles are deterministic.
//!
//! Run with: cargo test --test pipeline_cycle

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;

use floodsense_service::ingest::WeatherProvider;
use floodsense_service::model::{
    AlertId, AlertStatus, AssessmentId, Contact, CycleError, Location, LocationId,
    PersistenceError, ProviderError, ProviderReading, RiskAssessment, RiskLevel, Subscription,
    TransportError, WeatherObservation,
};
use floodsense_service::notify::NotificationTransport;
use floodsense_service::pipeline::scheduler::run_cycle;
use floodsense_service::store::{
    AlertLog, AssessmentStore, LocationDirectory, NewAssessment, SubscriptionDirectory,
    WeatherStore,
};

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct AlertRow {
    id: AlertId,
    location_id: LocationId,
    assessment_id: AssessmentId,
    contact: Contact,
    message: String,
    status: AlertStatus,
}

#[derive(Default)]
struct MemStore {
    locations: Vec<Location>,
    directory_down: bool,
    weather: Vec<WeatherObservation>,
    assessments: Vec<RiskAssessment>,
    subscriptions: Vec<Subscription>,
    alerts: Vec<AlertRow>,
    next_assessment_id: AssessmentId,
    next_alert_id: AlertId,
}

impl LocationDirectory for MemStore {
    fn list_locations(&mut self) -> Result<Vec<Location>, PersistenceError> {
        if self.directory_down {
            return Err(PersistenceError::new("list_locations", "connection refused"));
        }
        Ok(self.locations.clone())
    }
}

impl WeatherStore for MemStore {
    fn append_observation(&mut self, obs: &WeatherObservation) -> Result<(), PersistenceError> {
        self.weather.push(obs.clone());
        Ok(())
    }

    fn sum_rainfall(
        &mut self,
        location_id: LocationId,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<f64, PersistenceError> {
        let boundary = now - Duration::hours(window_hours);
        Ok(self
            .weather
            .iter()
            .filter(|o| o.location_id == location_id && o.timestamp >= boundary)
            .map(|o| o.rainfall_1h_mm)
            .sum())
    }

    fn latest_observation(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<WeatherObservation>, PersistenceError> {
        Ok(self
            .weather
            .iter()
            .filter(|o| o.location_id == location_id)
            .max_by_key(|o| o.timestamp)
            .cloned())
    }

    fn update_aggregates(
        &mut self,
        location_id: LocationId,
        rainfall_24h_mm: f64,
        rainfall_72h_mm: f64,
    ) -> Result<(), PersistenceError> {
        let latest = self
            .weather
            .iter_mut()
            .filter(|o| o.location_id == location_id)
            .max_by_key(|o| o.timestamp);
        if let Some(row) = latest {
            row.rainfall_24h_mm = Some(rainfall_24h_mm);
            row.rainfall_72h_mm = Some(rainfall_72h_mm);
        }
        Ok(())
    }
}

impl AssessmentStore for MemStore {
    fn append_assessment(
        &mut self,
        assessment: &NewAssessment,
    ) -> Result<AssessmentId, PersistenceError> {
        self.next_assessment_id += 1;
        let id = self.next_assessment_id;
        self.assessments.push(RiskAssessment {
            id,
            location_id: assessment.location_id,
            timestamp: assessment.timestamp,
            score: assessment.score,
            level: assessment.level,
            rainfall_24h_mm: assessment.rainfall_24h_mm,
            rainfall_72h_mm: assessment.rainfall_72h_mm,
        });
        Ok(id)
    }

    fn latest_assessment(
        &mut self,
        location_id: LocationId,
    ) -> Result<Option<RiskAssessment>, PersistenceError> {
        Ok(self
            .assessments
            .iter()
            .filter(|a| a.location_id == location_id)
            .max_by_key(|a| a.timestamp)
            .cloned())
    }
}

impl SubscriptionDirectory for MemStore {
    fn find_active_matching(
        &mut self,
        location_id: LocationId,
        level: RiskLevel,
    ) -> Result<Vec<Subscription>, PersistenceError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.location_id == location_id && s.is_active && s.min_risk_level <= level)
            .cloned()
            .collect())
    }
}

impl AlertLog for MemStore {
    fn record_alert(
        &mut self,
        location_id: LocationId,
        assessment_id: AssessmentId,
        contact: &Contact,
        message: &str,
        status: AlertStatus,
    ) -> Result<AlertId, PersistenceError> {
        self.next_alert_id += 1;
        let id = self.next_alert_id;
        self.alerts.push(AlertRow {
            id,
            location_id,
            assessment_id,
            contact: contact.clone(),
            message: message.to_string(),
            status,
        });
        Ok(id)
    }

    fn mark_alert_status(
        &mut self,
        alert_id: AlertId,
        status: AlertStatus,
    ) -> Result<(), PersistenceError> {
        let row = self
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| PersistenceError::new("mark_alert_status", "no such alert"))?;
        row.status = status;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted provider and transport
// ---------------------------------------------------------------------------

/// Keyed by latitude; the test locations use their id as latitude so a
/// location's behavior can be scripted without extra lookup machinery.
struct ScriptedProvider {
    failing_lats: Vec<f64>,
    rainfall_1h_mm: f64,
}

impl WeatherProvider for ScriptedProvider {
    fn fetch_current(
        &self,
        latitude: f64,
        _longitude: f64,
    ) -> Result<ProviderReading, ProviderError> {
        if self.failing_lats.contains(&latitude) {
            return Err(ProviderError::Network("connection timed out".into()));
        }
        Ok(ProviderReading {
            temperature_c: 28.0,
            humidity_pct: 88.0,
            wind_speed_ms: 4.0,
            pressure_hpa: 1006.0,
            rainfall_1h_mm: self.rainfall_1h_mm,
            condition: Some("rain".to_string()),
        })
    }
}

struct RecordingTransport {
    failing_addresses: Vec<String>,
    deliveries: RefCell<Vec<(Contact, String, String)>>,
}

impl RecordingTransport {
    fn new() -> Self {
        RecordingTransport {
            failing_addresses: vec![],
            deliveries: RefCell::new(vec![]),
        }
    }
}

impl NotificationTransport for RecordingTransport {
    fn send(&self, contact: &Contact, subject: &str, body: &str) -> Result<(), TransportError> {
        if self.failing_addresses.contains(&contact.address().to_string()) {
            return Err(TransportError::Send("relay rejected".into()));
        }
        self.deliveries
            .borrow_mut()
            .push((contact.clone(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Fixed cycle instant: 2025-06-10 12:00 UTC (June — SW monsoon).
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

fn location(id: LocationId, elevation_m: f64, flood_count: u32) -> Location {
    Location {
        id,
        name: format!("Location {}", id),
        district: "Colombo".to_string(),
        latitude: id as f64,
        longitude: 79.9,
        elevation_m,
        historical_flood_count: flood_count,
    }
}

fn past_obs(location_id: LocationId, hours_ago: i64, rainfall_1h_mm: f64) -> WeatherObservation {
    WeatherObservation {
        location_id,
        timestamp: fixed_now() - Duration::hours(hours_ago),
        temperature_c: 27.0,
        humidity_pct: 90.0,
        wind_speed_ms: 3.0,
        pressure_hpa: 1007.0,
        rainfall_1h_mm,
        rainfall_24h_mm: None,
        rainfall_72h_mm: None,
        condition: None,
    }
}

fn subscription(
    id: i32,
    location_id: LocationId,
    email: &str,
    min_risk_level: RiskLevel,
) -> Subscription {
    Subscription {
        id,
        location_id,
        phone: None,
        email: Some(email.to_string()),
        min_risk_level,
        is_active: true,
    }
}

// ---------------------------------------------------------------------------
// Cycle behavior
// ---------------------------------------------------------------------------

#[test]
fn cycle_creates_exactly_one_assessment_per_location_with_data() {
    let mut store = MemStore {
        locations: vec![location(1, 6.0, 0), location(2, 30.0, 1)],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 2.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(summary.locations, 2);
    assert_eq!(summary.assessments_created, 2);
    assert_eq!(
        store.assessments.iter().filter(|a| a.location_id == 1).count(),
        1
    );
    assert_eq!(
        store.assessments.iter().filter(|a| a.location_id == 2).count(),
        1
    );
}

#[test]
fn no_assessment_is_created_for_a_location_with_an_empty_weather_store() {
    // Location 2's fetch fails and it has no prior observations at all.
    let mut store = MemStore {
        locations: vec![location(1, 6.0, 0), location(2, 6.0, 0)],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![2.0],
        rainfall_1h_mm: 1.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.skipped_no_data, 1);
    assert_eq!(summary.assessments_created, 1);
    assert!(
        store.assessments.iter().all(|a| a.location_id == 1),
        "the data-less location must be skipped, not scored LOW"
    );
}

#[test]
fn a_failed_fetch_still_allows_scoring_from_earlier_observations() {
    // Location 2 has history but this cycle's fetch fails: it is still
    // assessed from the observations it already has.
    let mut store = MemStore {
        locations: vec![location(1, 6.0, 0), location(2, 6.0, 0)],
        weather: vec![past_obs(2, 2, 5.0)],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![2.0],
        rainfall_1h_mm: 1.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.assessments_created, 2);
    assert_eq!(summary.location_failures, 0);
}

#[test]
fn running_two_cycles_appends_one_assessment_per_location_each() {
    let mut store = MemStore {
        locations: vec![location(1, 6.0, 0)],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 0.0,
    };
    let transport = RecordingTransport::new();

    run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();
    run_cycle(
        &mut store,
        &provider,
        &transport,
        fixed_now() + Duration::minutes(30),
    )
    .unwrap();

    assert_eq!(store.assessments.len(), 2, "append-only, one per cycle");
}

#[test]
fn unreachable_location_directory_aborts_the_cycle_without_writes() {
    let mut store = MemStore {
        directory_down: true,
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 0.0,
    };
    let transport = RecordingTransport::new();

    let err = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap_err();

    assert!(matches!(err, CycleError::DirectoryUnavailable(_)));
    assert!(store.weather.is_empty());
    assert!(store.assessments.is_empty());
}

// ---------------------------------------------------------------------------
// Scoring through the full stack
// ---------------------------------------------------------------------------

#[test]
fn heavy_monsoon_cycle_scores_critical_and_writes_aggregates() {
    // Seeded history plus this cycle's 10mm reading gives 180mm/24h and
    // 350mm/72h; with 3m elevation, 5 floods, and June that is 13 points.
    let mut store = MemStore {
        locations: vec![location(1, 3.0, 5)],
        weather: vec![
            past_obs(1, 2, 80.0),
            past_obs(1, 10, 90.0),
            past_obs(1, 30, 100.0),
            past_obs(1, 50, 70.0),
        ],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 10.0,
    };
    let transport = RecordingTransport::new();

    run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    let assessment = &store.assessments[0];
    assert_eq!(assessment.score, 13);
    assert_eq!(assessment.level, RiskLevel::Critical);
    assert_eq!(assessment.rainfall_24h_mm, 180.0);
    assert_eq!(assessment.rainfall_72h_mm, 350.0);

    // Aggregates landed on the newest row only.
    let latest = store
        .weather
        .iter()
        .max_by_key(|o| o.timestamp)
        .expect("cycle stored an observation");
    assert_eq!(latest.rainfall_24h_mm, Some(180.0));
    assert_eq!(latest.rainfall_72h_mm, Some(350.0));
    let seeded = store
        .weather
        .iter()
        .filter(|o| o.rainfall_24h_mm.is_some())
        .count();
    assert_eq!(seeded, 1, "older rows keep unset aggregates");
}

// ---------------------------------------------------------------------------
// Dispatch through the full stack
// ---------------------------------------------------------------------------

#[test]
fn subscribers_are_matched_by_threshold_and_messages_carry_the_details() {
    let mut store = MemStore {
        locations: vec![location(1, 3.0, 5)],
        weather: vec![
            past_obs(1, 2, 80.0),
            past_obs(1, 10, 90.0),
            past_obs(1, 30, 100.0),
            past_obs(1, 50, 70.0),
        ],
        subscriptions: vec![
            subscription(1, 1, "moderate@example.org", RiskLevel::Moderate),
            subscription(2, 1, "critical@example.org", RiskLevel::Critical),
        ],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 10.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    // CRITICAL assessment reaches both thresholds.
    assert_eq!(summary.alerts_sent, 2);
    let deliveries = transport.deliveries.borrow();
    let (_, subject, body) = &deliveries[0];
    assert_eq!(subject, "Flood Alert - CRITICAL Risk");
    assert!(body.contains("Location: Location 1"));
    assert!(body.contains("Rainfall (24h): 180.0 mm"));
    assert!(body.contains("Evacuate immediately"));

    // One alert row per subscriber, all marked sent, carrying the same body.
    assert_eq!(store.alerts.len(), 2);
    assert!(store.alerts.iter().all(|a| a.status == AlertStatus::Sent));
    assert!(store.alerts.iter().all(|a| a.assessment_id == store.assessments[0].id));
    assert!(store.alerts.iter().all(|a| a.location_id == 1));
    assert!(store.alerts.iter().all(|a| a.message == *body));
}

#[test]
fn high_threshold_subscriber_is_not_notified_for_a_moderate_cycle() {
    // 60mm/24h on a 12m location with 2 floods in June: 1+0+1+1+2 = 5.
    let mut store = MemStore {
        locations: vec![location(1, 12.0, 2)],
        weather: vec![past_obs(1, 3, 55.0)],
        subscriptions: vec![
            subscription(1, 1, "high@example.org", RiskLevel::High),
            subscription(2, 1, "low@example.org", RiskLevel::Low),
        ],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 5.0,
    };
    let transport = RecordingTransport::new();

    run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(store.assessments[0].level, RiskLevel::Moderate);
    let deliveries = transport.deliveries.borrow();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0.address(), "low@example.org");
}

#[test]
fn low_threshold_subscriber_receives_a_dispatch_even_at_low() {
    // Dry February-equivalent: no rainfall, high elevation, no history. The
    // June instant still adds the season factor, so use a dry-season month.
    let january_dry = Utc.with_ymd_and_hms(2025, 2, 10, 12, 0, 0).unwrap();
    let mut store = MemStore {
        locations: vec![location(1, 40.0, 0)],
        subscriptions: vec![subscription(1, 1, "low@example.org", RiskLevel::Low)],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 0.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, january_dry).unwrap();

    assert_eq!(store.assessments[0].level, RiskLevel::Low);
    assert_eq!(summary.alerts_sent, 1);
    assert_eq!(
        transport.deliveries.borrow()[0].1,
        "Flood Alert - LOW Risk"
    );
}

#[test]
fn a_failed_send_marks_its_alert_failed_and_the_cycle_still_succeeds() {
    let mut store = MemStore {
        locations: vec![location(1, 3.0, 5)],
        weather: vec![past_obs(1, 2, 200.0)],
        subscriptions: vec![
            subscription(1, 1, "down@example.org", RiskLevel::Low),
            subscription(2, 1, "up@example.org", RiskLevel::Low),
        ],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 10.0,
    };
    let transport = RecordingTransport {
        failing_addresses: vec!["down@example.org".to_string()],
        deliveries: RefCell::new(vec![]),
    };

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(summary.alerts_sent, 1);
    assert_eq!(summary.alerts_failed, 1);
    assert_eq!(summary.location_failures, 0, "transport failure is not a location failure");

    let status_of = |addr: &str| {
        store
            .alerts
            .iter()
            .find(|a| a.contact.address() == addr)
            .map(|a| a.status)
    };
    assert_eq!(status_of("down@example.org"), Some(AlertStatus::Failed));
    assert_eq!(status_of("up@example.org"), Some(AlertStatus::Sent));
}

#[test]
fn inactive_subscriptions_are_never_dispatched() {
    let mut inactive = subscription(1, 1, "inactive@example.org", RiskLevel::Low);
    inactive.is_active = false;
    let mut store = MemStore {
        locations: vec![location(1, 3.0, 5)],
        weather: vec![past_obs(1, 2, 200.0)],
        subscriptions: vec![inactive],
        ..MemStore::default()
    };
    let provider = ScriptedProvider {
        failing_lats: vec![],
        rainfall_1h_mm: 10.0,
    };
    let transport = RecordingTransport::new();

    let summary = run_cycle(&mut store, &provider, &transport, fixed_now()).unwrap();

    assert_eq!(summary.alerts_sent, 0);
    assert!(store.alerts.is_empty());
}
