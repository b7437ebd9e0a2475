//! Alert dispatch: subscriber matching, notification, and the alert log.
//!
//! Given a location's newly created risk assessment, finds every active
//! subscription whose minimum risk level is satisfied, renders the alert
//! message once per subscriber, records an `active` alert row, hands the
//! message to the notification transport, and marks the row `sent` or
//! `failed` from the outcome.
//!
//! Subscribers are independent: one failed send (or one failed alert-log
//! write) never blocks the others and never fails the pipeline run.

use crate::logging::{self, Component};
use crate::model::{AssessmentId, Location, PersistenceError, RiskLevel};
use crate::model::AlertStatus;
use crate::notify::{NotificationTransport, flood_alert_message};
use crate::store::{AlertLog, SubscriptionDirectory};

/// Per-location dispatch totals for the cycle summary.
#[derive(Debug, Default, PartialEq)]
pub struct DispatchSummary {
    /// Subscriptions whose threshold matched the assessment level.
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
    /// Matched subscriptions with no usable contact on file.
    pub skipped_no_contact: usize,
}

/// Notifies every matching subscriber for one assessment.
///
/// Only the subscription lookup itself propagates as an error (nothing to
/// iterate without it); everything after is contained per subscriber.
pub fn dispatch_alerts<S: SubscriptionDirectory + AlertLog>(
    store: &mut S,
    transport: &dyn NotificationTransport,
    location: &Location,
    assessment_id: AssessmentId,
    level: RiskLevel,
    rainfall_24h_mm: f64,
) -> Result<DispatchSummary, PersistenceError> {
    let subscriptions = store.find_active_matching(location.id, level)?;

    let mut summary = DispatchSummary::default();
    summary.matched = subscriptions.len();

    let message = flood_alert_message(&location.name, level, rainfall_24h_mm);

    for subscription in &subscriptions {
        let Some(contact) = subscription.contact() else {
            summary.skipped_no_contact += 1;
            logging::warn(
                Component::Dispatcher,
                Some(location.id),
                &format!("subscription {} has no contact on file", subscription.id),
            );
            continue;
        };

        let alert_id = match store.record_alert(
            location.id,
            assessment_id,
            &contact,
            &message.body,
            AlertStatus::Active,
        ) {
            Ok(id) => id,
            Err(err) => {
                summary.failed += 1;
                logging::error(Component::Store, Some(location.id), &err.to_string());
                continue;
            }
        };

        match transport.send(&contact, &message.subject, &message.body) {
            Ok(()) => {
                summary.sent += 1;
                if let Err(err) = store.mark_alert_status(alert_id, AlertStatus::Sent) {
                    logging::error(Component::Store, Some(location.id), &err.to_string());
                }
            }
            Err(err) => {
                summary.failed += 1;
                logging::warn(
                    Component::Dispatcher,
                    Some(location.id),
                    &format!("send to {} failed: {}", contact, err),
                );
                if let Err(err) = store.mark_alert_status(alert_id, AlertStatus::Failed) {
                    logging::error(Component::Store, Some(location.id), &err.to_string());
                }
            }
        }
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
