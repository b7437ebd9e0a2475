//! Subscriber notification.
//!
//! The [`NotificationTransport`] trait is the seam between the dispatcher and
//! the outside world; email and SMS are handled uniformly behind it. The
//! production [`Notifier`] routes by contact channel to an SMTP mailer
//! (`notify::email`) and an HTTP SMS gateway (`notify::sms`); tests
//! substitute a recording fake.

pub mod email;
pub mod sms;

use crate::model::{Contact, RiskLevel, TransportError};
use crate::risk::rules::level_rule;

/// Delivers one message to one contact. Implementations apply bounded
/// per-call timeouts; a hung send must not stall the dispatch loop.
pub trait NotificationTransport {
    fn send(&self, contact: &Contact, subject: &str, body: &str) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Message template
// ---------------------------------------------------------------------------

/// A rendered alert message.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Renders the subscriber alert for a location at a given level.
pub fn flood_alert_message(
    location_name: &str,
    level: RiskLevel,
    rainfall_24h_mm: f64,
) -> AlertMessage {
    let advisory = level_rule(level).action;
    AlertMessage {
        subject: format!("Flood Alert - {} Risk", level),
        body: format!(
            "Flood Alert\n\n\
             Location: {}\n\
             Risk Level: {}\n\
             Rainfall (24h): {:.1} mm\n\n\
             {}.\n\n\
             - FloodSense",
            location_name, level, rainfall_24h_mm, advisory
        ),
    }
}

// ---------------------------------------------------------------------------
// Channel router
// ---------------------------------------------------------------------------

/// Routes contacts to the configured channel transports. A channel left
/// unconfigured fails sends on that channel (the alert row records it), but
/// never the pipeline.
pub struct Notifier {
    pub email: Option<email::EmailTransport>,
    pub sms: Option<sms::SmsGateway>,
}

impl NotificationTransport for Notifier {
    fn send(&self, contact: &Contact, subject: &str, body: &str) -> Result<(), TransportError> {
        match contact {
            Contact::Email(addr) => match &self.email {
                Some(mailer) => mailer.send_mail(addr, subject, body),
                None => Err(TransportError::Send("email transport not configured".into())),
            },
            Contact::Sms(number) => match &self.sms {
                Some(gateway) => gateway.send_sms(number, body),
                None => Err(TransportError::Send("sms gateway not configured".into())),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_message_embeds_location_level_and_rainfall() {
        let msg = flood_alert_message("Wellampitiya", RiskLevel::Critical, 182.4);
        assert_eq!(msg.subject, "Flood Alert - CRITICAL Risk");
        assert!(msg.body.contains("Location: Wellampitiya"));
        assert!(msg.body.contains("Risk Level: CRITICAL"));
        assert!(msg.body.contains("Rainfall (24h): 182.4 mm"));
        assert!(
            msg.body.contains("Evacuate immediately"),
            "body should carry the level's advisory action"
        );
    }

    #[test]
    fn test_alert_message_low_level_uses_low_advisory() {
        let msg = flood_alert_message("Gampaha", RiskLevel::Low, 4.0);
        assert!(msg.subject.contains("LOW"));
        assert!(msg.body.contains("Normal conditions"));
    }

    #[test]
    fn test_unconfigured_channels_fail_the_send_not_the_process() {
        let notifier = Notifier {
            email: None,
            sms: None,
        };
        let err = notifier
            .send(
                &Contact::Email("someone@example.org".into()),
                "subject",
                "body",
            )
            .unwrap_err();
        assert!(matches!(err, TransportError::Send(_)));

        let err = notifier
            .send(&Contact::Sms("+94770000000".into()), "subject", "body")
            .unwrap_err();
        assert!(matches!(err, TransportError::Send(_)));
    }
}
