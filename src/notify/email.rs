//! SMTP email delivery for subscriber alerts.
//!
//! Wraps the `lettre` blocking SMTP transport. Credentials are optional so a
//! local relay without auth works in development.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::model::TransportError;

/// Default submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// RFC 5322 "From" address on outgoing alerts.
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

pub struct EmailTransport {
    transport: SmtpTransport,
    from_address: String,
}

impl EmailTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let mut builder = SmtpTransport::starttls_relay(&settings.host)
            .map_err(|e| TransportError::Send(e.to_string()))?
            .port(settings.port)
            .timeout(Some(settings.timeout));

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(EmailTransport {
            transport: builder.build(),
            from_address: settings.from_address.clone(),
        })
    }

    /// Sends one plain-text alert email.
    pub fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let from = self
            .from_address
            .parse()
            .map_err(|_| TransportError::BadAddress(self.from_address.clone()))?;
        let to = to
            .parse()
            .map_err(|_| TransportError::BadAddress(to.to_string()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| TransportError::Send(e.to_string()))?;

        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
