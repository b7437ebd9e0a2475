//! SMS delivery through an HTTP gateway.
//!
//! The operator points `sms.gateway_url` at whatever relay they use (a
//! Twilio proxy, a carrier aggregator); the gateway owns carrier specifics.
//! We POST a small JSON body and treat any non-2xx as a failed send.

use serde::Serialize;
use std::time::Duration;

use crate::model::TransportError;

#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
    to: &'a str,
    message: &'a str,
}

pub struct SmsGateway {
    http: reqwest::blocking::Client,
    gateway_url: String,
    auth_token: Option<String>,
}

impl SmsGateway {
    pub fn new(
        gateway_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(SmsGateway {
            http,
            gateway_url: gateway_url.to_string(),
            auth_token,
        })
    }

    /// Sends one SMS. Subject lines do not exist for SMS; the body already
    /// carries the full alert text.
    pub fn send_sms(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let mut request = self
            .http
            .post(&self.gateway_url)
            .json(&SmsRequest { to, message: body });

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Send(format!(
                "gateway returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}
