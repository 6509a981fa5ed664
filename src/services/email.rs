//! Outbound email integration
//!
//! Sends plain-text mail through an HTTP email API that accepts
//! `{ from, to, subject, text }` as JSON with a bearer key.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::IntegrationsConfig;
use crate::utils::errors::{IntegrationError, IntegrationResult, Result, TeachersPetError};
use crate::utils::helpers::truncate_text;

/// Longest slice of a provider's error body kept in an error message
pub const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

pub(crate) fn classify(error: reqwest::Error, failed: fn(String) -> IntegrationError) -> IntegrationError {
    if error.is_timeout() {
        IntegrationError::Timeout
    } else {
        failed(error.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct EmailService {
    client: Client,
    api_url: Option<String>,
    api_key: Option<String>,
    from: String,
}

impl EmailService {
    pub fn new(config: &IntegrationsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("TeachersPet/0.1")
            .build()
            .map_err(TeachersPetError::Http)?;

        Ok(Self {
            client,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> IntegrationResult<()> {
        let url = self.api_url.as_deref().ok_or(IntegrationError::NotConfigured("email"))?;
        debug!(to = %to, subject = %subject, "Sending email");

        let mut request = self.client.post(url).json(&OutgoingEmail {
            from: &self.from,
            to,
            subject,
            text: body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, IntegrationError::EmailFailed))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(IntegrationError::EmailFailed(format!(
                "HTTP {}: {}",
                status,
                truncate_text(&error_text, MAX_ERROR_BODY_CHARS)
            )));
        }

        info!(to = %to, "Email sent");
        Ok(())
    }
}
