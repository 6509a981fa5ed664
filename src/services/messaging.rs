//! Scheduled parent messages
//!
//! Teachers queue emails for a future date. A sweep, run by the scheduler
//! or on demand, delivers every due message at most once and records the
//! outcome on the message itself. Each message is claimed in the store
//! before the email goes out, so overlapping sweeps never both send it.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::FeaturesConfig;
use crate::database::PassStore;
use crate::models::*;
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::{is_valid_email, normalize_email};
use crate::utils::logging::{log_admin_action, log_api_error};

use super::email::EmailService;

#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    email: EmailService,
    features: FeaturesConfig,
}

impl MessagingService {
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, email: EmailService, features: FeaturesConfig) -> Self {
        Self {
            store,
            clock,
            email,
            features,
        }
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.features.scheduled_messages {
            Ok(())
        } else {
            Err(TeachersPetError::ServiceUnavailable("scheduled messages are disabled".to_string()))
        }
    }

    pub async fn schedule(&self, teacher: &User, mut request: CreateScheduledMessageRequest) -> Result<ScheduledMessage> {
        self.ensure_enabled()?;

        request.parent_email = normalize_email(&request.parent_email);
        if !is_valid_email(&request.parent_email) {
            return Err(TeachersPetError::InvalidInput(format!("Invalid parent email: {}", request.parent_email)));
        }
        if request.subject.trim().is_empty() {
            return Err(TeachersPetError::InvalidInput("Subject is required".to_string()));
        }
        if request.message_content.trim().is_empty() {
            return Err(TeachersPetError::InvalidInput("Message content is required".to_string()));
        }

        let message = self.store.create_scheduled_message(request, self.clock.now()).await?;
        log_admin_action(
            &teacher.email,
            "schedule_message",
            Some(message.parent_email.as_str()),
            Some(message.scheduled_date.to_rfc3339().as_str()),
        );
        Ok(message)
    }

    /// Deliver every scheduled message whose date has passed
    pub async fn sweep(&self) -> Result<SweepSummary> {
        self.ensure_enabled()?;

        let due = self.store.list_due_messages(self.clock.now()).await?;
        let mut results = Vec::with_capacity(due.len());

        for message in due {
            if !self.store.claim_message(message.id).await? {
                debug!(message_id = %message.id, "Message claimed by another sweep");
                continue;
            }

            match self.email.send(&message.parent_email, &message.subject, &message.message_content).await {
                Ok(()) => {
                    self.store.mark_message_sent(message.id, self.clock.now()).await?;
                    debug!(message_id = %message.id, "Scheduled message sent");
                    results.push(DeliveryResult {
                        id: message.id,
                        status: MessageStatus::Sent,
                        error: None,
                    });
                }
                Err(e) => {
                    let error = e.to_string();
                    log_api_error("email", &error, Some(message.id.to_string().as_str()));
                    self.store.mark_message_failed(message.id, &error).await?;
                    results.push(DeliveryResult {
                        id: message.id,
                        status: MessageStatus::Failed,
                        error: Some(error),
                    });
                }
            }
        }

        if !results.is_empty() {
            let failed = results.iter().filter(|r| r.status == MessageStatus::Failed).count();
            info!(processed = results.len(), failed, "Scheduled message sweep finished");
        }
        Ok(SweepSummary {
            processed: results.len(),
            results,
        })
    }

    pub async fn find(&self, id: uuid::Uuid) -> Result<ScheduledMessage> {
        self.store
            .find_scheduled_message(id)
            .await?
            .ok_or_else(|| TeachersPetError::not_found("scheduled message", id))
    }
}
