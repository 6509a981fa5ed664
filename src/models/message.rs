//! Scheduled parent message model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Scheduled,
    /// Claimed by a sweep that is delivering it
    Sending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Scheduled => "scheduled",
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MessageStatus::Scheduled),
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            other => Err(ParseEnumError::new("message status", other)),
        }
    }
}

impl TryFrom<String> for MessageStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScheduledMessage {
    pub id: Uuid,
    pub student_name: String,
    pub parent_email: String,
    pub subject: String,
    pub message_content: String,
    pub scheduled_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledMessageRequest {
    pub student_name: String,
    pub parent_email: String,
    pub subject: String,
    pub message_content: String,
    pub scheduled_date: DateTime<Utc>,
}

impl CreateScheduledMessageRequest {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> ScheduledMessage {
        ScheduledMessage {
            id,
            student_name: self.student_name,
            parent_email: self.parent_email,
            subject: self.subject,
            message_content: self.message_content,
            scheduled_date: self.scheduled_date,
            status: MessageStatus::Scheduled,
            sent_at: None,
            error: None,
            created_at: now,
        }
    }
}

/// Per-message result of a delivery sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub id: Uuid,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub processed: usize,
    pub results: Vec<DeliveryResult>,
}
