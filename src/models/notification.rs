//! Per-student notification preferences

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const MIN_REMINDER_MINUTES: i32 = 1;
pub const MAX_REMINDER_MINUTES: i32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NotificationSettings {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub custom_reminder_minutes: i32,
    pub enable_push_notifications: bool,
    pub enable_sound_alerts: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNotificationSettingsRequest {
    pub custom_reminder_minutes: Option<i32>,
    pub enable_push_notifications: Option<bool>,
    pub enable_sound_alerts: Option<bool>,
}
