//! Notification settings repository

use sqlx::PgPool;

use crate::models::notification::NotificationSettings;
use crate::utils::errors::Result;

const SETTINGS_COLUMNS: &str = "id, student_name, student_email, custom_reminder_minutes, \
     enable_push_notifications, enable_sound_alerts, updated_at";

#[derive(Clone, Debug)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<NotificationSettings>> {
        let settings = sqlx::query_as::<_, NotificationSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM notification_settings WHERE student_email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    pub async fn upsert(&self, settings: &NotificationSettings) -> Result<NotificationSettings> {
        let saved = sqlx::query_as::<_, NotificationSettings>(&format!(
            r#"
            INSERT INTO notification_settings
                (id, student_name, student_email, custom_reminder_minutes, enable_push_notifications, enable_sound_alerts, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (student_email) DO UPDATE
            SET student_name = EXCLUDED.student_name,
                custom_reminder_minutes = EXCLUDED.custom_reminder_minutes,
                enable_push_notifications = EXCLUDED.enable_push_notifications,
                enable_sound_alerts = EXCLUDED.enable_sound_alerts,
                updated_at = EXCLUDED.updated_at
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(settings.id)
        .bind(&settings.student_name)
        .bind(&settings.student_email)
        .bind(settings.custom_reminder_minutes)
        .bind(settings.enable_push_notifications)
        .bind(settings.enable_sound_alerts)
        .bind(settings.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
