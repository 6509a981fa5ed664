//! Scheduled parent message repository

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::message::{CreateScheduledMessageRequest, MessageStatus, ScheduledMessage};
use crate::utils::errors::{Result, TeachersPetError};

const MESSAGE_COLUMNS: &str = "id, student_name, parent_email, subject, message_content, scheduled_date, status, \
     sent_at, error, created_at";

#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateScheduledMessageRequest, now: DateTime<Utc>) -> Result<ScheduledMessage> {
        let message = sqlx::query_as::<_, ScheduledMessage>(&format!(
            r#"
            INSERT INTO scheduled_messages
                (id, student_name, parent_email, subject, message_content, scheduled_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.student_name)
        .bind(request.parent_email)
        .bind(request.subject)
        .bind(request.message_content)
        .bind(request.scheduled_date)
        .bind(MessageStatus::Scheduled.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledMessage>> {
        let message = sqlx::query_as::<_, ScheduledMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM scheduled_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        let messages = sqlx::query_as::<_, ScheduledMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM scheduled_messages
            WHERE status = $1 AND scheduled_date <= $2
            ORDER BY scheduled_date
            "#
        ))
        .bind(MessageStatus::Scheduled.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Atomically move a due message to `sending`; false if someone else got it
    pub async fn claim(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE scheduled_messages SET status = $2 WHERE id = $1 AND status = $3")
            .bind(id)
            .bind(MessageStatus::Sending.as_str())
            .bind(MessageStatus::Scheduled.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE scheduled_messages SET status = $2, sent_at = $3, error = NULL WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(MessageStatus::Sent.as_str())
        .bind(sent_at)
        .bind(MessageStatus::Sending.as_str())
        .execute(&self.pool)
        .await?;

        self.expect_claimed(id, result.rows_affected()).await
    }

    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let result = sqlx::query("UPDATE scheduled_messages SET status = $2, error = $3 WHERE id = $1 AND status = $4")
            .bind(id)
            .bind(MessageStatus::Failed.as_str())
            .bind(error)
            .bind(MessageStatus::Sending.as_str())
            .execute(&self.pool)
            .await?;

        self.expect_claimed(id, result.rows_affected()).await
    }

    async fn expect_claimed(&self, id: Uuid, rows_affected: u64) -> Result<()> {
        if rows_affected == 1 {
            return Ok(());
        }
        match self.find_by_id(id).await? {
            Some(message) => Err(TeachersPetError::InvalidStateTransition {
                from: message.status.to_string(),
                to: "delivered".to_string(),
            }),
            None => Err(TeachersPetError::not_found("scheduled message", id)),
        }
    }
}
