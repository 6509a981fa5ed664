//! Pre-assigned pass repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::pre_assigned::{CreatePreAssignedRequest, PreAssignedPass, PreAssignedStatus};
use crate::utils::errors::{Result, TeachersPetError};

const PASS_COLUMNS: &str = "id, student_name, student_email, destination, scheduled_date, reason, status, \
     teacher_notes, used_at, pass_session_id, created_at";

#[derive(Clone, Debug)]
pub struct PreAssignedRepository {
    pool: PgPool,
}

impl PreAssignedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreatePreAssignedRequest, now: DateTime<Utc>) -> Result<PreAssignedPass> {
        let pass = sqlx::query_as::<_, PreAssignedPass>(&format!(
            r#"
            INSERT INTO pre_assigned_passes
                (id, student_name, student_email, destination, scheduled_date, reason, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PASS_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.student_name)
        .bind(request.student_email)
        .bind(request.destination.as_str())
        .bind(request.scheduled_date)
        .bind(request.reason)
        .bind(PreAssignedStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(pass)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PreAssignedPass>> {
        let pass = sqlx::query_as::<_, PreAssignedPass>(&format!(
            "SELECT {PASS_COLUMNS} FROM pre_assigned_passes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pass)
    }

    pub async fn list(&self) -> Result<Vec<PreAssignedPass>> {
        let passes = sqlx::query_as::<_, PreAssignedPass>(&format!(
            "SELECT {PASS_COLUMNS} FROM pre_assigned_passes ORDER BY scheduled_date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(passes)
    }

    pub async fn list_for_student(&self, email: &str) -> Result<Vec<PreAssignedPass>> {
        let passes = sqlx::query_as::<_, PreAssignedPass>(&format!(
            "SELECT {PASS_COLUMNS} FROM pre_assigned_passes WHERE student_email = $1 ORDER BY scheduled_date DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(passes)
    }

    pub async fn update_status(&self, id: Uuid, status: PreAssignedStatus, notes: Option<String>) -> Result<PreAssignedPass> {
        sqlx::query_as::<_, PreAssignedPass>(&format!(
            r#"
            UPDATE pre_assigned_passes
            SET status = $2, teacher_notes = COALESCE($3, teacher_notes)
            WHERE id = $1
            RETURNING {PASS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TeachersPetError::not_found("pre-assigned pass", id))
    }

    /// Consume an approved pass
    pub async fn mark_used(&self, id: Uuid, session_id: Uuid, used_at: DateTime<Utc>) -> Result<PreAssignedPass> {
        let used = sqlx::query_as::<_, PreAssignedPass>(&format!(
            r#"
            UPDATE pre_assigned_passes
            SET status = 'used', used_at = $3, pass_session_id = $2
            WHERE id = $1 AND status = 'approved'
            RETURNING {PASS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(session_id)
        .bind(used_at)
        .fetch_optional(&self.pool)
        .await?;

        match used {
            Some(pass) => Ok(pass),
            None => match self.find_by_id(id).await? {
                Some(current) => Err(TeachersPetError::InvalidStateTransition {
                    from: current.status.to_string(),
                    to: PreAssignedStatus::Used.to_string(),
                }),
                None => Err(TeachersPetError::not_found("pre-assigned pass", id)),
            },
        }
    }
}
