//! Pass session repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::pass::{NewPassSession, PassSession, PassStatus};
use crate::pass::PassClosure;
use crate::utils::errors::{Result, TeachersPetError};

/// Partial unique index allowing one OPEN session per student
pub const ONE_OPEN_PER_STUDENT: &str = "pass_sessions_one_open_per_student";

const SESSION_COLUMNS: &str = "id, student_name, student_email, destination, start_time, end_time, duration_minutes, \
     status, overtime, return_code_entered, return_code_validated, teacher_notes, pre_assigned_pass_id, created_at";

#[derive(Clone, Debug)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an OPEN session; the partial unique index rejects a second one
    pub async fn create(&self, session: NewPassSession, now: DateTime<Utc>) -> Result<PassSession> {
        let student = session.student_email.clone();
        let result = sqlx::query_as::<_, PassSession>(&format!(
            r#"
            INSERT INTO pass_sessions
                (id, student_name, student_email, destination, start_time, status, pre_assigned_pass_id, created_at)
            VALUES ($1, $2, $3, $4, $5, 'OPEN', $6, $7)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(session.student_name)
        .bind(session.student_email)
        .bind(session.destination.as_str())
        .bind(session.start_time)
        .bind(session.pre_assigned_pass_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(ONE_OPEN_PER_STUDENT) => {
                Err(TeachersPetError::ActivePassExists { student })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Close a session only while it is still OPEN
    pub async fn close(&self, id: Uuid, closure: PassClosure) -> Result<PassSession> {
        let target = closure.status;
        let closed = sqlx::query_as::<_, PassSession>(&format!(
            r#"
            UPDATE pass_sessions
            SET end_time = $2,
                duration_minutes = $3,
                overtime = $4,
                status = $5,
                return_code_entered = $6,
                return_code_validated = $7
            WHERE id = $1 AND status = 'OPEN'
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(closure.end_time)
        .bind(closure.duration_minutes)
        .bind(closure.overtime)
        .bind(closure.status.as_str())
        .bind(closure.return_code_entered)
        .bind(closure.return_code_validated)
        .fetch_optional(&self.pool)
        .await?;

        match closed {
            Some(session) => Ok(session),
            None => match self.find_by_id(id).await? {
                Some(current) => Err(TeachersPetError::InvalidStateTransition {
                    from: current.status.to_string(),
                    to: target.to_string(),
                }),
                None => Err(TeachersPetError::not_found("pass session", id)),
            },
        }
    }

    pub async fn set_notes(&self, id: Uuid, notes: &str) -> Result<PassSession> {
        sqlx::query_as::<_, PassSession>(&format!(
            "UPDATE pass_sessions SET teacher_notes = $2 WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TeachersPetError::not_found("pass session", id))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PassSession>> {
        let session = sqlx::query_as::<_, PassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pass_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find_open(&self, email: &str) -> Result<Option<PassSession>> {
        let session = sqlx::query_as::<_, PassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pass_sessions WHERE student_email = $1 AND status = $2"
        ))
        .bind(email)
        .bind(PassStatus::Open.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn list_open(&self) -> Result<Vec<PassSession>> {
        let sessions = sqlx::query_as::<_, PassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pass_sessions WHERE status = $1 ORDER BY start_time DESC"
        ))
        .bind(PassStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<PassSession>> {
        let sessions = sqlx::query_as::<_, PassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pass_sessions ORDER BY start_time DESC, created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PassSession>> {
        let sessions = sqlx::query_as::<_, PassSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM pass_sessions
            WHERE start_time >= $1 AND start_time < $2
            ORDER BY start_time DESC, created_at DESC
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_for_student(&self, email: &str, limit: i64) -> Result<Vec<PassSession>> {
        let sessions = sqlx::query_as::<_, PassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pass_sessions WHERE student_email = $1 ORDER BY start_time DESC LIMIT $2"
        ))
        .bind(email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}
