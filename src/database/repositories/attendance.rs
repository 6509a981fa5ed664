//! Attendance and parent contact preference repository

use sqlx::PgPool;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::attendance::{DailyAttendance, ParentContactPreference};
use crate::utils::errors::{Result, TeachersPetError};

/// Unique constraint allowing one check-in per student per day
pub const ONE_CHECK_IN_PER_DAY: &str = "daily_attendance_one_per_day";

const ATTENDANCE_COLUMNS: &str = "id, student_name, student_email, check_in_date, check_in_time, daily_question, \
     student_answer, status";

const PREFERENCE_COLUMNS: &str = "id, student_name, student_email, parent_email, parent_phone, notify_on_absence, \
     notify_on_referral, notify_on_failing, notify_on_updates, preferred_contact_method, last_absence_notice, \
     created_at, updated_at";

#[derive(Clone, Debug)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, record: DailyAttendance) -> Result<DailyAttendance> {
        let result = sqlx::query_as::<_, DailyAttendance>(&format!(
            r#"
            INSERT INTO daily_attendance
                (id, student_name, student_email, check_in_date, check_in_time, daily_question, student_answer, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(record.id)
        .bind(&record.student_name)
        .bind(&record.student_email)
        .bind(record.check_in_date)
        .bind(record.check_in_time)
        .bind(&record.daily_question)
        .bind(&record.student_answer)
        .bind(record.status.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(ONE_CHECK_IN_PER_DAY) => {
                Err(TeachersPetError::Conflict(format!(
                    "{} already checked in on {}",
                    record.student_email, record.check_in_date
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find(&self, email: &str, date: NaiveDate) -> Result<Option<DailyAttendance>> {
        let record = sqlx::query_as::<_, DailyAttendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM daily_attendance WHERE student_email = $1 AND check_in_date = $2"
        ))
        .bind(email)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>> {
        let records = sqlx::query_as::<_, DailyAttendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM daily_attendance WHERE check_in_date = $1 ORDER BY check_in_time"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn upsert_preference(&self, preference: &ParentContactPreference) -> Result<ParentContactPreference> {
        let saved = sqlx::query_as::<_, ParentContactPreference>(&format!(
            r#"
            INSERT INTO parent_contact_preferences
                (id, student_name, student_email, parent_email, parent_phone, notify_on_absence, notify_on_referral,
                 notify_on_failing, notify_on_updates, preferred_contact_method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (student_email) DO UPDATE
            SET student_name = EXCLUDED.student_name,
                parent_email = EXCLUDED.parent_email,
                parent_phone = EXCLUDED.parent_phone,
                notify_on_absence = EXCLUDED.notify_on_absence,
                notify_on_referral = EXCLUDED.notify_on_referral,
                notify_on_failing = EXCLUDED.notify_on_failing,
                notify_on_updates = EXCLUDED.notify_on_updates,
                preferred_contact_method = EXCLUDED.preferred_contact_method,
                updated_at = EXCLUDED.updated_at
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(preference.id)
        .bind(&preference.student_name)
        .bind(&preference.student_email)
        .bind(&preference.parent_email)
        .bind(&preference.parent_phone)
        .bind(preference.notify_on_absence)
        .bind(preference.notify_on_referral)
        .bind(preference.notify_on_failing)
        .bind(preference.notify_on_updates)
        .bind(preference.preferred_contact_method.as_str())
        .bind(preference.created_at)
        .bind(preference.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    pub async fn find_preference(&self, student_email: &str) -> Result<Option<ParentContactPreference>> {
        let preference = sqlx::query_as::<_, ParentContactPreference>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM parent_contact_preferences WHERE student_email = $1"
        ))
        .bind(student_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preference)
    }

    pub async fn list_preferences(&self) -> Result<Vec<ParentContactPreference>> {
        let preferences = sqlx::query_as::<_, ParentContactPreference>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM parent_contact_preferences ORDER BY student_email"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(preferences)
    }

    /// Advance the notice date unless that day was already claimed
    pub async fn claim_absence_notice(&self, id: Uuid, date: NaiveDate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parent_contact_preferences SET last_absence_notice = $2
            WHERE id = $1 AND (last_absence_notice IS NULL OR last_absence_notice < $2)
            "#,
        )
        .bind(id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM parent_contact_preferences WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(TeachersPetError::not_found("parent contact preference", id)),
        }
    }
}
