//! Student pass data and PBIS transaction repository

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::student::{CreateStudentPassData, NewPbisTransaction, PbisTransaction, StudentPassData};
use crate::utils::errors::{Result, TeachersPetError};

const DATA_COLUMNS: &str = "id, student_name, student_email, monthly_pass_allowance, passes_used_this_month, \
     purchased_passes_this_month, unused_passes_last_month, pbis_points_balance, last_reset_date, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, student_name, student_email, points_delta, reason, description, created_at";

#[derive(Clone, Debug)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<StudentPassData>> {
        let data = sqlx::query_as::<_, StudentPassData>(&format!(
            "SELECT {DATA_COLUMNS} FROM student_pass_data WHERE student_email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(data)
    }

    /// Create the record, or return the existing one for the same email
    pub async fn get_or_create(&self, request: CreateStudentPassData, now: DateTime<Utc>) -> Result<StudentPassData> {
        let data = sqlx::query_as::<_, StudentPassData>(&format!(
            r#"
            INSERT INTO student_pass_data
                (id, student_name, student_email, monthly_pass_allowance, last_reset_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (student_email) DO UPDATE SET student_email = EXCLUDED.student_email
            RETURNING {DATA_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.student_name)
        .bind(request.student_email)
        .bind(request.monthly_pass_allowance)
        .bind(request.last_reset_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(data)
    }

    pub async fn save(&self, data: &StudentPassData) -> Result<StudentPassData> {
        sqlx::query_as::<_, StudentPassData>(&format!(
            r#"
            UPDATE student_pass_data
            SET monthly_pass_allowance = $2,
                passes_used_this_month = $3,
                purchased_passes_this_month = $4,
                unused_passes_last_month = $5,
                pbis_points_balance = $6,
                last_reset_date = $7,
                updated_at = $8
            WHERE student_email = $1
            RETURNING {DATA_COLUMNS}
            "#
        ))
        .bind(&data.student_email)
        .bind(data.monthly_pass_allowance)
        .bind(data.passes_used_this_month)
        .bind(data.purchased_passes_this_month)
        .bind(data.unused_passes_last_month)
        .bind(data.pbis_points_balance)
        .bind(data.last_reset_date)
        .bind(data.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TeachersPetError::not_found("student pass data", &data.student_email))
    }

    pub async fn list(&self) -> Result<Vec<StudentPassData>> {
        let all = sqlx::query_as::<_, StudentPassData>(&format!(
            "SELECT {DATA_COLUMNS} FROM student_pass_data ORDER BY student_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(all)
    }

    pub async fn record_transaction(&self, transaction: NewPbisTransaction, now: DateTime<Utc>) -> Result<PbisTransaction> {
        let record = sqlx::query_as::<_, PbisTransaction>(&format!(
            r#"
            INSERT INTO pbis_transactions (id, student_name, student_email, points_delta, reason, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(transaction.student_name)
        .bind(transaction.student_email)
        .bind(transaction.points_delta)
        .bind(transaction.reason.as_str())
        .bind(transaction.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_transactions(&self, email: &str) -> Result<Vec<PbisTransaction>> {
        let records = sqlx::query_as::<_, PbisTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM pbis_transactions WHERE student_email = $1 ORDER BY created_at DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
