//! Monthly report repository

use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::report::MonthlyReport;
use crate::utils::errors::Result;

const REPORT_COLUMNS: &str = "id, month, total_passes, average_duration_minutes, overtime_count, unconfirmed_returns, \
     destination_breakdown, pbis_points_awarded, passes_purchased, top_users, generated_at";

#[derive(Clone, Debug)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One row per month; regenerating replaces the figures in place
    pub async fn upsert(&self, report: &MonthlyReport) -> Result<MonthlyReport> {
        let saved = sqlx::query_as::<_, MonthlyReport>(&format!(
            r#"
            INSERT INTO monthly_reports
                (id, month, total_passes, average_duration_minutes, overtime_count, unconfirmed_returns,
                 destination_breakdown, pbis_points_awarded, passes_purchased, top_users, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (month) DO UPDATE
            SET total_passes = EXCLUDED.total_passes,
                average_duration_minutes = EXCLUDED.average_duration_minutes,
                overtime_count = EXCLUDED.overtime_count,
                unconfirmed_returns = EXCLUDED.unconfirmed_returns,
                destination_breakdown = EXCLUDED.destination_breakdown,
                pbis_points_awarded = EXCLUDED.pbis_points_awarded,
                passes_purchased = EXCLUDED.passes_purchased,
                top_users = EXCLUDED.top_users,
                generated_at = EXCLUDED.generated_at
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.id)
        .bind(&report.month)
        .bind(report.total_passes)
        .bind(report.average_duration_minutes)
        .bind(report.overtime_count)
        .bind(report.unconfirmed_returns)
        .bind(Json(&report.destination_breakdown))
        .bind(report.pbis_points_awarded)
        .bind(report.passes_purchased)
        .bind(Json(&report.top_users))
        .bind(report.generated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    pub async fn find_by_month(&self, month: &str) -> Result<Option<MonthlyReport>> {
        let report = sqlx::query_as::<_, MonthlyReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM monthly_reports WHERE month = $1"
        ))
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    pub async fn list(&self) -> Result<Vec<MonthlyReport>> {
        let reports = sqlx::query_as::<_, MonthlyReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM monthly_reports ORDER BY month DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}
