//! Monthly report generation

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::config::Settings;
use crate::database::PassStore;
use crate::models::MonthlyReport;
use crate::pass::report::{aggregate, ReportWindow};
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::logging::{log_admin_action, log_database_operation};

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl ReportService {
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self { store, clock, settings }
    }

    /// Aggregate the previous calendar month and store it under its `YYYY-MM` key.
    ///
    /// Regenerating a month overwrites its statistics but keeps the report id.
    pub async fn generate_monthly_report(&self, requested_by: Option<&str>) -> Result<MonthlyReport> {
        let now = self.clock.now();
        let window = ReportWindow::previous_month(now, &self.settings.school_offset());
        let started = Instant::now();

        let sessions = self.store.list_sessions_between(window.start, window.end).await?;
        let students = self.store.list_student_data().await?;
        let report = aggregate(&window, &sessions, &students, Uuid::new_v4(), now);
        let stored = self.store.upsert_monthly_report(&report).await?;

        log_database_operation("upsert", "monthly_reports", started.elapsed().as_millis() as u64, true);
        info!(
            month = %stored.month,
            total_passes = stored.total_passes,
            overtime = stored.overtime_count,
            "Monthly report generated"
        );
        if let Some(admin) = requested_by {
            log_admin_action(admin, "generate_monthly_report", Some(stored.month.as_str()), None);
        }
        Ok(stored)
    }

    pub async fn list_reports(&self) -> Result<Vec<MonthlyReport>> {
        self.store.list_monthly_reports().await
    }

    pub async fn find_report(&self, month: &str) -> Result<MonthlyReport> {
        self.store
            .find_monthly_report(month)
            .await?
            .ok_or_else(|| TeachersPetError::not_found("monthly report", month))
    }
}
