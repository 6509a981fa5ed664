//! Monthly report routes

use axum::extract::{Path, State};
use axum::Json;

use crate::middleware::TeacherContext;
use crate::models::MonthlyReport;
use crate::utils::errors::Result;

use super::AppState;

pub async fn generate_report(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
) -> Result<Json<MonthlyReport>> {
    let report = state.services.reports.generate_monthly_report(Some(&teacher.email)).await?;
    Ok(Json(report))
}

pub async fn list_reports(State(state): State<AppState>, TeacherContext(_): TeacherContext) -> Result<Json<Vec<MonthlyReport>>> {
    Ok(Json(state.services.reports.list_reports().await?))
}

pub async fn find_report(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Path(month): Path<String>,
) -> Result<Json<MonthlyReport>> {
    Ok(Json(state.services.reports.find_report(&month).await?))
}
