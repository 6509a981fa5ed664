//! Attendance check-in and parent contact routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::middleware::{AuthContext, TeacherContext};
use crate::models::*;
use crate::utils::errors::Result;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub date: Option<NaiveDate>,
}

pub async fn check_in(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<DailyAttendance>)> {
    let record = state.services.attendance.check_in(&user, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn today(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
) -> Result<Json<Option<DailyAttendance>>> {
    Ok(Json(state.services.attendance.todays_check_in(&user).await?))
}

pub async fn roster(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Query(query): Query<RosterQuery>,
) -> Result<Json<AttendanceRoster>> {
    Ok(Json(state.services.attendance.roster(query.date).await?))
}

pub async fn save_parent_preference(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Json(request): Json<SaveParentPreferenceRequest>,
) -> Result<Json<ParentContactPreference>> {
    Ok(Json(state.services.attendance.save_parent_preference(&teacher, request).await?))
}

pub async fn parent_preference(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Path(email): Path<String>,
) -> Result<Json<ParentContactPreference>> {
    Ok(Json(state.services.attendance.parent_preference(&email).await?))
}

pub async fn notify_absences(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
) -> Result<Json<AbsenceSweepSummary>> {
    Ok(Json(state.services.attendance.notify_absences(&teacher).await?))
}
