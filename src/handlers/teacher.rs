//! Teacher routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::TeacherContext;
use crate::models::*;
use crate::pass::ReturnCode;
use crate::utils::errors::Result;
use crate::utils::helpers::normalize_email;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

pub async fn return_code(State(state): State<AppState>, TeacherContext(_): TeacherContext) -> Json<ReturnCode> {
    Json(state.services.passes.return_code())
}

pub async fn open_passes(State(state): State<AppState>, TeacherContext(_): TeacherContext) -> Result<Json<Vec<PassSession>>> {
    Ok(Json(state.services.passes.open_passes().await?))
}

pub async fn recent_passes(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<PassSession>>> {
    Ok(Json(state.services.passes.recent_passes(query.limit).await?))
}

pub async fn set_notes(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Path(id): Path<Uuid>,
    Json(request): Json<TeacherNoteRequest>,
) -> Result<Json<PassSession>> {
    let session = state.services.passes.set_notes(&teacher, id, &request.notes).await?;
    Ok(Json(session))
}

pub async fn list_students(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
) -> Result<Json<Vec<PassDataSummary>>> {
    Ok(Json(state.services.students.list_students().await?))
}

pub async fn student_transactions(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Path(email): Path<String>,
) -> Result<Json<Vec<PbisTransaction>>> {
    let email = normalize_email(&email);
    Ok(Json(state.services.students.transactions(&email).await?))
}

pub async fn monthly_reset(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
) -> Result<Json<Vec<ResetOutcome>>> {
    Ok(Json(state.services.students.monthly_reset(&teacher).await?))
}

pub async fn award_points(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Json(request): Json<AwardPointsRequest>,
) -> Result<Json<PassDataSummary>> {
    Ok(Json(state.services.students.award_points(&teacher, request).await?))
}

pub async fn list_pre_assigned(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
) -> Result<Json<Vec<PreAssignedPass>>> {
    Ok(Json(state.services.students.list_pre_assigned().await?))
}

pub async fn create_pre_assigned(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Json(request): Json<CreatePreAssignedRequest>,
) -> Result<(StatusCode, Json<PreAssignedPass>)> {
    let pass = state.services.students.create_pre_assigned(&teacher, request).await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

pub async fn review_pre_assigned(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewPreAssignedRequest>,
) -> Result<Json<PreAssignedPass>> {
    Ok(Json(state.services.students.review_pre_assigned(&teacher, id, request).await?))
}
