//! Student routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::middleware::AuthContext;
use crate::models::*;
use crate::services::StudentService;
use crate::utils::errors::Result;

use super::AppState;

pub async fn me(AuthContext(user): AuthContext) -> Json<User> {
    Json(user)
}

pub async fn elevate(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
    Json(request): Json<ElevateRequest>,
) -> Result<Json<User>> {
    let user = state.services.auth.elevate(&user, &request.code).await?;
    Ok(Json(user))
}

pub async fn pass_data(State(state): State<AppState>, AuthContext(user): AuthContext) -> Result<Json<PassDataSummary>> {
    let data = state.services.students.pass_data(&user).await?;
    Ok(Json(StudentService::summarize(data)))
}

pub async fn start_pass(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
    Json(request): Json<StartPassRequest>,
) -> Result<(StatusCode, Json<PassSession>)> {
    let session = state.services.passes.start_pass(&user, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn active_pass(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
) -> Result<Json<Option<PassSession>>> {
    Ok(Json(state.services.passes.active_pass(&user).await?))
}

pub async fn end_pass(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
    Json(request): Json<EndPassRequest>,
) -> Result<Json<PassSession>> {
    let session = state.services.passes.end_pass(&user, &request.code).await?;
    Ok(Json(session))
}

pub async fn purchase_pass(State(state): State<AppState>, AuthContext(user): AuthContext) -> Result<Json<PassDataSummary>> {
    Ok(Json(state.services.students.purchase_pass(&user).await?))
}

pub async fn todays_pre_assigned(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
) -> Result<Json<Vec<PreAssignedPass>>> {
    Ok(Json(state.services.students.todays_pre_assigned(&user).await?))
}

pub async fn notification_settings(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
) -> Result<Json<NotificationSettings>> {
    Ok(Json(state.services.students.notification_settings(&user).await?))
}

pub async fn update_notification_settings(
    State(state): State<AppState>,
    AuthContext(user): AuthContext,
    Json(request): Json<UpdateNotificationSettingsRequest>,
) -> Result<Json<NotificationSettings>> {
    let settings = state.services.students.update_notification_settings(&user, request).await?;
    Ok(Json(settings))
}
