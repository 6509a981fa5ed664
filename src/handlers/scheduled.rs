//! Scheduled parent message routes

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::middleware::TeacherContext;
use crate::models::{CreateScheduledMessageRequest, ScheduledMessage, SweepSummary};
use crate::utils::errors::Result;

use super::AppState;

pub async fn schedule_message(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Json(request): Json<CreateScheduledMessageRequest>,
) -> Result<(StatusCode, Json<ScheduledMessage>)> {
    let message = state.services.messaging.schedule(&teacher, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn find_message(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduledMessage>> {
    Ok(Json(state.services.messaging.find(id).await?))
}

pub async fn sweep(State(state): State<AppState>, TeacherContext(_): TeacherContext) -> Result<Json<SweepSummary>> {
    Ok(Json(state.services.messaging.sweep().await?))
}
