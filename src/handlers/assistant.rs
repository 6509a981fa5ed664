//! Writing assistant routes

use axum::extract::State;
use axum::Json;

use crate::middleware::TeacherContext;
use crate::models::{FeedbackRequest, FeedbackResponse, ParentMessageRequest, ParentMessageResponse};
use crate::utils::errors::Result;

use super::AppState;

pub async fn grading_feedback(
    State(state): State<AppState>,
    TeacherContext(_): TeacherContext,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>> {
    Ok(Json(state.services.assistant.grading_feedback(request).await?))
}

pub async fn parent_message(
    State(state): State<AppState>,
    TeacherContext(teacher): TeacherContext,
    Json(request): Json<ParentMessageRequest>,
) -> Result<Json<ParentMessageResponse>> {
    Ok(Json(state.services.assistant.parent_message(&teacher, request).await?))
}
