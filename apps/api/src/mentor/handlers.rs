use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{admin_context, student_context};
use crate::errors::AppError;
use crate::llm_client::ConversationTurn;
use crate::portfolio::{grades, records};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MentorRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    pub interests: Option<String>,
}

#[derive(Serialize)]
pub struct MentorResponse {
    pub answer: String,
}

/// POST /api/v1/students/:id/mentor
pub async fn handle_ask_mentor(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<MentorRequest>,
) -> Result<Json<MentorResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let grades = grades::list_for_student(&state.db, &student_id).await?;
    let activities = records::list_for_student(&state.db, &student_id).await?;
    let context = student_context(&req.history, question, req.interests.as_deref());

    let answer = state.mentor.advise(&grades, &activities, &context).await;
    Ok(Json(MentorResponse { answer }))
}

/// POST /api/v1/admin/students/:id/insight
pub async fn handle_admin_insight(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<MentorResponse>, AppError> {
    let grades = grades::list_for_student(&state.db, &student_id).await?;
    let activities = records::list_for_student(&state.db, &student_id).await?;

    let answer = state
        .mentor
        .advise(&grades, &activities, &admin_context())
        .await;
    Ok(Json(MentorResponse { answer }))
}

#[derive(Serialize)]
pub struct RoadmapResponse {
    pub roadmap: String,
}

/// POST /api/v1/students/:id/roadmap
pub async fn handle_roadmap(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<RoadmapResponse>, AppError> {
    let grades = grades::list_for_student(&state.db, &student_id).await?;
    let activities = records::list_for_student(&state.db, &student_id).await?;

    let roadmap = state.roadmap.roadmap(&grades, &activities).await?;
    Ok(Json(RoadmapResponse { roadmap }))
}
