use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::machine::{set_grade_context, TurnOutcome};
use super::parser::closing_statement;
use super::prompts::MISSING_EVIDENCE_MESSAGE;
use super::session::{InterviewPhase, InterviewSession, StructuredRecord};
use crate::errors::AppError;
use crate::llm_client::ConversationTurn;
use crate::models::activity::ActivityRow;
use crate::portfolio::evidence::discard_orphan;
use crate::portfolio::records::{self, NewActivity};
use crate::portfolio::upload::read_upload_form;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: InterviewPhase,
    pub round_counter: i32,
    pub progress: f64,
    pub grade_context: String,
    pub turns: Vec<ConversationTurn>,
    pub pending_record: Option<StructuredRecord>,
    /// Interviewer's last words before the payload, once complete.
    pub closing_statement: Option<String>,
}

impl From<InterviewSession> for SessionView {
    fn from(session: InterviewSession) -> Self {
        let closing_statement = session
            .is_complete
            .then(|| session.turns.last())
            .flatten()
            .map(|t| closing_statement(&t.content).to_string());
        Self {
            phase: session.phase(),
            round_counter: session.round_counter,
            progress: session.progress(),
            grade_context: session.grade_context,
            turns: session.turns,
            pending_record: session.pending_record,
            closing_statement,
        }
    }
}

#[derive(Deserialize)]
pub struct GradeContextRequest {
    pub grade_context: String,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// GET /api/v1/students/:id/interview
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.load(&student_id).await?;
    Ok(Json(session.into()))
}

/// PUT /api/v1/students/:id/interview/grade
pub async fn handle_set_grade(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<GradeContextRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.sessions.load(&student_id).await?;
    set_grade_context(&mut session, req.grade_context.trim())?;
    state.sessions.save(&student_id, &session).await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/students/:id/interview/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let mut session = state.sessions.load(&student_id).await?;
    let outcome = state.interviewer.advance(&mut session, &req.message).await?;
    state.sessions.save(&student_id, &session).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/students/:id/interview/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.sessions.load(&student_id).await?;
    session.reset();
    state.sessions.save(&student_id, &session).await?;
    info!("Interview reset for student {student_id}");
    Ok(Json(session.into()))
}

/// POST /api/v1/students/:id/interview/finalize
///
/// Multipart with an `evidence` image. Files the pending record as a pending
/// achievement and starts a fresh interview.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ActivityRow>, AppError> {
    let mut session = state.sessions.load(&student_id).await?;
    let record = match (&session.pending_record, session.is_complete) {
        (Some(record), true) => record.clone(),
        _ => {
            return Err(AppError::Validation(
                "interview is not complete yet".to_string(),
            ))
        }
    };

    let form = read_upload_form(multipart).await?;
    let evidence = form
        .evidence
        .ok_or_else(|| AppError::Validation(MISSING_EVIDENCE_MESSAGE.to_string()))?;
    let evidence_path = state
        .evidence
        .save(&student_id, evidence.bytes, &evidence.extension)
        .await?;

    let saved = records::save_activity(
        &state.db,
        NewActivity {
            student_id: &student_id,
            title: &record.title,
            summary: &record.summary,
            skills: &record.skills,
            evidence_path: Some(&evidence_path),
            grade_section: Some(&session.grade_context),
        },
    )
    .await;
    let row = match saved {
        Ok(row) => row,
        Err(e) => {
            discard_orphan(state.evidence.as_ref(), &evidence_path).await;
            return Err(e.into());
        }
    };

    session.reset();
    state.sessions.save(&student_id, &session).await?;
    info!("Interview finalized for student {student_id} as activity {}", row.id);
    Ok(Json(row))
}
