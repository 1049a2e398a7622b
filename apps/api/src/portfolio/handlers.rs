use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::evidence::discard_orphan;
use super::grades::{self, GradeInput};
use super::records::{self, NewActivity};
use super::upload::read_upload_form;
use super::users::{self, NewUser};
use crate::errors::AppError;
use crate::interview::session::is_known_grade_level;
use crate::models::activity::{ActivityRow, ActivityStatus};
use crate::models::grade::GradeRow;
use crate::models::user::UserRow;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PortfolioResponse {
    pub grades: Vec<GradeRow>,
    pub activities: Vec<ActivityRow>,
}

/// GET /api/v1/students/:id/portfolio
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let grades = grades::list_for_student(&state.db, &student_id).await?;
    let activities = records::list_for_student(&state.db, &student_id).await?;
    Ok(Json(PortfolioResponse { grades, activities }))
}

/// POST /api/v1/students/:id/activities
///
/// Manual entry without the interview. Multipart fields: `title`, `summary`,
/// `skills`, `grade_section`, plus the `evidence` image.
pub async fn handle_manual_entry(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ActivityRow>), AppError> {
    let form = read_upload_form(multipart).await?;

    let (title, evidence) = match (form.text("title"), form.evidence.as_ref()) {
        (Some(title), Some(evidence)) => (title, evidence),
        _ => {
            return Err(AppError::Validation(
                "Title and Evidences are mandatory".to_string(),
            ))
        }
    };
    let grade_section = form.text("grade_section");
    if let Some(grade) = grade_section {
        if !is_known_grade_level(grade) {
            return Err(AppError::Validation(format!("unknown grade level '{grade}'")));
        }
    }

    let evidence_path = state
        .evidence
        .save(&student_id, evidence.bytes.clone(), &evidence.extension)
        .await?;

    let saved = records::save_activity(
        &state.db,
        NewActivity {
            student_id: &student_id,
            title,
            summary: form.text("summary").unwrap_or_default(),
            skills: form.text("skills").unwrap_or_default(),
            evidence_path: Some(&evidence_path),
            grade_section,
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

    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/students/:id/activities/:activity_id
pub async fn handle_student_delete_activity(
    State(state): State<AppState>,
    Path((student_id, activity_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !records::delete_for_student(&state.db, &student_id, activity_id).await? {
        return Err(AppError::NotFound(format!(
            "Activity {activity_id} not found for student {student_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Admin ────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/audit
pub async fn handle_audit_queue(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityRow>>, AppError> {
    Ok(Json(
        records::list_by_status(&state.db, ActivityStatus::Pending).await?,
    ))
}

/// GET /api/v1/admin/gallery
pub async fn handle_gallery(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityRow>>, AppError> {
    Ok(Json(
        records::list_by_status(&state.db, ActivityStatus::Approved).await?,
    ))
}

/// POST /api/v1/admin/activities/:id/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !records::approve(&state.db, id).await? {
        return Err(AppError::NotFound(format!("No pending activity {id}")));
    }
    info!("Approved activity {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/activities/:id
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !records::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Activity {id} not found")));
    }
    info!("Rejected activity {id}");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: String,
    pub grade_section: Option<String>,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

impl EventRequest {
    /// Trimmed, de-duplicated, non-empty student ids in request order.
    fn recipients(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.student_ids.len());
        for id in self.student_ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// POST /api/v1/admin/events
pub async fn handle_tag_event(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<(StatusCode, Json<Vec<ActivityRow>>), AppError> {
    let recipients = req.recipients();
    let title = req.title.trim();
    if title.is_empty() || recipients.is_empty() {
        return Err(AppError::Validation(
            "Please provide an event title and select at least one student.".to_string(),
        ));
    }
    let grade_section = req
        .grade_section
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());
    if let Some(grade) = grade_section {
        if !is_known_grade_level(grade) {
            return Err(AppError::Validation(format!("unknown grade level '{grade}'")));
        }
    }

    let rows = records::tag_event(
        &state.db,
        &recipients,
        title,
        req.summary.trim(),
        req.skills.trim(),
        grade_section,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

/// PUT /api/v1/admin/grades
pub async fn handle_upsert_grade(
    State(state): State<AppState>,
    Json(grade): Json<GradeInput>,
) -> Result<StatusCode, AppError> {
    grades::upsert_grade(&state.db, &grade).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

/// POST /api/v1/admin/grades/bulk
pub async fn handle_import_grades(
    State(state): State<AppState>,
    Json(rows): Json<Vec<GradeInput>>,
) -> Result<Json<ImportSummary>, AppError> {
    let imported = grades::import_grades(&state.db, &rows).await?;
    Ok(Json(ImportSummary { imported }))
}

#[derive(Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    Query(params): Query<UserSearch>,
) -> Result<Json<Vec<UserRow>>, AppError> {
    Ok(Json(
        users::list_users(&state.db, params.search.as_deref()).await?,
    ))
}

/// POST /api/v1/admin/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    let row = users::create_user(&state.db, &user).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/admin/users/bulk
pub async fn handle_import_users(
    State(state): State<AppState>,
    Json(users): Json<Vec<NewUser>>,
) -> Result<Json<ImportSummary>, AppError> {
    let imported = users::import_users(&state.db, &users).await?;
    Ok(Json(ImportSummary { imported }))
}

/// DELETE /api/v1/admin/users/:id
///
/// Also drops any interview in progress for that student.
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !users::delete_user(&state.db, &student_id).await? {
        return Err(AppError::NotFound(format!("User {student_id} not found")));
    }
    state.sessions.remove(&student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
