pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::interview::handlers as interview;
use crate::mentor::handlers as mentor;
use crate::portfolio::handlers as portfolio;
use crate::state::AppState;

/// Evidence photos are sent inline with the multipart forms.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview
        .route(
            "/api/v1/students/:id/interview",
            get(interview::handle_get_session),
        )
        .route(
            "/api/v1/students/:id/interview/grade",
            put(interview::handle_set_grade),
        )
        .route(
            "/api/v1/students/:id/interview/messages",
            post(interview::handle_send_message),
        )
        .route(
            "/api/v1/students/:id/interview/reset",
            post(interview::handle_reset),
        )
        .route(
            "/api/v1/students/:id/interview/finalize",
            post(interview::handle_finalize),
        )
        // Student portfolio
        .route(
            "/api/v1/students/:id/portfolio",
            get(portfolio::handle_get_portfolio),
        )
        .route(
            "/api/v1/students/:id/activities",
            post(portfolio::handle_manual_entry),
        )
        .route(
            "/api/v1/students/:id/activities/:activity_id",
            delete(portfolio::handle_student_delete_activity),
        )
        // Mentor
        .route("/api/v1/students/:id/mentor", post(mentor::handle_ask_mentor))
        .route("/api/v1/students/:id/roadmap", post(mentor::handle_roadmap))
        // Admin
        .route("/api/v1/admin/audit", get(portfolio::handle_audit_queue))
        .route("/api/v1/admin/gallery", get(portfolio::handle_gallery))
        .route(
            "/api/v1/admin/activities/:id/approve",
            post(portfolio::handle_approve),
        )
        .route(
            "/api/v1/admin/activities/:id",
            delete(portfolio::handle_reject),
        )
        .route("/api/v1/admin/events", post(portfolio::handle_tag_event))
        .route("/api/v1/admin/grades", put(portfolio::handle_upsert_grade))
        .route(
            "/api/v1/admin/grades/bulk",
            post(portfolio::handle_import_grades),
        )
        .route(
            "/api/v1/admin/users",
            get(portfolio::handle_list_users).post(portfolio::handle_create_user),
        )
        .route(
            "/api/v1/admin/users/bulk",
            post(portfolio::handle_import_users),
        )
        .route(
            "/api/v1/admin/users/:id",
            delete(portfolio::handle_delete_user),
        )
        .route(
            "/api/v1/admin/students/:id/insight",
            post(mentor::handle_admin_insight),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
