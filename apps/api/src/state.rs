use std::sync::Arc;

use sqlx::PgPool;

use crate::interview::machine::Interviewer;
use crate::interview::store::SessionStore;
use crate::mentor::roadmap::RoadmapAdvisor;
use crate::mentor::CareerMentor;
use crate::portfolio::evidence::EvidenceStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Interview sessions, one per student. Redis-backed unless REDIS_URL is unset.
    pub sessions: Arc<dyn SessionStore>,
    /// Local directory or S3 bucket, chosen from config at startup.
    pub evidence: Arc<dyn EvidenceStore>,
    pub interviewer: Interviewer,
    pub mentor: CareerMentor,
    pub roadmap: RoadmapAdvisor,
}
