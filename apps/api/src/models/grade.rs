use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TERMS: &[&str] = &["Term 1", "Term 2", "Term 3", "Term 4"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GradeRow {
    pub student_id: String,
    pub year: i32,
    pub term: String,
    pub subject: String,
    pub mark: i32,
}
