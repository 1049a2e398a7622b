use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::errors::AppError;
use crate::models::grade::{GradeRow, TERMS};

/// One academic mark, keyed by `(student_id, year, term, subject)`.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeInput {
    pub student_id: String,
    pub year: i32,
    pub term: String,
    pub subject: String,
    pub mark: i32,
}

impl GradeInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.student_id.trim().is_empty() {
            return Err(AppError::Validation("student_id is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::Validation("subject is required".to_string()));
        }
        if !TERMS.contains(&self.term.as_str()) {
            return Err(AppError::Validation(format!(
                "term must be one of {}",
                TERMS.join(", ")
            )));
        }
        if !(2000..=2100).contains(&self.year) {
            return Err(AppError::Validation(format!(
                "year {} is out of range",
                self.year
            )));
        }
        if !(0..=100).contains(&self.mark) {
            return Err(AppError::Validation(format!(
                "mark must be between 0 and 100, got {}",
                self.mark
            )));
        }
        Ok(())
    }
}

async fn upsert(tx: &mut Transaction<'_, Postgres>, grade: &GradeInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO grades (student_id, year, term, subject, mark)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, year, term, subject) DO UPDATE SET mark = EXCLUDED.mark
        "#,
    )
    .bind(grade.student_id.trim())
    .bind(grade.year)
    .bind(&grade.term)
    .bind(grade.subject.trim())
    .bind(grade.mark)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Inserts or overwrites the mark for one student/period/subject.
pub async fn upsert_grade(pool: &PgPool, grade: &GradeInput) -> Result<(), AppError> {
    grade.validate()?;
    let mut tx = pool.begin().await?;
    upsert(&mut tx, grade).await?;
    tx.commit().await?;
    Ok(())
}

/// Validates every row first, then writes them all in one transaction.
pub async fn import_grades(pool: &PgPool, grades: &[GradeInput]) -> Result<usize, AppError> {
    for (i, grade) in grades.iter().enumerate() {
        grade.validate().map_err(|e| match e {
            AppError::Validation(msg) => AppError::Validation(format!("row {}: {msg}", i + 1)),
            other => other,
        })?;
    }

    let mut tx = pool.begin().await?;
    for grade in grades {
        upsert(&mut tx, grade).await?;
    }
    tx.commit().await?;

    info!("Imported {} academic records", grades.len());
    Ok(grades.len())
}

pub async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<GradeRow>, sqlx::Error> {
    sqlx::query_as::<_, GradeRow>(
        "SELECT * FROM grades WHERE student_id = $1 ORDER BY year, term, subject",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
