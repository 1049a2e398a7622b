//! Achievement records (`activities` table).
//!
//! Rows are inserted once and only ever change status or get deleted. The
//! grade section is written by a follow-up UPDATE inside the same transaction.

use chrono::{Local, NaiveDate};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::activity::{ActivityRow, ActivityStatus};

/// Content of a new achievement record.
#[derive(Debug, Clone)]
pub struct NewActivity<'a> {
    pub student_id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub skills: &'a str,
    pub evidence_path: Option<&'a str>,
    pub grade_section: Option<&'a str>,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn insert_activity(
    tx: &mut Transaction<'_, Postgres>,
    activity: &NewActivity<'_>,
    date: NaiveDate,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO activities
            (id, student_id, title, summary, skills, date, evidence_path, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(activity.student_id)
    .bind(activity.title)
    .bind(activity.summary)
    .bind(activity.skills)
    .bind(date)
    .bind(activity.evidence_path)
    .bind(ActivityStatus::Pending.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(id)
}

async fn set_grade_section(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    grade_section: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE activities SET grade_section = $1 WHERE id = $2")
        .bind(grade_section)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_with_grade(
    tx: &mut Transaction<'_, Postgres>,
    activity: &NewActivity<'_>,
    date: NaiveDate,
) -> Result<ActivityRow, sqlx::Error> {
    let id = insert_activity(tx, activity, date).await?;
    if let Some(grade) = activity.grade_section {
        set_grade_section(tx, id, grade).await?;
    }
    sqlx::query_as::<_, ActivityRow>("SELECT * FROM activities WHERE id = $1")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
}

/// Saves one pending achievement dated today.
pub async fn save_activity(
    pool: &PgPool,
    activity: NewActivity<'_>,
) -> Result<ActivityRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let row = insert_with_grade(&mut tx, &activity, today()).await?;
    tx.commit().await?;

    info!(
        "Saved activity {} '{}' for student {}",
        row.id, row.title, row.student_id
    );
    Ok(row)
}

/// Saves the same event for every listed student in one transaction.
pub async fn tag_event(
    pool: &PgPool,
    student_ids: &[String],
    title: &str,
    summary: &str,
    skills: &str,
    grade_section: Option<&str>,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    let date = today();
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(student_ids.len());
    for student_id in student_ids {
        let activity = NewActivity {
            student_id,
            title,
            summary,
            skills,
            evidence_path: None,
            grade_section,
        };
        rows.push(insert_with_grade(&mut tx, &activity, date).await?);
    }
    tx.commit().await?;

    info!("Tagged event '{title}' for {} students", rows.len());
    Ok(rows)
}

pub async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT * FROM activities WHERE student_id = $1 ORDER BY date DESC, created_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Audit queue (`Pending`) or gallery (`Approved`), newest first.
pub async fn list_by_status(
    pool: &PgPool,
    status: ActivityStatus,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT * FROM activities WHERE status = $1 ORDER BY date DESC, created_at DESC",
    )
    .bind(status.as_str())
    .fetch_all(pool)
    .await
}

/// Moves a pending record to the gallery. Returns `false` if no pending
/// record has this id.
pub async fn approve(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE activities SET status = $1 WHERE id = $2 AND status = $3")
        .bind(ActivityStatus::Approved.as_str())
        .bind(id)
        .bind(ActivityStatus::Pending.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Admin reject. Returns `false` if the record does not exist.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM activities WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Student delete; only removes the student's own record.
pub async fn delete_for_student(
    pool: &PgPool,
    student_id: &str,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM activities WHERE id = $1 AND student_id = $2")
        .bind(id)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
