use std::collections::HashSet;

use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{UserRole, UserRow};

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub student_id: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Student
}

impl NewUser {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.student_id.trim().is_empty() || self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "All fields are required to create an account.".to_string(),
            ));
        }
        Ok(())
    }
}

fn duplicate_id() -> AppError {
    AppError::Conflict("User ID already exists.".to_string())
}

async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    user: &NewUser,
) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (student_id, role, name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user.student_id.trim())
    .bind(user.role.as_str())
    .bind(user.name.trim())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_id(),
        other => AppError::Database(other),
    })
}

pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<UserRow, AppError> {
    user.validate()?;
    let mut tx = pool.begin().await?;
    let row = insert(&mut tx, user).await?;
    tx.commit().await?;

    info!("Created {} account {}", row.role, row.student_id);
    Ok(row)
}

/// Row-level checks for a roster import: required fields, and no id listed
/// twice. Errors name the 1-based row.
fn check_roster(users: &[NewUser]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(users.len());
    for (i, user) in users.iter().enumerate() {
        let row = i + 1;
        user.validate().map_err(|e| match e {
            AppError::Validation(msg) => AppError::Validation(format!("row {row}: {msg}")),
            other => other,
        })?;
        if !seen.insert(user.student_id.trim()) {
            return Err(AppError::Conflict(format!(
                "row {row}: User ID already exists."
            )));
        }
    }
    Ok(())
}

/// Validates the whole roster first, then inserts it in one transaction. Any
/// id already on file rolls the import back with a conflict naming the row.
pub async fn import_users(pool: &PgPool, users: &[NewUser]) -> Result<usize, AppError> {
    if users.is_empty() {
        return Err(AppError::Validation("roster is empty".to_string()));
    }
    check_roster(users)?;

    let mut tx = pool.begin().await?;
    for (i, user) in users.iter().enumerate() {
        insert(&mut tx, user).await.map_err(|e| match e {
            AppError::Conflict(msg) => AppError::Conflict(format!("row {}: {msg}", i + 1)),
            other => other,
        })?;
    }
    tx.commit().await?;

    info!("Imported {} accounts", users.len());
    Ok(users.len())
}

/// Roster, optionally filtered by a case-insensitive match on name or id.
pub async fn list_users(pool: &PgPool, search: Option<&str>) -> Result<Vec<UserRow>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));

    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT * FROM users
        WHERE $1::text IS NULL OR name ILIKE $1 OR student_id ILIKE $1
        ORDER BY role, student_id
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// Removes a user with all grades and achievements. Returns `false` if the
/// user did not exist.
pub async fn delete_user(pool: &PgPool, student_id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let removed = sqlx::query("DELETE FROM users WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM grades WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM activities WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if removed == 1 {
        info!("Deleted user {student_id} and related records");
    }
    Ok(removed == 1)
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Ada"), "Ada");
    }

    fn user(student_id: &str, name: &str) -> NewUser {
        NewUser {
            student_id: student_id.into(),
            name: name.into(),
            role: UserRole::Student,
        }
    }

    #[test]
    fn test_roster_accepts_distinct_rows() {
        assert!(check_roster(&[user("1042", "Ada"), user("1043", "Grace")]).is_ok());
    }

    #[test]
    fn test_roster_rejects_blank_fields_with_row_number() {
        let err = check_roster(&[user("1042", "Ada"), user("1043", "  ")]).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ref m) if m == "row 2: All fields are required to create an account."
        ));
    }

    #[test]
    fn test_roster_rejects_repeated_id_as_conflict() {
        let err = check_roster(&[user("1042", "Ada"), user(" 1042 ", "Ada L.")]).unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict(ref m) if m == "row 2: User ID already exists."
        ));
    }

    #[test]
    fn test_new_user_role_defaults_to_student() {
        let user: NewUser =
            serde_json::from_value(serde_json::json!({"student_id": "1042", "name": "Ada"}))
                .unwrap();
        assert_eq!(user.role, UserRole::Student);

        let admin: NewUser = serde_json::from_value(
            serde_json::json!({"student_id": "t1", "name": "Grace", "role": "Admin"}),
        )
        .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }
}
