use crate::domain::identity::Role;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct UserRow {
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub identity_hash: String,
    pub role: String,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub last_login_at: Option<DateTime<Utc>>,
}

const USER_COLUMNS: &str = "user_id, identity_hash, role, created_at, last_login_at";

/// Returns the user for `identity_hash`, inserting it with `role` if it does not exist yet.
///
/// The boolean is true when the row was created by this call.
pub async fn get_or_create(
    conn: &mut PgConnection,
    identity_hash: &str,
    role: Role,
) -> Result<(UserRow, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (identity_hash, role) VALUES ($1, $2)
         ON CONFLICT (identity_hash) DO NOTHING
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(identity_hash)
    .bind(role.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(user) = inserted {
        return Ok((user, true));
    }

    let existing = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE identity_hash = $1",
        USER_COLUMNS
    ))
    .bind(identity_hash)
    .fetch_one(&mut *conn)
    .await?;
    Ok((existing, false))
}

pub async fn find_by_id(conn: &mut PgConnection, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE identity_hash = $1",
        USER_COLUMNS
    ))
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn set_role(conn: &mut PgConnection, user_id: i64, role: Role) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Promotes a citizen account to SERVICE_PROVIDER. Admin accounts are left untouched.
pub async fn promote_to_provider(conn: &mut PgConnection, identity_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET role = 'SERVICE_PROVIDER' WHERE identity_hash = $1 AND role = 'CITIZEN'",
    )
    .bind(identity_hash)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn touch_login(conn: &mut PgConnection, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
