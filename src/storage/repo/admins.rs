use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    pub admin_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub user_id: Option<i64>,
}

/// Public view of an admin, used for reviewer assignment responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct AdminSummary {
    #[schema(value_type = String)]
    pub admin_id: Uuid,
    pub username: String,
    pub full_name: String,
}

pub async fn find_by_username(conn: &mut PgConnection, username: &str) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(
        "SELECT admin_id, username, password_hash, full_name, email, user_id
         FROM admins WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_by_user_id(conn: &mut PgConnection, user_id: i64) -> Result<Option<AdminSummary>, sqlx::Error> {
    sqlx::query_as::<_, AdminSummary>(
        "SELECT admin_id, username, full_name FROM admins WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<AdminSummary>, sqlx::Error> {
    sqlx::query_as::<_, AdminSummary>("SELECT admin_id, username, full_name FROM admins ORDER BY username")
        .fetch_all(&mut *conn)
        .await
}

pub async fn link_user(conn: &mut PgConnection, admin_id: Uuid, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET user_id = $2 WHERE admin_id = $1")
        .bind(admin_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Inserts or refreshes an admin account (used by the seed binary and tests).
pub async fn upsert(
    conn: &mut PgConnection,
    username: &str,
    password_hash: &str,
    full_name: &str,
    email: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO admins (admin_id, username, password_hash, full_name, email)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (username) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email
         RETURNING admin_id",
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .bind(full_name)
    .bind(email)
    .fetch_one(&mut *conn)
    .await
}
