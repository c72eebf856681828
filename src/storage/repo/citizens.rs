use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct CitizenRow {
    #[schema(value_type = String)]
    pub citizen_id: Uuid,
    #[serde(skip_serializing)]
    pub identity_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub kisan_id: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a citizen may edit. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

const CITIZEN_COLUMNS: &str = "citizen_id, identity_hash, full_name, phone, gender, date_of_birth, \
                               address, kisan_id, created_at, updated_at";

/// Creates the citizen record for a first login; no-op if it already exists.
pub async fn ensure_exists(conn: &mut PgConnection, identity_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO citizens (citizen_id, identity_hash) VALUES ($1, $2)
         ON CONFLICT (identity_hash) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(identity_hash)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find_by_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<CitizenRow>, sqlx::Error> {
    sqlx::query_as::<_, CitizenRow>(&format!(
        "SELECT {} FROM citizens WHERE identity_hash = $1",
        CITIZEN_COLUMNS
    ))
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn update_profile(
    conn: &mut PgConnection,
    citizen_id: Uuid,
    update: &ProfileUpdate,
) -> Result<CitizenRow, sqlx::Error> {
    sqlx::query_as::<_, CitizenRow>(&format!(
        "UPDATE citizens SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            gender = COALESCE($4, gender),
            date_of_birth = COALESCE($5, date_of_birth),
            address = COALESCE($6, address),
            updated_at = now()
         WHERE citizen_id = $1
         RETURNING {}",
        CITIZEN_COLUMNS
    ))
    .bind(citizen_id)
    .bind(update.full_name.as_deref())
    .bind(update.phone.as_deref())
    .bind(update.gender.as_deref())
    .bind(update.date_of_birth)
    .bind(update.address.as_deref())
    .fetch_one(&mut *conn)
    .await
}

/// Binds a farmer-ID to the citizen. A farmer-ID held by another citizen is a unique violation.
pub async fn set_kisan_id(
    conn: &mut PgConnection,
    citizen_id: Uuid,
    kisan_id: &str,
) -> Result<CitizenRow, sqlx::Error> {
    sqlx::query_as::<_, CitizenRow>(&format!(
        "UPDATE citizens SET kisan_id = $2, updated_at = now()
         WHERE citizen_id = $1
         RETURNING {}",
        CITIZEN_COLUMNS
    ))
    .bind(citizen_id)
    .bind(kisan_id)
    .fetch_one(&mut *conn)
    .await
}

/// Seeds a fully populated citizen (seed binary only).
#[allow(clippy::too_many_arguments)]
pub async fn upsert_seed(
    conn: &mut PgConnection,
    identity_hash: &str,
    full_name: &str,
    phone: &str,
    gender: &str,
    date_of_birth: NaiveDate,
    address: &str,
    kisan_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO citizens
            (citizen_id, identity_hash, full_name, phone, gender, date_of_birth, address, kisan_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (identity_hash) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(identity_hash)
    .bind(full_name)
    .bind(phone)
    .bind(gender)
    .bind(date_of_birth)
    .bind(address)
    .bind(kisan_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
