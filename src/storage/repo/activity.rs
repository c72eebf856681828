use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct ActivityRow {
    #[schema(value_type = String)]
    pub activity_id: Uuid,
    pub activity_type: String,
    pub activity_description: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: String,
    pub activity_description: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub async fn insert(conn: &mut PgConnection, citizen_id: Uuid, activity: &NewActivity) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO user_activity_logs
            (activity_id, citizen_id, activity_type, activity_description, entity_type, entity_id, metadata)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING activity_id",
    )
    .bind(Uuid::new_v4())
    .bind(citizen_id)
    .bind(&activity.activity_type)
    .bind(&activity.activity_description)
    .bind(activity.entity_type.as_deref())
    .bind(activity.entity_id.as_deref())
    .bind(activity.metadata.as_ref())
    .fetch_one(&mut *conn)
    .await
}

/// Newest first, optionally filtered by type.
pub async fn list(
    conn: &mut PgConnection,
    citizen_id: Uuid,
    activity_type: Option<&str>,
    limit: i64,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT activity_id, activity_type, activity_description, entity_type, entity_id, metadata, created_at
         FROM user_activity_logs
         WHERE citizen_id = $1 AND ($2::TEXT IS NULL OR activity_type = $2)
         ORDER BY created_at DESC
         LIMIT $3",
    )
    .bind(citizen_id)
    .bind(activity_type)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
}
