use crate::domain::onboarding::ServiceDeclaration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

pub const SERVICE_ACTIVE: &str = "ACTIVE";
pub const SERVICE_INACTIVE: &str = "INACTIVE";

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct ServiceRow {
    #[schema(value_type = String)]
    pub service_id: Uuid,
    pub service_identifier: String,
    #[schema(value_type = String)]
    pub service_provider_id: Uuid,
    pub category: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub status: String,
    #[schema(value_type = Option<String>)]
    pub request_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

const SERVICE_COLUMNS: &str = "service_id, service_identifier, service_provider_id, category, name,
     description, base_url, status, request_id, created_at, updated_at";

/// Marks the service behind `service_identifier` ACTIVE, creating it on first approval.
pub async fn upsert_active(
    conn: &mut PgConnection,
    service_identifier: &str,
    service_provider_id: Uuid,
    category: &str,
    request_id: Uuid,
) -> Result<ServiceRow, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!(
        "INSERT INTO services (service_id, service_identifier, service_provider_id, category, status, request_id)
         VALUES ($1, $2, $3, $4, 'ACTIVE', $5)
         ON CONFLICT (service_identifier) DO UPDATE
            SET status = 'ACTIVE', request_id = EXCLUDED.request_id, updated_at = now()
         RETURNING {}",
        SERVICE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(service_identifier)
    .bind(service_provider_id)
    .bind(category)
    .bind(request_id)
    .fetch_one(&mut *conn)
    .await
}

/// Creates or refreshes the service a provider declared during onboarding and marks it ACTIVE.
/// Returns `None` when the identifier already belongs to another provider.
pub async fn upsert_declared(
    conn: &mut PgConnection,
    declaration: &ServiceDeclaration,
    service_provider_id: Uuid,
) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!(
        "INSERT INTO services
            (service_id, service_identifier, service_provider_id, category, name, description, base_url, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE')
         ON CONFLICT (service_identifier) DO UPDATE
            SET category = EXCLUDED.category,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                base_url = EXCLUDED.base_url,
                status = 'ACTIVE',
                updated_at = now()
            WHERE services.service_provider_id = EXCLUDED.service_provider_id
         RETURNING {}",
        SERVICE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&declaration.service_identifier)
    .bind(service_provider_id)
    .bind(&declaration.category)
    .bind(&declaration.name)
    .bind(declaration.description.as_deref())
    .bind(declaration.base_url.as_deref())
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!(
        "SELECT {} FROM services ORDER BY created_at DESC",
        SERVICE_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await
}

/// Returns `None` when no service has that id.
pub async fn set_status(
    conn: &mut PgConnection,
    service_id: Uuid,
    status: &str,
) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(&format!(
        "UPDATE services SET status = $2, updated_at = now() WHERE service_id = $1 RETURNING {}",
        SERVICE_COLUMNS
    ))
    .bind(service_id)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await
}
