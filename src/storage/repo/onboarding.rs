use crate::domain::onboarding::ServiceDeclaration;
use crate::domain::registration::RegistrationStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

/// An onboarding request joined with the submitting provider's name.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct OnboardingRow {
    #[schema(value_type = String)]
    pub onboarding_id: Uuid,
    #[schema(value_type = String)]
    pub service_provider_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub category: String,
    pub service_identifier: String,
    pub status: String,
    pub admin_notes: Option<String>,
    #[schema(value_type = Option<String>)]
    pub reviewed_by: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub service_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    pub provider_name: Option<String>,
    #[serde(skip_serializing)]
    pub provider_identity_hash: String,
}

impl OnboardingRow {
    pub fn status(&self) -> Result<RegistrationStatus, crate::domain::DomainError> {
        self.status.parse()
    }

    pub fn declaration(&self) -> ServiceDeclaration {
        ServiceDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            base_url: self.base_url.clone(),
            category: self.category.clone(),
            service_identifier: self.service_identifier.clone(),
        }
    }
}

const SELECT_ONBOARDING: &str = "SELECT o.onboarding_id, o.service_provider_id, o.name, o.description,
            o.base_url, o.category, o.service_identifier, o.status, o.admin_notes, o.reviewed_by,
            o.reviewed_at, o.service_id, o.submitted_at, o.updated_at,
            sp.full_name AS provider_name, sp.identity_hash AS provider_identity_hash
     FROM service_onboarding_requests o
     JOIN service_providers sp ON sp.service_provider_id = o.service_provider_id";

pub async fn insert(
    conn: &mut PgConnection,
    service_provider_id: Uuid,
    declaration: &ServiceDeclaration,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO service_onboarding_requests
            (onboarding_id, service_provider_id, name, description, base_url, category,
             service_identifier, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING')
         RETURNING onboarding_id",
    )
    .bind(Uuid::new_v4())
    .bind(service_provider_id)
    .bind(&declaration.name)
    .bind(declaration.description.as_deref())
    .bind(declaration.base_url.as_deref())
    .bind(&declaration.category)
    .bind(&declaration.service_identifier)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find(conn: &mut PgConnection, onboarding_id: Uuid) -> Result<Option<OnboardingRow>, sqlx::Error> {
    sqlx::query_as::<_, OnboardingRow>(&format!("{} WHERE o.onboarding_id = $1", SELECT_ONBOARDING))
        .bind(onboarding_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_for_update(
    conn: &mut PgConnection,
    onboarding_id: Uuid,
) -> Result<Option<OnboardingRow>, sqlx::Error> {
    sqlx::query_as::<_, OnboardingRow>(&format!(
        "{} WHERE o.onboarding_id = $1 FOR UPDATE OF o",
        SELECT_ONBOARDING
    ))
    .bind(onboarding_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list(
    conn: &mut PgConnection,
    status: Option<RegistrationStatus>,
) -> Result<Vec<OnboardingRow>, sqlx::Error> {
    sqlx::query_as::<_, OnboardingRow>(&format!(
        "{} WHERE ($1::TEXT IS NULL OR o.status = $1) ORDER BY o.submitted_at DESC",
        SELECT_ONBOARDING
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&mut *conn)
    .await
}

pub async fn list_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Vec<OnboardingRow>, sqlx::Error> {
    sqlx::query_as::<_, OnboardingRow>(&format!(
        "{} WHERE sp.identity_hash = $1 ORDER BY o.submitted_at DESC",
        SELECT_ONBOARDING
    ))
    .bind(identity_hash)
    .fetch_all(&mut *conn)
    .await
}

pub async fn record_review(
    conn: &mut PgConnection,
    onboarding_id: Uuid,
    status: RegistrationStatus,
    admin_notes: Option<&str>,
    reviewer: Uuid,
    service_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE service_onboarding_requests SET
            status = $2,
            admin_notes = $3,
            reviewed_by = $4,
            reviewed_at = now(),
            service_id = COALESCE($5, service_id),
            updated_at = now()
         WHERE onboarding_id = $1",
    )
    .bind(onboarding_id)
    .bind(status.as_str())
    .bind(admin_notes)
    .bind(reviewer)
    .bind(service_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Back to PENDING with the provider's revised declaration.
pub async fn resubmit(
    conn: &mut PgConnection,
    onboarding_id: Uuid,
    declaration: &ServiceDeclaration,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE service_onboarding_requests SET
            status = 'PENDING',
            name = $2,
            description = $3,
            base_url = $4,
            category = $5,
            service_identifier = $6,
            updated_at = now()
         WHERE onboarding_id = $1",
    )
    .bind(onboarding_id)
    .bind(&declaration.name)
    .bind(declaration.description.as_deref())
    .bind(declaration.base_url.as_deref())
    .bind(&declaration.category)
    .bind(&declaration.service_identifier)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
