use crate::domain::registration::{ApplicationDetails, RegistrationStatus, RequestType, ReviewOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

/// A registration request joined with the applicant's name and phone.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct RegistrationRow {
    #[schema(value_type = String)]
    pub request_id: Uuid,
    #[schema(value_type = String)]
    pub service_provider_id: Uuid,
    pub request_type: String,
    pub status: String,
    pub service_identifier: String,
    pub organization_name: Option<String>,
    pub registration_number: Option<String>,
    pub provider_type: Option<String>,
    pub specialization: Option<String>,
    pub years_of_experience: Option<i32>,
    pub provider_category: Option<String>,
    pub business_license: Option<String>,
    pub gst_number: Option<String>,
    pub years_in_business: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub assigned_admin_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub reviewed_by: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_comments: Option<String>,
    pub rejection_reason: Option<String>,
    #[schema(value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    pub applicant_name: Option<String>,
    pub applicant_phone: Option<String>,
    #[serde(skip_serializing)]
    pub applicant_identity_hash: String,
}

impl RegistrationRow {
    pub fn status(&self) -> Result<RegistrationStatus, crate::domain::DomainError> {
        self.status.parse()
    }

    pub fn request_type(&self) -> Result<RequestType, crate::domain::DomainError> {
        self.request_type.parse()
    }

    pub fn details(&self) -> ApplicationDetails {
        ApplicationDetails {
            organization_name: self.organization_name.clone(),
            registration_number: self.registration_number.clone(),
            provider_type: self.provider_type.clone(),
            specialization: self.specialization.clone(),
            years_of_experience: self.years_of_experience,
            provider_category: self.provider_category.clone(),
            business_license: self.business_license.clone(),
            gst_number: self.gst_number.clone(),
            years_in_business: self.years_in_business,
        }
    }
}

/// Filters for the admin listing.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub assigned_admin_id: Option<Uuid>,
}

const SELECT_REQUEST: &str = "SELECT r.request_id, r.service_provider_id, r.request_type, r.status,
            r.service_identifier, r.organization_name, r.registration_number, r.provider_type,
            r.specialization, r.years_of_experience, r.provider_category, r.business_license,
            r.gst_number, r.years_in_business, r.assigned_admin_id, r.reviewed_by, r.reviewed_at,
            r.admin_comments, r.rejection_reason, r.submitted_at, r.updated_at,
            sp.full_name AS applicant_name, sp.phone AS applicant_phone,
            sp.identity_hash AS applicant_identity_hash
     FROM sp_registration_requests r
     JOIN service_providers sp ON sp.service_provider_id = r.service_provider_id";

pub async fn insert(
    conn: &mut PgConnection,
    service_provider_id: Uuid,
    request_type: RequestType,
    details: &ApplicationDetails,
    assigned_admin_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO sp_registration_requests
            (request_id, service_provider_id, request_type, status, service_identifier,
             organization_name, registration_number, provider_type, specialization,
             years_of_experience, provider_category, business_license, gst_number,
             years_in_business, assigned_admin_id)
         VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING request_id",
    )
    .bind(Uuid::new_v4())
    .bind(service_provider_id)
    .bind(request_type.as_str())
    .bind(request_type.service_identifier(service_provider_id))
    .bind(details.organization_name.as_deref())
    .bind(details.registration_number.as_deref())
    .bind(details.provider_type.as_deref())
    .bind(details.specialization.as_deref())
    .bind(details.years_of_experience)
    .bind(details.provider_category.as_deref())
    .bind(details.business_license.as_deref())
    .bind(details.gst_number.as_deref())
    .bind(details.years_in_business)
    .bind(assigned_admin_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find(conn: &mut PgConnection, request_id: Uuid) -> Result<Option<RegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationRow>(&format!("{} WHERE r.request_id = $1", SELECT_REQUEST))
        .bind(request_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Same as [`find`] but holds a row lock until the transaction ends, so two reviews of one
/// request are serialized.
pub async fn find_for_update(
    conn: &mut PgConnection,
    request_id: Uuid,
) -> Result<Option<RegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationRow>(&format!(
        "{} WHERE r.request_id = $1 FOR UPDATE OF r",
        SELECT_REQUEST
    ))
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list(
    conn: &mut PgConnection,
    filter: &RegistrationFilter,
) -> Result<Vec<RegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationRow>(&format!(
        "{} WHERE ($1::TEXT IS NULL OR r.status = $1)
              AND ($2::UUID IS NULL OR r.assigned_admin_id = $2)
         ORDER BY r.submitted_at DESC",
        SELECT_REQUEST
    ))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.assigned_admin_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn list_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Vec<RegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationRow>(&format!(
        "{} WHERE sp.identity_hash = $1 ORDER BY r.submitted_at DESC",
        SELECT_REQUEST
    ))
    .bind(identity_hash)
    .fetch_all(&mut *conn)
    .await
}

pub async fn record_review(
    conn: &mut PgConnection,
    request_id: Uuid,
    outcome: &ReviewOutcome,
    reviewer: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sp_registration_requests SET
            status = $2,
            admin_comments = $3,
            rejection_reason = $4,
            reviewed_by = $5,
            reviewed_at = now(),
            updated_at = now()
         WHERE request_id = $1",
    )
    .bind(request_id)
    .bind(outcome.status.as_str())
    .bind(outcome.admin_comments.as_deref())
    .bind(outcome.rejection_reason.as_deref())
    .bind(reviewer)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Moves the request back to PENDING, optionally replacing its application fields.
pub async fn resubmit(
    conn: &mut PgConnection,
    request_id: Uuid,
    details: &ApplicationDetails,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sp_registration_requests SET
            status = 'PENDING',
            organization_name = $2,
            registration_number = $3,
            provider_type = $4,
            specialization = $5,
            years_of_experience = $6,
            provider_category = $7,
            business_license = $8,
            gst_number = $9,
            years_in_business = $10,
            rejection_reason = NULL,
            updated_at = now()
         WHERE request_id = $1",
    )
    .bind(request_id)
    .bind(details.organization_name.as_deref())
    .bind(details.registration_number.as_deref())
    .bind(details.provider_type.as_deref())
    .bind(details.specialization.as_deref())
    .bind(details.years_of_experience)
    .bind(details.provider_category.as_deref())
    .bind(details.business_license.as_deref())
    .bind(details.gst_number.as_deref())
    .bind(details.years_in_business)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
