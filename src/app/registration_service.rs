//! Service-provider onboarding: submission, admin review and activation of approved services.

use crate::app::citizen_service::require_citizen;
use crate::app::error::{AppError, AppResult};
use crate::domain::registration::{self, ApplicationDetails, RegistrationStatus, RequestType, ReviewAction};
use crate::storage::repo::registrations::{self, RegistrationFilter, RegistrationRow};
use crate::storage::repo::services::{self, ServiceRow, SERVICE_ACTIVE, SERVICE_INACTIVE};
use crate::storage::repo::{admins, providers, users};
use rand::seq::SliceRandom;
use sqlx::PgConnection;
use uuid::Uuid;

/// A reviewed request and, for approvals, the service it activated.
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub request: RegistrationRow,
    pub service: Option<ServiceRow>,
}

pub async fn submit(
    conn: &mut PgConnection,
    identity_hash: &str,
    request_type: RequestType,
    details: ApplicationDetails,
) -> AppResult<RegistrationRow> {
    let details = details.validated(request_type)?;
    let citizen = require_citizen(conn, identity_hash).await?;

    let existing = registrations::list_for_identity(conn, identity_hash).await?;
    if let Some(prior) = existing.iter().find(|r| r.request_type == request_type.as_str()) {
        return Err(AppError::Conflict(format!(
            "A {} registration request already exists (status {})",
            request_type, prior.status
        )));
    }

    let provider = match providers::find_by_identity(conn, identity_hash).await? {
        Some(provider) => provider,
        None => {
            providers::create_from_citizen(
                conn,
                &citizen,
                details.organization_name.as_deref(),
                details.registration_number.as_deref(),
            )
            .await?
        }
    };

    let reviewers = admins::list(conn).await?;
    let reviewer = reviewers
        .choose(&mut rand::thread_rng())
        .ok_or_else(|| AppError::Internal("No admins available to review the request".to_string()))?;

    let request_id = registrations::insert(
        conn,
        provider.service_provider_id,
        request_type,
        &details,
        reviewer.admin_id,
    )
    .await?;
    tracing::info!(%request_id, %request_type, assigned_to = %reviewer.username, "registration submitted");

    registrations::find(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))
}

pub async fn my_requests(conn: &mut PgConnection, identity_hash: &str) -> AppResult<Vec<RegistrationRow>> {
    Ok(registrations::list_for_identity(conn, identity_hash).await?)
}

/// Sends a CHANGES_REQUESTED request back to PENDING. `details` replaces the stored
/// application when given.
pub async fn resubmit(
    conn: &mut PgConnection,
    identity_hash: &str,
    request_id: Uuid,
    details: Option<ApplicationDetails>,
) -> AppResult<RegistrationRow> {
    let row = registrations::find_for_update(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))?;
    if row.applicant_identity_hash != identity_hash {
        return Err(AppError::Forbidden(
            "You can only resubmit your own registration requests".to_string(),
        ));
    }

    registration::resubmit(row.status()?)?;
    let details = details.unwrap_or_else(|| row.details()).validated(row.request_type()?)?;
    registrations::resubmit(conn, request_id, &details).await?;

    registrations::find(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))
}

pub async fn list(conn: &mut PgConnection, filter: &RegistrationFilter) -> AppResult<Vec<RegistrationRow>> {
    Ok(registrations::list(conn, filter).await?)
}

pub async fn get(conn: &mut PgConnection, request_id: Uuid) -> AppResult<RegistrationRow> {
    registrations::find(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))
}

/// Applies an admin decision. Approval activates the service, records the typed provider
/// profile and promotes the applicant, all on the caller's transaction.
pub async fn review(
    conn: &mut PgConnection,
    request_id: Uuid,
    action: &ReviewAction,
    reviewer: Uuid,
) -> AppResult<ReviewResult> {
    let row = registrations::find_for_update(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))?;

    let outcome = action.apply(row.status()?)?;
    registrations::record_review(conn, request_id, &outcome, reviewer).await?;

    let service = if outcome.status == RegistrationStatus::Approved {
        Some(activate(conn, &row).await?)
    } else {
        None
    };
    tracing::info!(%request_id, status = %outcome.status, %reviewer, "registration reviewed");

    let request = registrations::find(conn, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Registration request"))?;
    Ok(ReviewResult { request, service })
}

async fn activate(conn: &mut PgConnection, row: &RegistrationRow) -> AppResult<ServiceRow> {
    let request_type = row.request_type()?;
    let service = services::upsert_active(
        conn,
        &row.service_identifier,
        row.service_provider_id,
        request_type.as_str(),
        row.request_id,
    )
    .await?;

    match request_type {
        RequestType::Esanjeevani => {
            let (Some(provider_type), Some(specialization)) =
                (row.provider_type.as_deref(), row.specialization.as_deref())
            else {
                return Err(AppError::Validation(
                    "provider_type and specialization are required for ESANJEEVANI".to_string(),
                ));
            };
            providers::upsert_esanjeevani(
                conn,
                row.service_provider_id,
                provider_type,
                specialization,
                row.years_of_experience,
            )
            .await?;
        }
        RequestType::Mkisan => {
            let category = row.provider_category.as_deref().ok_or_else(|| {
                AppError::Validation("provider_category is required for MKISAN".to_string())
            })?;
            providers::upsert_mkisan(
                conn,
                row.service_provider_id,
                category,
                row.business_license.as_deref(),
                row.gst_number.as_deref(),
                row.years_in_business,
            )
            .await?;
        }
    }

    users::promote_to_provider(conn, &row.applicant_identity_hash).await?;
    Ok(service)
}

pub async fn list_services(conn: &mut PgConnection) -> AppResult<Vec<ServiceRow>> {
    Ok(services::list(conn).await?)
}

pub async fn set_service_active(conn: &mut PgConnection, service_id: Uuid, active: bool) -> AppResult<ServiceRow> {
    let status = if active { SERVICE_ACTIVE } else { SERVICE_INACTIVE };
    services::set_status(conn, service_id, status)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))
}
