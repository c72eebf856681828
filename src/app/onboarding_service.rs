//! Service onboarding: providers declare services, admins review them, and approval lists the
//! service under the identifier the provider declared.

use crate::app::error::{AppError, AppResult};
use crate::domain::onboarding::ServiceDeclaration;
use crate::domain::registration::{self, RegistrationStatus, ReviewAction};
use crate::storage::repo::onboarding::{self, OnboardingRow};
use crate::storage::repo::providers;
use crate::storage::repo::services::{self, ServiceRow};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OnboardingReview {
    pub request: OnboardingRow,
    pub service: Option<ServiceRow>,
}

pub async fn submit(
    conn: &mut PgConnection,
    identity_hash: &str,
    declaration: ServiceDeclaration,
) -> AppResult<OnboardingRow> {
    let declaration = declaration.validated()?;
    let provider = providers::find_by_identity(conn, identity_hash)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("Only registered service providers can onboard services".to_string())
        })?;

    let onboarding_id = onboarding::insert(conn, provider.service_provider_id, &declaration).await?;
    tracing::info!(%onboarding_id, identifier = %declaration.service_identifier, "onboarding submitted");

    onboarding::find(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))
}

pub async fn my_requests(conn: &mut PgConnection, identity_hash: &str) -> AppResult<Vec<OnboardingRow>> {
    Ok(onboarding::list_for_identity(conn, identity_hash).await?)
}

/// Sends a CHANGES_REQUESTED declaration back to PENDING, replacing it when `declaration` is
/// given.
pub async fn resubmit(
    conn: &mut PgConnection,
    identity_hash: &str,
    onboarding_id: Uuid,
    declaration: Option<ServiceDeclaration>,
) -> AppResult<OnboardingRow> {
    let row = onboarding::find_for_update(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))?;
    if row.provider_identity_hash != identity_hash {
        return Err(AppError::Forbidden(
            "You can only resubmit your own onboarding requests".to_string(),
        ));
    }

    registration::resubmit(row.status()?)?;
    let declaration = declaration.unwrap_or_else(|| row.declaration()).validated()?;
    onboarding::resubmit(conn, onboarding_id, &declaration).await?;

    onboarding::find(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))
}

pub async fn list(conn: &mut PgConnection, status: Option<RegistrationStatus>) -> AppResult<Vec<OnboardingRow>> {
    Ok(onboarding::list(conn, status).await?)
}

pub async fn get(conn: &mut PgConnection, onboarding_id: Uuid) -> AppResult<OnboardingRow> {
    onboarding::find(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))
}

pub async fn review(
    conn: &mut PgConnection,
    onboarding_id: Uuid,
    action: &ReviewAction,
    reviewer: Uuid,
) -> AppResult<OnboardingReview> {
    let row = onboarding::find_for_update(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))?;

    let outcome = action.apply(row.status()?)?;
    let service = if outcome.status == RegistrationStatus::Approved {
        let service = services::upsert_declared(conn, &row.declaration(), row.service_provider_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Service identifier '{}' belongs to another provider",
                    row.service_identifier
                ))
            })?;
        Some(service)
    } else {
        None
    };

    let notes = outcome.admin_comments.as_deref().or(outcome.rejection_reason.as_deref());
    onboarding::record_review(
        conn,
        onboarding_id,
        outcome.status,
        notes,
        reviewer,
        service.as_ref().map(|s| s.service_id),
    )
    .await?;
    tracing::info!(%onboarding_id, status = %outcome.status, %reviewer, "onboarding reviewed");

    let request = onboarding::find(conn, onboarding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Onboarding request"))?;
    Ok(OnboardingReview { request, service })
}
