use crate::app::{onboarding_service, registration_service};
use crate::app::AppError;
use crate::domain::identity::Role;
use crate::domain::registration::{RegistrationStatus, ReviewAction};
use crate::storage::repo::admins;
use crate::storage::repo::registrations::RegistrationFilter;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::ApiError;
use crate::transport::http::handlers::common::{body_or_default, ok};
use crate::transport::http::types::{
    ApiResponse, AppState, OnboardingListQuery, OnboardingReviewRequest, OnboardingReviewResponse,
    RegistrationListQuery, ReviewRequest, ReviewResponse,
};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use sqlx::PgConnection;
use uuid::Uuid;

/// The admin record behind the caller's account.
async fn acting_admin(conn: &mut PgConnection, user: &AuthUser) -> Result<admins::AdminSummary, ApiError> {
    user.require(Role::Admin)?;
    Ok(admins::find_by_user_id(conn, user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No admin profile is linked to this account".to_string()))?)
}

#[utoipa::path(
    get,
    path = "/admin/sp-registration-requests",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("status" = Option<String>, Query, description = "PENDING, APPROVED, REJECTED or CHANGES_REQUESTED"),
        ("assigned_to_me" = Option<bool>, Query, description = "Only requests assigned to the caller")
    ),
    responses(
        (status = 200, description = "Registration requests, newest first", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse)
    )
)]
pub async fn list_requests_handler(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<RegistrationListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let mut conn = state.db.pool().acquire().await?;
    let admin = acting_admin(&mut conn, &user).await?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<RegistrationStatus>)
        .transpose()
        .map_err(AppError::from)?;
    let filter = RegistrationFilter {
        status,
        assigned_admin_id: query.assigned_to_me.then_some(admin.admin_id),
    };
    ok(registration_service::list(&mut conn, &filter).await?)
}

#[utoipa::path(
    get,
    path = "/admin/sp-registration-requests/{request_id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("request_id" = String, Path, description = "Registration request id")),
    responses(
        (status = 200, description = "Registration request", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn get_request_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(request_id) = request_id?;
    let mut conn = state.db.pool().acquire().await?;
    acting_admin(&mut conn, &user).await?;
    ok(registration_service::get(&mut conn, request_id).await?)
}

/// Review text from the JSON body, falling back to the query string. A missing body is
/// treated as empty so the workflow rules decide whether the text was required.
fn review_input(
    query: Result<Query<ReviewRequest>, QueryRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
    expected: &str,
) -> Result<ReviewRequest, ApiError> {
    let Query(query) = query?;
    Ok(body_or_default(body, expected)?.or(query))
}

async fn review(
    state: AppState,
    user: AuthUser,
    request_id: Uuid,
    action: ReviewAction,
    message: &str,
) -> Result<Response, ApiError> {
    let mut tx = state.db.begin().await?;
    let admin = acting_admin(&mut tx, &user).await?;
    let result = registration_service::review(&mut tx, request_id, &action, admin.admin_id).await?;
    tx.commit().await?;

    ok(ReviewResponse {
        message: message.to_string(),
        request: result.request,
        service: result.service,
    })
}

#[utoipa::path(
    put,
    path = "/admin/sp-registration-requests/{request_id}/approve",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("request_id" = String, Path, description = "Registration request id"),
        ("admin_comments" = Option<String>, Query, description = "Used when the body omits it"),
        ("rejection_reason" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Approved; the service is active", body = ApiResponse),
        (status = 400, description = "Request is not reviewable", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn approve_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReviewRequest>, QueryRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(request_id) = request_id?;
    let body = review_input(query, body, "{\"admin_comments\": \"...\"}")?;
    let action = ReviewAction::Approve {
        comments: body.admin_comments,
    };
    review(state, user, request_id, action, "Registration request approved").await
}

#[utoipa::path(
    put,
    path = "/admin/sp-registration-requests/{request_id}/reject",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("request_id" = String, Path, description = "Registration request id"),
        ("admin_comments" = Option<String>, Query, description = "Used when the body omits it"),
        ("rejection_reason" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Rejected", body = ApiResponse),
        (status = 400, description = "Missing reason or request is not reviewable", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn reject_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReviewRequest>, QueryRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(request_id) = request_id?;
    let body = review_input(query, body, "{\"rejection_reason\": \"...\"}")?;
    let action = ReviewAction::Reject {
        reason: body.rejection_reason,
    };
    review(state, user, request_id, action, "Registration request rejected").await
}

#[utoipa::path(
    put,
    path = "/admin/sp-registration-requests/{request_id}/request-changes",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("request_id" = String, Path, description = "Registration request id"),
        ("admin_comments" = Option<String>, Query, description = "Used when the body omits it"),
        ("rejection_reason" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Changes requested from the applicant", body = ApiResponse),
        (status = 400, description = "Missing comments or request is not reviewable", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn request_changes_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ReviewRequest>, QueryRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(request_id) = request_id?;
    let body = review_input(query, body, "{\"admin_comments\": \"...\"}")?;
    let action = ReviewAction::RequestChanges {
        comments: body.admin_comments,
    };
    review(state, user, request_id, action, "Changes requested").await
}

#[utoipa::path(
    get,
    path = "/admin/services",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, description = "Service registry", body = ApiResponse))
)]
pub async fn list_services_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    user.require(Role::Admin)?;
    let mut conn = state.db.pool().acquire().await?;
    ok(registration_service::list_services(&mut conn).await?)
}

async fn set_service_active(
    state: AppState,
    user: AuthUser,
    service_id: Uuid,
    active: bool,
) -> Result<Response, ApiError> {
    user.require(Role::Admin)?;
    let mut tx = state.db.begin().await?;
    let service = registration_service::set_service_active(&mut tx, service_id, active).await?;
    tx.commit().await?;
    tracing::info!(%service_id, status = %service.status, "service status changed");
    ok(service)
}

#[utoipa::path(
    put,
    path = "/admin/services/{service_id}/activate",
    tag = "admin",
    security(("bearer" = [])),
    params(("service_id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service is ACTIVE", body = ApiResponse),
        (status = 404, description = "Unknown service", body = ApiResponse)
    )
)]
pub async fn activate_service_handler(
    State(state): State<AppState>,
    user: AuthUser,
    service_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(service_id) = service_id?;
    set_service_active(state, user, service_id, true).await
}

#[utoipa::path(
    put,
    path = "/admin/services/{service_id}/deactivate",
    tag = "admin",
    security(("bearer" = [])),
    params(("service_id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service is INACTIVE", body = ApiResponse),
        (status = 404, description = "Unknown service", body = ApiResponse)
    )
)]
pub async fn deactivate_service_handler(
    State(state): State<AppState>,
    user: AuthUser,
    service_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(service_id) = service_id?;
    set_service_active(state, user, service_id, false).await
}

// --- service onboarding review ---

#[utoipa::path(
    get,
    path = "/admin/onboarding-requests",
    tag = "admin",
    security(("bearer" = [])),
    params(("status" = Option<String>, Query, description = "PENDING, APPROVED, REJECTED or CHANGES_REQUESTED")),
    responses(
        (status = 200, description = "Onboarding requests, newest first", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse)
    )
)]
pub async fn list_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<OnboardingListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let mut conn = state.db.pool().acquire().await?;
    acting_admin(&mut conn, &user).await?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<RegistrationStatus>)
        .transpose()
        .map_err(AppError::from)?;
    ok(onboarding_service::list(&mut conn, status).await?)
}

#[utoipa::path(
    get,
    path = "/admin/onboarding-requests/{onboarding_id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("onboarding_id" = String, Path, description = "Onboarding request id")),
    responses(
        (status = 200, description = "Onboarding request", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn get_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    onboarding_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(onboarding_id) = onboarding_id?;
    let mut conn = state.db.pool().acquire().await?;
    acting_admin(&mut conn, &user).await?;
    ok(onboarding_service::get(&mut conn, onboarding_id).await?)
}

fn admin_notes(
    query: Result<Query<OnboardingReviewRequest>, QueryRejection>,
    body: Result<Json<OnboardingReviewRequest>, JsonRejection>,
) -> Result<Option<String>, ApiError> {
    let Query(query) = query?;
    let body = body_or_default(body, "{\"admin_notes\": \"...\"}")?;
    Ok(body.admin_notes.or(query.admin_notes))
}

async fn review_onboarding(
    state: AppState,
    user: AuthUser,
    onboarding_id: Uuid,
    action: ReviewAction,
    message: &str,
) -> Result<Response, ApiError> {
    let mut tx = state.db.begin().await?;
    let admin = acting_admin(&mut tx, &user).await?;
    let result = onboarding_service::review(&mut tx, onboarding_id, &action, admin.admin_id).await?;
    tx.commit().await?;

    ok(OnboardingReviewResponse {
        message: message.to_string(),
        request: result.request,
        service: result.service,
    })
}

#[utoipa::path(
    put,
    path = "/admin/onboarding-requests/{onboarding_id}/approve",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("onboarding_id" = String, Path, description = "Onboarding request id"),
        ("admin_notes" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = OnboardingReviewRequest,
    responses(
        (status = 200, description = "Approved; the declared service is ACTIVE", body = ApiResponse),
        (status = 400, description = "Not reviewable, or the identifier belongs to another provider", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn approve_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    onboarding_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnboardingReviewRequest>, QueryRejection>,
    body: Result<Json<OnboardingReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(onboarding_id) = onboarding_id?;
    let action = ReviewAction::Approve {
        comments: admin_notes(query, body)?,
    };
    review_onboarding(state, user, onboarding_id, action, "Onboarding request approved").await
}

#[utoipa::path(
    put,
    path = "/admin/onboarding-requests/{onboarding_id}/reject",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("onboarding_id" = String, Path, description = "Onboarding request id"),
        ("admin_notes" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = OnboardingReviewRequest,
    responses(
        (status = 200, description = "Rejected", body = ApiResponse),
        (status = 400, description = "Missing notes or request is not reviewable", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn reject_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    onboarding_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnboardingReviewRequest>, QueryRejection>,
    body: Result<Json<OnboardingReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(onboarding_id) = onboarding_id?;
    let action = ReviewAction::Reject {
        reason: admin_notes(query, body)?,
    };
    review_onboarding(state, user, onboarding_id, action, "Onboarding request rejected").await
}

#[utoipa::path(
    put,
    path = "/admin/onboarding-requests/{onboarding_id}/request-changes",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("onboarding_id" = String, Path, description = "Onboarding request id"),
        ("admin_notes" = Option<String>, Query, description = "Used when the body omits it")
    ),
    request_body = OnboardingReviewRequest,
    responses(
        (status = 200, description = "Changes requested from the provider", body = ApiResponse),
        (status = 400, description = "Missing notes or request is not reviewable", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn request_onboarding_changes_handler(
    State(state): State<AppState>,
    user: AuthUser,
    onboarding_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<OnboardingReviewRequest>, QueryRejection>,
    body: Result<Json<OnboardingReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(onboarding_id) = onboarding_id?;
    let action = ReviewAction::RequestChanges {
        comments: admin_notes(query, body)?,
    };
    review_onboarding(state, user, onboarding_id, action, "Changes requested").await
}
