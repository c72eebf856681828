use crate::app::{onboarding_service, registration_service};
use crate::app::AppError;
use crate::domain::identity::Role;
use crate::domain::registration::RequestType;
use crate::storage::repo::{onboarding, registrations};
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::{body_or_default, created, ok};
use crate::transport::http::types::{
    ApiResponse, AppState, ApplicationFields, OnboardingRequest, OnboardingUpdate,
    RegisterProviderRequest,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/sp-registration/register",
    tag = "sp-registration",
    security(("bearer" = [])),
    request_body = RegisterProviderRequest,
    responses(
        (status = 201, description = "PENDING request created and assigned to an admin", body = ApiResponse),
        (status = 400, description = "Missing fields or a request of this type already exists", body = ApiResponse),
        (status = 404, description = "Citizen profile not found", body = ApiResponse),
        (status = 500, description = "No admin available", body = ApiResponse)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<RegisterProviderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| {
        json_422(e, "{\"request_type\": \"ESANJEEVANI|MKISAN\", ...application fields}")
    })?;
    let request_type: RequestType = request.request_type.parse().map_err(AppError::from)?;

    let mut tx = state.db.begin().await?;
    let row = registration_service::submit(
        &mut tx,
        &user.identity_hash,
        request_type,
        request.fields.into(),
    )
    .await?;
    tx.commit().await?;

    created(row)
}

#[utoipa::path(
    get,
    path = "/sp-registration/my-requests",
    tag = "sp-registration",
    security(("bearer" = [])),
    responses((status = 200, description = "The caller's registration requests", body = ApiResponse))
)]
pub async fn my_requests_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    ok(registration_service::my_requests(&mut conn, &user.identity_hash).await?)
}

#[utoipa::path(
    put,
    path = "/sp-registration/requests/{request_id}/resubmit",
    tag = "sp-registration",
    security(("bearer" = [])),
    params(("request_id" = String, Path, description = "Registration request id")),
    request_body = ApplicationFields,
    responses(
        (status = 200, description = "Request is PENDING again", body = ApiResponse),
        (status = 400, description = "Request is not in CHANGES_REQUESTED", body = ApiResponse),
        (status = 403, description = "Request belongs to someone else", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn resubmit_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ApplicationFields>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(request_id) = request_id?;
    let fields = body_or_default(body, "{...application fields to change}")?;

    let mut tx = state.db.begin().await?;
    let details = if fields.is_empty() {
        None
    } else {
        let current = registrations::find(&mut tx, request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Registration request"))?;
        Some(fields.merged_over(current.details()))
    };
    let row = registration_service::resubmit(&mut tx, &user.identity_hash, request_id, details).await?;
    tx.commit().await?;

    ok(row)
}

#[utoipa::path(
    post,
    path = "/sp-registration/onboarding-requests",
    tag = "sp-registration",
    security(("bearer" = [])),
    request_body = OnboardingRequest,
    responses(
        (status = 201, description = "PENDING onboarding request created", body = ApiResponse),
        (status = 400, description = "Invalid declaration or identifier already under review", body = ApiResponse),
        (status = 403, description = "Caller is not a service provider", body = ApiResponse)
    )
)]
pub async fn submit_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<OnboardingRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    user.require(Role::ServiceProvider)?;
    let Json(request) = request.map_err(|e| {
        json_422(
            e,
            "{\"name\", \"category\", \"service_identifier\", \"description\", \"base_url\"}",
        )
    })?;

    let mut tx = state.db.begin().await?;
    let row = onboarding_service::submit(&mut tx, &user.identity_hash, request.into()).await?;
    tx.commit().await?;

    created(row)
}

#[utoipa::path(
    get,
    path = "/sp-registration/onboarding-requests",
    tag = "sp-registration",
    security(("bearer" = [])),
    responses((status = 200, description = "The caller's onboarding requests", body = ApiResponse))
)]
pub async fn my_onboarding_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    ok(onboarding_service::my_requests(&mut conn, &user.identity_hash).await?)
}

#[utoipa::path(
    put,
    path = "/sp-registration/onboarding-requests/{onboarding_id}/resubmit",
    tag = "sp-registration",
    security(("bearer" = [])),
    params(("onboarding_id" = String, Path, description = "Onboarding request id")),
    request_body = OnboardingUpdate,
    responses(
        (status = 200, description = "Request is PENDING again", body = ApiResponse),
        (status = 400, description = "Request is not in CHANGES_REQUESTED", body = ApiResponse),
        (status = 403, description = "Request belongs to someone else", body = ApiResponse),
        (status = 404, description = "Unknown request", body = ApiResponse)
    )
)]
pub async fn resubmit_onboarding_handler(
    State(state): State<AppState>,
    user: AuthUser,
    onboarding_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<OnboardingUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(onboarding_id) = onboarding_id?;
    let update = body_or_default(body, "{...declaration fields to change}")?;

    let mut tx = state.db.begin().await?;
    let declaration = if update.is_empty() {
        None
    } else {
        let current = onboarding::find(&mut tx, onboarding_id)
            .await?
            .ok_or_else(|| AppError::not_found("Onboarding request"))?;
        Some(update.merged_over(current.declaration()))
    };
    let row = onboarding_service::resubmit(&mut tx, &user.identity_hash, onboarding_id, declaration).await?;
    tx.commit().await?;

    ok(row)
}
