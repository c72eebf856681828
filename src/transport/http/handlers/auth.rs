use crate::app::auth_service::{self, AccessGrant};
use crate::app::AppError;
use crate::storage::repo::users;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::ok;
use crate::transport::http::types::{
    AdminLoginRequest, ApiResponse, AppState, LoginRequest, LoginResponse, TokenResponse,
    VerifyOtpRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

fn token_response(grant: AccessGrant) -> TokenResponse {
    TokenResponse {
        access_token: grant.access_token,
        token_type: "bearer".to_string(),
        user_id: grant.user_id,
        role: grant.role,
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "OTP issued", body = ApiResponse),
        (status = 400, description = "Malformed national ID", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| json_422(e, "{\"aadhar\": \"...\"}"))?;

    let mut tx = state.db.begin().await?;
    let issued = auth_service::start_login(
        &mut tx,
        &state.otp,
        &state.config.identity_hash_salt,
        &request.aadhar,
    )
    .await?;
    tx.commit().await?;

    ok(LoginResponse {
        otp_id: issued.otp_id,
        message: "OTP sent to registered mobile number".to_string(),
        expires_in: issued.expires_in.as_secs(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Access token", body = ApiResponse),
        (status = 401, description = "Invalid or expired OTP", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    request: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| {
        json_422(e, "{\"aadhar\": \"...\", \"otp_id\": \"uuid\", \"otp_code\": \"123456\"}")
    })?;

    let mut tx = state.db.begin().await?;
    let grant = auth_service::verify_login(
        &mut tx,
        &state.otp,
        &state.tokens,
        &state.config.identity_hash_salt,
        &request.aadhar,
        request.otp_id,
        &request.otp_code,
    )
    .await?;
    tx.commit().await?;

    ok(token_response(grant))
}

#[utoipa::path(
    post,
    path = "/auth/admin/login",
    tag = "auth",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Access token", body = ApiResponse),
        (status = 401, description = "Invalid username or password", body = ApiResponse)
    )
)]
pub async fn admin_login_handler(
    State(state): State<AppState>,
    request: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) =
        request.map_err(|e| json_422(e, "{\"username\": \"...\", \"password\": \"...\"}"))?;

    let mut tx = state.db.begin().await?;
    let grant =
        auth_service::admin_login(&mut tx, &state.tokens, &request.username, &request.password)
            .await?;
    tx.commit().await?;

    ok(token_response(grant))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    )
)]
pub async fn me_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    let row = users::find_by_id(&mut conn, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    ok(row)
}
