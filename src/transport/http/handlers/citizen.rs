use crate::app::citizen_service;
use crate::app::AppError;
use crate::domain::non_blank;
use crate::storage::repo::citizens::{CitizenRow, ProfileUpdate};
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::ok;
use crate::transport::http::types::{ApiResponse, AppState, CitizenProfileResponse, ProfileUpdateRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;

fn profile_response(citizen: CitizenRow) -> CitizenProfileResponse {
    let age = citizen_service::age_of(&citizen);
    CitizenProfileResponse { citizen, age }
}

#[utoipa::path(
    get,
    path = "/citizen/profile",
    tag = "citizen",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile with derived age", body = ApiResponse),
        (status = 404, description = "Citizen profile not found", body = ApiResponse)
    )
)]
pub async fn get_profile_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    let citizen = citizen_service::require_citizen(&mut conn, &user.identity_hash).await?;
    ok(profile_response(citizen))
}

#[utoipa::path(
    put,
    path = "/citizen/profile",
    tag = "citizen",
    security(("bearer" = [])),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse),
        (status = 400, description = "Invalid gender or date of birth", body = ApiResponse),
        (status = 404, description = "Citizen profile not found", body = ApiResponse)
    )
)]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| {
        json_422(e, "{\"full_name\", \"phone\", \"gender\", \"date_of_birth\": \"YYYY-MM-DD\", \"address\"}")
    })?;
    let date_of_birth = non_blank(request.date_of_birth.as_deref())
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::Validation("date_of_birth must be formatted YYYY-MM-DD".to_string()))?;
    let update = ProfileUpdate {
        full_name: non_blank(request.full_name.as_deref()),
        phone: non_blank(request.phone.as_deref()),
        gender: non_blank(request.gender.as_deref()),
        date_of_birth,
        address: non_blank(request.address.as_deref()),
    };

    let mut tx = state.db.begin().await?;
    let citizen = citizen_service::update_profile(&mut tx, &user.identity_hash, update).await?;
    tx.commit().await?;

    ok(profile_response(citizen))
}
