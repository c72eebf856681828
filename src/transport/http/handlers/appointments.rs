use crate::app::activity_service;
use crate::app::appointment_service::{self, BookingRequest};
use crate::app::AppError;
use crate::domain::appointment::AppointmentAction;
use crate::domain::identity::Role;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::{created, ok};
use crate::transport::http::types::{
    ApiResponse, AppState, AppointmentActionRequest, BookAppointmentRequest,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/appointments/providers/esanjeevani",
    tag = "appointments",
    security(("bearer" = [])),
    responses((status = 200, description = "Providers with an ACTIVE e-Sanjeevani service", body = ApiResponse))
)]
pub async fn list_providers_handler(State(state): State<AppState>, _user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    ok(appointment_service::list_providers(&mut conn).await?)
}

#[utoipa::path(
    post,
    path = "/appointments/book",
    tag = "appointments",
    security(("bearer" = [])),
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "PENDING appointment created", body = ApiResponse),
        (status = 400, description = "Bad date/time or slot already booked", body = ApiResponse),
        (status = 403, description = "Caller is not a citizen", body = ApiResponse),
        (status = 404, description = "Provider not found or inactive", body = ApiResponse)
    )
)]
pub async fn book_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    user.require(Role::Citizen)?;
    let Json(request) = request.map_err(|e| {
        json_422(
            e,
            "{\"esanjeevani_provider_id\": \"uuid\", \"appointment_date\": \"YYYY-MM-DD\", \"appointment_time\": \"HH:MM\"}",
        )
    })?;
    let booking = BookingRequest {
        esanjeevani_provider_id: request.esanjeevani_provider_id,
        appointment_date: request.appointment_date,
        appointment_time: request.appointment_time,
        symptoms: request.symptoms,
        medical_history: request.medical_history,
    };

    let mut tx = state.db.begin().await?;
    let appointment = appointment_service::book(&mut tx, &user.identity_hash, &booking).await?;
    tx.commit().await?;

    // The history entry is not part of the booking; losing it must not fail the request.
    let logged = async {
        let mut conn = state.db.pool().acquire().await?;
        activity_service::record_booking(&mut conn, &appointment).await
    };
    if let Err(e) = logged.await {
        tracing::warn!(consultation_id = %appointment.consultation_id, error = %e, "failed to log booking activity");
    }

    created(appointment)
}

#[utoipa::path(
    get,
    path = "/appointments/my-appointments",
    tag = "appointments",
    security(("bearer" = [])),
    responses((status = 200, description = "The caller's appointments", body = ApiResponse))
)]
pub async fn my_appointments_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    user.require(Role::Citizen)?;
    let mut conn = state.db.pool().acquire().await?;
    ok(appointment_service::my_appointments(&mut conn, &user.identity_hash).await?)
}

#[utoipa::path(
    get,
    path = "/appointments/provider/appointments",
    tag = "appointments",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Appointments booked with the calling provider", body = ApiResponse),
        (status = 403, description = "Caller is not a service provider", body = ApiResponse)
    )
)]
pub async fn provider_appointments_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    user.require(Role::ServiceProvider)?;
    let mut conn = state.db.pool().acquire().await?;
    ok(appointment_service::provider_appointments(&mut conn, &user.identity_hash).await?)
}

#[utoipa::path(
    put,
    path = "/appointments/provider/appointments/{consultation_id}/action",
    tag = "appointments",
    security(("bearer" = [])),
    params(("consultation_id" = String, Path, description = "Appointment id")),
    request_body = AppointmentActionRequest,
    responses(
        (status = 200, description = "Appointment approved or rejected", body = ApiResponse),
        (status = 400, description = "Bad action, missing reason, or not PENDING", body = ApiResponse),
        (status = 403, description = "Appointment belongs to another provider", body = ApiResponse),
        (status = 404, description = "Unknown appointment", body = ApiResponse)
    )
)]
pub async fn appointment_action_handler(
    State(state): State<AppState>,
    user: AuthUser,
    consultation_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<AppointmentActionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    user.require(Role::ServiceProvider)?;
    let Path(consultation_id) = consultation_id?;
    let Json(request) = request.map_err(|e| {
        json_422(e, "{\"action\": \"APPROVE|REJECT\", \"rejection_reason\": \"...\", \"provider_notes\": \"...\"}")
    })?;
    let action = AppointmentAction::parse(&request.action, request.rejection_reason, request.provider_notes)
        .map_err(AppError::from)?;

    let mut tx = state.db.begin().await?;
    let appointment = appointment_service::decide(&mut tx, &user.identity_hash, consultation_id, &action).await?;
    tx.commit().await?;

    ok(appointment)
}
