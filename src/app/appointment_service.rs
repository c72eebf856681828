//! e-Sanjeevani consultation booking and provider decisions.

use crate::app::citizen_service::require_citizen;
use crate::app::error::{AppError, AppResult};
use crate::domain::appointment::{parse_slot, AppointmentAction};
use crate::domain::non_blank;
use crate::storage::repo::appointments::{self, AppointmentRow, NewAppointment};
use crate::storage::repo::providers::{self, EsanjeevaniProviderView};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub esanjeevani_provider_id: Uuid,
    pub appointment_date: String,
    pub appointment_time: String,
    pub symptoms: Option<String>,
    pub medical_history: Option<String>,
}

pub async fn list_providers(conn: &mut PgConnection) -> AppResult<Vec<EsanjeevaniProviderView>> {
    Ok(providers::list_active_esanjeevani(conn).await?)
}

/// Books a PENDING consultation with an active provider. A slot already held by a
/// non-rejected appointment is refused.
pub async fn book(
    conn: &mut PgConnection,
    identity_hash: &str,
    request: &BookingRequest,
) -> AppResult<AppointmentRow> {
    let citizen = require_citizen(conn, identity_hash).await?;
    let (date, time) = parse_slot(&request.appointment_date, &request.appointment_time)?;

    providers::find_active_esanjeevani(conn, request.esanjeevani_provider_id)
        .await?
        .ok_or_else(|| AppError::not_found("e-Sanjeevani provider"))?;

    let symptoms = non_blank(request.symptoms.as_deref());
    let medical_history = non_blank(request.medical_history.as_deref());
    let consultation_id = appointments::insert(
        conn,
        &NewAppointment {
            citizen_id: citizen.citizen_id,
            esanjeevani_provider_id: request.esanjeevani_provider_id,
            date,
            time,
            symptoms: symptoms.as_deref(),
            medical_history: medical_history.as_deref(),
        },
    )
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(
            "An appointment already exists for this provider at that date and time".to_string(),
        ),
        other => other,
    })?;

    appointments::find(conn, consultation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))
}

/// The caller's appointments; empty when the citizen record does not exist yet.
pub async fn my_appointments(conn: &mut PgConnection, identity_hash: &str) -> AppResult<Vec<AppointmentRow>> {
    match crate::storage::repo::citizens::find_by_identity(conn, identity_hash).await? {
        Some(citizen) => Ok(appointments::list_for_citizen(conn, citizen.citizen_id).await?),
        None => Ok(Vec::new()),
    }
}

/// Appointments booked with the calling provider; empty for providers without an
/// e-Sanjeevani profile.
pub async fn provider_appointments(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> AppResult<Vec<AppointmentRow>> {
    match providers::esanjeevani_id_for_identity(conn, identity_hash).await? {
        Some(provider_id) => Ok(appointments::list_for_provider(conn, provider_id).await?),
        None => Ok(Vec::new()),
    }
}

pub async fn decide(
    conn: &mut PgConnection,
    identity_hash: &str,
    consultation_id: Uuid,
    action: &AppointmentAction,
) -> AppResult<AppointmentRow> {
    let row = appointments::find_for_update(conn, consultation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))?;

    let own_provider = providers::esanjeevani_id_for_identity(conn, identity_hash).await?;
    if own_provider != Some(row.esanjeevani_provider_id) {
        return Err(AppError::Forbidden(
            "You don't have permission to manage this appointment".to_string(),
        ));
    }

    let decision = action.apply(row.status()?)?;
    appointments::record_decision(conn, consultation_id, &decision).await?;
    tracing::info!(%consultation_id, status = %decision.status, "appointment decided");

    appointments::find(conn, consultation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))
}
