use crate::domain::appointment::{AppointmentDecision, AppointmentStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

/// A consultation request with the names of both parties.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct AppointmentRow {
    #[schema(value_type = String)]
    pub consultation_id: Uuid,
    #[schema(value_type = String)]
    pub citizen_id: Uuid,
    #[schema(value_type = String)]
    pub esanjeevani_provider_id: Uuid,
    #[schema(value_type = String)]
    pub appointment_date: NaiveDate,
    #[schema(value_type = String)]
    pub appointment_time: NaiveTime,
    pub status: String,
    pub symptoms: Option<String>,
    pub medical_history: Option<String>,
    pub rejection_reason: Option<String>,
    pub provider_notes: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    pub provider_name: Option<String>,
    pub specialization: String,
    pub citizen_name: Option<String>,
    pub citizen_phone: Option<String>,
}

impl AppointmentRow {
    pub fn status(&self) -> Result<AppointmentStatus, crate::domain::DomainError> {
        self.status.parse()
    }
}

pub struct NewAppointment<'a> {
    pub citizen_id: Uuid,
    pub esanjeevani_provider_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub symptoms: Option<&'a str>,
    pub medical_history: Option<&'a str>,
}

const SELECT_APPOINTMENT: &str = "SELECT cr.consultation_id, cr.citizen_id, cr.esanjeevani_provider_id,
            cr.appointment_date, cr.appointment_time, cr.status, cr.symptoms, cr.medical_history,
            cr.rejection_reason, cr.provider_notes, cr.created_at, cr.updated_at,
            sp.full_name AS provider_name, esp.specialization,
            c.full_name AS citizen_name, c.phone AS citizen_phone
     FROM consultation_requests cr
     JOIN esanjeevani_providers esp ON esp.esanjeevani_provider_id = cr.esanjeevani_provider_id
     JOIN service_providers sp ON sp.service_provider_id = esp.service_provider_id
     JOIN citizens c ON c.citizen_id = cr.citizen_id";

/// Inserts a PENDING request. A taken slot surfaces as a unique violation.
pub async fn insert(conn: &mut PgConnection, new: &NewAppointment<'_>) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO consultation_requests
            (consultation_id, citizen_id, esanjeevani_provider_id, appointment_date,
             appointment_time, status, symptoms, medical_history)
         VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7)
         RETURNING consultation_id",
    )
    .bind(Uuid::new_v4())
    .bind(new.citizen_id)
    .bind(new.esanjeevani_provider_id)
    .bind(new.date)
    .bind(new.time)
    .bind(new.symptoms)
    .bind(new.medical_history)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find(conn: &mut PgConnection, consultation_id: Uuid) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!("{} WHERE cr.consultation_id = $1", SELECT_APPOINTMENT))
        .bind(consultation_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_for_update(
    conn: &mut PgConnection,
    consultation_id: Uuid,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{} WHERE cr.consultation_id = $1 FOR UPDATE OF cr",
        SELECT_APPOINTMENT
    ))
    .bind(consultation_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list_for_citizen(conn: &mut PgConnection, citizen_id: Uuid) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{} WHERE cr.citizen_id = $1 ORDER BY cr.appointment_date DESC, cr.created_at DESC",
        SELECT_APPOINTMENT
    ))
    .bind(citizen_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn list_for_provider(
    conn: &mut PgConnection,
    esanjeevani_provider_id: Uuid,
) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{} WHERE cr.esanjeevani_provider_id = $1
         ORDER BY cr.appointment_date ASC, cr.appointment_time ASC",
        SELECT_APPOINTMENT
    ))
    .bind(esanjeevani_provider_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn record_decision(
    conn: &mut PgConnection,
    consultation_id: Uuid,
    decision: &AppointmentDecision,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE consultation_requests
         SET status = $2, rejection_reason = $3, provider_notes = $4, updated_at = now()
         WHERE consultation_id = $1",
    )
    .bind(consultation_id)
    .bind(decision.status.as_str())
    .bind(decision.rejection_reason.as_deref())
    .bind(decision.provider_notes.as_deref())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
