use crate::app::citizen_service::require_citizen;
use crate::app::error::{AppError, AppResult};
use crate::domain::non_blank;
use crate::storage::repo::activity::{self, ActivityRow, NewActivity};
use crate::storage::repo::appointments::AppointmentRow;
use serde_json::json;
use sqlx::PgConnection;
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: i64 = 100;
pub const MAX_HISTORY_LIMIT: i64 = 500;

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT)
}

pub async fn log(conn: &mut PgConnection, identity_hash: &str, activity: NewActivity) -> AppResult<Uuid> {
    let activity_type = non_blank(Some(&activity.activity_type))
        .map(|t| t.to_uppercase())
        .ok_or_else(|| AppError::Validation("activity_type is required".to_string()))?;
    let activity_description = non_blank(Some(&activity.activity_description))
        .ok_or_else(|| AppError::Validation("activity_description is required".to_string()))?;

    let citizen = require_citizen(conn, identity_hash).await?;
    let activity = NewActivity {
        activity_type,
        activity_description,
        entity_type: non_blank(activity.entity_type.as_deref()),
        entity_id: non_blank(activity.entity_id.as_deref()),
        metadata: activity.metadata,
    };
    Ok(activity::insert(conn, citizen.citizen_id, &activity).await?)
}

pub async fn history(
    conn: &mut PgConnection,
    identity_hash: &str,
    activity_type: Option<&str>,
    limit: Option<i64>,
) -> AppResult<Vec<ActivityRow>> {
    let citizen = require_citizen(conn, identity_hash).await?;
    let activity_type = non_blank(activity_type).map(|t| t.to_uppercase());
    Ok(activity::list(conn, citizen.citizen_id, activity_type.as_deref(), clamp_limit(limit)).await?)
}

/// BOOK_APPOINTMENT entry for a freshly booked consultation.
pub async fn record_booking(conn: &mut PgConnection, appointment: &AppointmentRow) -> AppResult<Uuid> {
    let provider = appointment.provider_name.as_deref().unwrap_or("Service Provider");
    let activity = NewActivity {
        activity_type: "BOOK_APPOINTMENT".to_string(),
        activity_description: format!(
            "Booked appointment with {} on {} at {}",
            provider,
            appointment.appointment_date,
            appointment.appointment_time.format("%H:%M")
        ),
        entity_type: Some("appointment".to_string()),
        entity_id: Some(appointment.consultation_id.to_string()),
        metadata: Some(json!({
            "appointment_date": appointment.appointment_date.to_string(),
            "appointment_time": appointment.appointment_time.format("%H:%M").to_string(),
            "provider_name": provider,
        })),
    };
    Ok(activity::insert(conn, appointment.citizen_id, &activity).await?)
}
