//! e-Sanjeevani consultation requests: PENDING → APPROVED | REJECTED.

use super::{non_blank, DomainError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Approved => "APPROVED",
            AppointmentStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "APPROVED" => Ok(AppointmentStatus::Approved),
            "REJECTED" => Ok(AppointmentStatus::Rejected),
            other => Err(DomainError::Validation(format!(
                "unknown appointment status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDecision {
    pub status: AppointmentStatus,
    pub rejection_reason: Option<String>,
    pub provider_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentAction {
    Approve { notes: Option<String> },
    Reject { reason: Option<String>, notes: Option<String> },
}

impl AppointmentAction {
    /// Parses the wire form (`APPROVE` / `REJECT`).
    pub fn parse(
        action: &str,
        rejection_reason: Option<String>,
        provider_notes: Option<String>,
    ) -> Result<Self, DomainError> {
        match action.trim().to_uppercase().as_str() {
            "APPROVE" => Ok(AppointmentAction::Approve { notes: provider_notes }),
            "REJECT" => Ok(AppointmentAction::Reject {
                reason: rejection_reason,
                notes: provider_notes,
            }),
            _ => Err(DomainError::Validation(
                "Action must be 'APPROVE' or 'REJECT'".to_string(),
            )),
        }
    }

    pub fn apply(&self, current: AppointmentStatus) -> Result<AppointmentDecision, DomainError> {
        let decision = match self {
            AppointmentAction::Approve { notes } => AppointmentDecision {
                status: AppointmentStatus::Approved,
                rejection_reason: None,
                provider_notes: non_blank(notes.as_deref()),
            },
            AppointmentAction::Reject { reason, notes } => AppointmentDecision {
                status: AppointmentStatus::Rejected,
                rejection_reason: Some(non_blank(reason.as_deref()).ok_or_else(|| {
                    DomainError::Validation(
                        "Rejection reason is required when rejecting an appointment".to_string(),
                    )
                })?),
                provider_notes: non_blank(notes.as_deref()),
            },
        };
        if current != AppointmentStatus::Pending {
            return Err(DomainError::Conflict(format!(
                "Appointment is already {}",
                current
            )));
        }
        Ok(decision)
    }
}

/// Parses the `YYYY-MM-DD` / `HH:MM[:SS]` slot submitted by the citizen.
pub fn parse_slot(date: &str, time: &str) -> Result<(NaiveDate, NaiveTime), DomainError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::Validation("appointment_date must be formatted YYYY-MM-DD".to_string())
    })?;
    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| {
            DomainError::Validation("appointment_time must be formatted HH:MM".to_string())
        })?;
    Ok((date, time))
}
