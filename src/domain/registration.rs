//! Service-provider registration requests and their review state machine.
//!
//! ```text
//!   submit ──► PENDING ──approve──► APPROVED   (terminal)
//!                 │  ▲
//!   request_changes  resubmit
//!                 ▼  │
//!          CHANGES_REQUESTED ──reject──► REJECTED (terminal)
//! ```
//!
//! `reject` and `approve` are accepted from both PENDING and CHANGES_REQUESTED.

use super::{non_blank, DomainError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Esanjeevani,
    Mkisan,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Esanjeevani => "ESANJEEVANI",
            RequestType::Mkisan => "MKISAN",
        }
    }

    /// Stable identifier of the active service a request of this type activates.
    pub fn service_identifier(&self, service_provider_id: Uuid) -> String {
        format!("{}-{}", self.as_str().to_lowercase(), service_provider_id)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ESANJEEVANI" => Ok(RequestType::Esanjeevani),
            "MKISAN" => Ok(RequestType::Mkisan),
            _ => Err(DomainError::Validation(
                "request_type must be 'ESANJEEVANI' or 'MKISAN'".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
    ChangesRequested,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Approved => "APPROVED",
            RegistrationStatus::Rejected => "REJECTED",
            RegistrationStatus::ChangesRequested => "CHANGES_REQUESTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationStatus::Approved | RegistrationStatus::Rejected)
    }

    fn is_reviewable(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Pending | RegistrationStatus::ChangesRequested
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(RegistrationStatus::Pending),
            "APPROVED" => Ok(RegistrationStatus::Approved),
            "REJECTED" => Ok(RegistrationStatus::Rejected),
            "CHANGES_REQUESTED" => Ok(RegistrationStatus::ChangesRequested),
            other => Err(DomainError::Validation(format!(
                "unknown registration status '{}'",
                other
            ))),
        }
    }
}

/// An admin decision on a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Approve { comments: Option<String> },
    Reject { reason: Option<String> },
    RequestChanges { comments: Option<String> },
}

/// Outcome of a successful review: the new status plus the text stored with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub status: RegistrationStatus,
    pub admin_comments: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ReviewAction {
    /// Validates the action on its own, then against the current status.
    pub fn apply(&self, current: RegistrationStatus) -> Result<ReviewOutcome, DomainError> {
        match self {
            ReviewAction::Approve { comments } => {
                if !current.is_reviewable() {
                    return Err(DomainError::Conflict(format!(
                        "Cannot approve request with status {}",
                        current
                    )));
                }
                Ok(ReviewOutcome {
                    status: RegistrationStatus::Approved,
                    admin_comments: non_blank(comments.as_deref()),
                    rejection_reason: None,
                })
            }
            ReviewAction::Reject { reason } => {
                let reason = non_blank(reason.as_deref()).ok_or_else(|| {
                    DomainError::Validation("Rejection reason is required".to_string())
                })?;
                if !current.is_reviewable() {
                    return Err(DomainError::Conflict(format!(
                        "Cannot reject request with status {}",
                        current
                    )));
                }
                Ok(ReviewOutcome {
                    status: RegistrationStatus::Rejected,
                    admin_comments: None,
                    rejection_reason: Some(reason),
                })
            }
            ReviewAction::RequestChanges { comments } => {
                let comments = non_blank(comments.as_deref()).ok_or_else(|| {
                    DomainError::Validation(
                        "Admin comments are required when requesting changes".to_string(),
                    )
                })?;
                if !current.is_reviewable() {
                    return Err(DomainError::Conflict(format!(
                        "Cannot request changes for request with status {}",
                        current
                    )));
                }
                Ok(ReviewOutcome {
                    status: RegistrationStatus::ChangesRequested,
                    admin_comments: Some(comments),
                    rejection_reason: None,
                })
            }
        }
    }
}

/// The applicant sends a request back for review after changes were requested.
pub fn resubmit(current: RegistrationStatus) -> Result<RegistrationStatus, DomainError> {
    match current {
        RegistrationStatus::ChangesRequested => Ok(RegistrationStatus::Pending),
        other => Err(DomainError::Conflict(format!(
            "Only requests with status CHANGES_REQUESTED can be resubmitted (current: {})",
            other
        ))),
    }
}

pub const MKISAN_CATEGORIES: &[&str] = &["BUYER"];

/// Type-specific application fields supplied by the citizen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDetails {
    pub organization_name: Option<String>,
    pub registration_number: Option<String>,
    pub provider_type: Option<String>,
    pub specialization: Option<String>,
    pub years_of_experience: Option<i32>,
    pub provider_category: Option<String>,
    pub business_license: Option<String>,
    pub gst_number: Option<String>,
    pub years_in_business: Option<i32>,
}

impl ApplicationDetails {
    /// Normalizes blank strings to `None` and checks the fields the request type needs.
    pub fn validated(mut self, request_type: RequestType) -> Result<Self, DomainError> {
        self.organization_name = non_blank(self.organization_name.as_deref());
        self.registration_number = non_blank(self.registration_number.as_deref());
        self.provider_type = non_blank(self.provider_type.as_deref()).map(|s| s.to_uppercase());
        self.specialization = non_blank(self.specialization.as_deref());
        self.provider_category =
            non_blank(self.provider_category.as_deref()).map(|s| s.to_uppercase());
        self.business_license = non_blank(self.business_license.as_deref());
        self.gst_number = non_blank(self.gst_number.as_deref());

        for (field, value) in [
            ("years_of_experience", self.years_of_experience),
            ("years_in_business", self.years_in_business),
        ] {
            if matches!(value, Some(v) if v < 0) {
                return Err(DomainError::Validation(format!("{} cannot be negative", field)));
            }
        }

        match request_type {
            RequestType::Esanjeevani => {
                if self.provider_type.is_none() || self.specialization.is_none() {
                    return Err(DomainError::Validation(
                        "provider_type and specialization are required for ESANJEEVANI".to_string(),
                    ));
                }
            }
            RequestType::Mkisan => match self.provider_category.as_deref() {
                Some(c) if MKISAN_CATEGORIES.contains(&c) => {}
                _ => {
                    return Err(DomainError::Validation(format!(
                        "provider_category must be one of {:?} for MKISAN",
                        MKISAN_CATEGORIES
                    )))
                }
            },
        }
        Ok(self)
    }
}
