use super::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub const IDENTITY_MIN_LEN: usize = 12;
pub const IDENTITY_MAX_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Citizen,
    ServiceProvider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "CITIZEN",
            Role::ServiceProvider => "SERVICE_PROVIDER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CITIZEN" => Ok(Role::Citizen),
            "SERVICE_PROVIDER" => Ok(Role::ServiceProvider),
            "ADMIN" => Ok(Role::Admin),
            other => Err(DomainError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Checks a raw national ID before it is hashed: 12-20 ASCII letters or digits.
pub fn validate_identity(raw: &str) -> Result<&str, DomainError> {
    let raw = raw.trim();
    let len_ok = (IDENTITY_MIN_LEN..=IDENTITY_MAX_LEN).contains(&raw.len());
    if !len_ok || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::Validation(format!(
            "Aadhar must be {}-{} alphanumeric characters (e.g., ABC123456789)",
            IDENTITY_MIN_LEN, IDENTITY_MAX_LEN
        )));
    }
    Ok(raw)
}
