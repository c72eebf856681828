//! Domain rules: roles, identity validation and the workflow state machines.
//!
//! Nothing in here touches the database; the storage and app layers call into these
//! functions to decide whether a transition is allowed.

pub mod appointment;
pub mod identity;
pub mod marketplace;
pub mod onboarding;
pub mod registration;

/// Rule violations raised by the state machines and input validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

/// Trims an optional free-text field and drops it when empty.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
