//! Service onboarding: an approved provider declares a service (name, endpoint, category and
//! a stable identifier) and an admin reviews it. Review follows the same transitions as
//! provider registration, see [`super::registration::ReviewAction`].

use super::{non_blank, DomainError};

/// The service a provider asks to have listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDeclaration {
    pub name: String,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub category: String,
    pub service_identifier: String,
}

impl ServiceDeclaration {
    pub fn validated(self) -> Result<Self, DomainError> {
        let name = non_blank(Some(&self.name))
            .ok_or_else(|| DomainError::Validation("name is required".to_string()))?;
        let category = non_blank(Some(&self.category))
            .map(|c| c.to_uppercase())
            .ok_or_else(|| DomainError::Validation("category is required".to_string()))?;

        let service_identifier = self.service_identifier.trim().to_lowercase();
        let identifier_ok = (3..=64).contains(&service_identifier.len())
            && service_identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !identifier_ok {
            return Err(DomainError::Validation(
                "service_identifier must be 3-64 letters, digits, dashes or underscores".to_string(),
            ));
        }

        let base_url = non_blank(self.base_url.as_deref());
        if let Some(url) = &base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DomainError::Validation(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(Self {
            name,
            description: non_blank(self.description.as_deref()),
            base_url,
            category,
            service_identifier,
        })
    }
}
