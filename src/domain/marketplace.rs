//! mKisan listing and purchase rules.

use super::{non_blank, DomainError};

pub const PURCHASE_CONFIRMED: &str = "CONFIRMED";

/// Validated fields of a product listing (create and update share the same shape).
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub product_name: String,
    pub product_type: String,
    pub category: String,
    pub quantity: String,
    pub price_per_unit: f64,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ProductDraft {
    pub fn validated(self) -> Result<Self, DomainError> {
        let required = |field: &str, value: &str| {
            non_blank(Some(value))
                .ok_or_else(|| DomainError::Validation(format!("{} is required", field)))
        };
        let product_name = required("product_name", &self.product_name)?;
        let product_type = required("product_type", &self.product_type)?;
        let category = required("category", &self.category)?;
        let quantity = required("quantity", &self.quantity)?;
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(DomainError::Validation(
                "price_per_unit must be a non-negative number".to_string(),
            ));
        }
        Ok(Self {
            product_name,
            product_type,
            category,
            quantity,
            price_per_unit: self.price_per_unit,
            location: non_blank(self.location.as_deref()),
            description: non_blank(self.description.as_deref()),
        })
    }
}

/// Farmer IDs are stored upper-cased; 3-32 letters, digits or dashes.
pub fn normalize_kisan_id(raw: &str) -> Result<String, DomainError> {
    let id = raw.trim().to_uppercase();
    let valid = (3..=32).contains(&id.len())
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(DomainError::Validation(
            "kisan_id must be 3-32 letters, digits or dashes".to_string(),
        ));
    }
    Ok(id)
}

/// Purchase quantity in listing units; must be positive.
pub fn validate_purchase_quantity(quantity: f64) -> Result<f64, DomainError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(DomainError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    Ok(quantity)
}
