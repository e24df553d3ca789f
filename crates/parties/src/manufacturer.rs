use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Entity, ManufacturerId, UserId};

/// A manufacturer: owns products and the pricing policy over them.
///
/// `minimum_markup_percent` is the floor every reseller listing of this
/// manufacturer's products must clear. Changing it never touches existing
/// listings; the new floor applies on the next create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    id: ManufacturerId,
    user_id: UserId,
    company_name: String,
    minimum_markup_percent: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Manufacturer {
    pub fn new(
        user_id: UserId,
        company_name: impl Into<String>,
        minimum_markup_percent: Decimal,
    ) -> DomainResult<Self> {
        let company_name = company_name.into();
        if company_name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        validate_markup(minimum_markup_percent)?;

        Ok(Self {
            id: ManufacturerId::new(),
            user_id,
            company_name,
            minimum_markup_percent,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn minimum_markup_percent(&self) -> Decimal {
        self.minimum_markup_percent
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Update the markup floor. Prospective only: existing listings keep
    /// their prices until next revalidation.
    pub fn set_minimum_markup_percent(&mut self, percent: Decimal) -> DomainResult<()> {
        validate_markup(percent)?;
        self.minimum_markup_percent = percent;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }
}

impl Entity for Manufacturer {
    type Id = ManufacturerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_markup(percent: Decimal) -> DomainResult<()> {
    if percent < Decimal::ZERO {
        return Err(DomainError::validation("minimum markup percent cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn markup_floor_must_be_non_negative() {
        assert!(Manufacturer::new(UserId::new(), "Forge Works", dec!(-1)).is_err());

        let mut m = Manufacturer::new(UserId::new(), "Forge Works", dec!(20)).unwrap();
        assert!(m.set_minimum_markup_percent(dec!(-0.5)).is_err());
        m.set_minimum_markup_percent(dec!(0)).unwrap();
        assert_eq!(m.minimum_markup_percent(), Decimal::ZERO);
    }
}
