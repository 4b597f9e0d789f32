use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::schedule::CalendarDate;
use crate::types::{FeeTypeId, SchoolId};

/// a named charge a school levies, with its scheduling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTypeDefinition {
    pub id: FeeTypeId,
    pub school_id: SchoolId,
    pub name: String,
    pub description: Option<String>,
    /// amount copied into new assignments
    pub base_amount: Money,
    /// fee is invisible before this date
    pub scheduled_date: Option<CalendarDate>,
    /// inclusive lower bound of the applicability window
    pub applicable_from: Option<CalendarDate>,
    /// inclusive upper bound of the applicability window
    pub applicable_until: Option<CalendarDate>,
}

impl FeeTypeDefinition {
    /// builder for creating fee types
    pub fn builder(school_id: SchoolId) -> FeeTypeBuilder {
        FeeTypeBuilder::new(school_id)
    }

    /// fee type with no schedule or window
    pub fn new(school_id: SchoolId, name: impl Into<String>, base_amount: Money) -> Result<Self> {
        FeeTypeBuilder::new(school_id)
            .name(name)
            .base_amount(base_amount)
            .build()
    }

    /// true when none of the date fields are set
    pub fn is_unscheduled(&self) -> bool {
        self.scheduled_date.is_none()
            && self.applicable_from.is_none()
            && self.applicable_until.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FeeError::MissingField {
                field: "fee_type.name".to_string(),
            });
        }

        if self.base_amount.is_negative() {
            return Err(FeeError::InvalidAmount {
                field: "fee_type.base_amount".to_string(),
                amount: self.base_amount,
            });
        }

        Ok(())
    }
}

/// builder for fee types
pub struct FeeTypeBuilder {
    id: Option<FeeTypeId>,
    school_id: SchoolId,
    name: String,
    description: Option<String>,
    base_amount: Money,
    scheduled_date: Option<CalendarDate>,
    applicable_from: Option<CalendarDate>,
    applicable_until: Option<CalendarDate>,
}

impl FeeTypeBuilder {
    pub fn new(school_id: SchoolId) -> Self {
        Self {
            id: None,
            school_id,
            name: String::new(),
            description: None,
            base_amount: Money::ZERO,
            scheduled_date: None,
            applicable_from: None,
            applicable_until: None,
        }
    }

    /// keep an existing identifier (edits and ingress)
    pub fn id(mut self, id: FeeTypeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn base_amount(mut self, amount: Money) -> Self {
        self.base_amount = amount;
        self
    }

    pub fn scheduled_on(mut self, date: impl Into<CalendarDate>) -> Self {
        self.scheduled_date = Some(date.into());
        self
    }

    pub fn applicable_from(mut self, date: impl Into<CalendarDate>) -> Self {
        self.applicable_from = Some(date.into());
        self
    }

    pub fn applicable_until(mut self, date: impl Into<CalendarDate>) -> Self {
        self.applicable_until = Some(date.into());
        self
    }

    /// inclusive window in one call
    pub fn window(self, from: impl Into<CalendarDate>, until: impl Into<CalendarDate>) -> Self {
        self.applicable_from(from).applicable_until(until)
    }

    pub fn build(self) -> Result<FeeTypeDefinition> {
        let definition = FeeTypeDefinition {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            school_id: self.school_id,
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            base_amount: self.base_amount,
            scheduled_date: self.scheduled_date,
            applicable_from: self.applicable_from,
            applicable_until: self.applicable_until,
        };
        definition.validate()?;
        Ok(definition)
    }
}
