use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::records::FeeAssignment;
use crate::types::{ClassId, FeeTypeId, SchoolId, StudentId};

/// a class (grade/section) within a school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
}

impl SchoolClass {
    pub fn new(school_id: SchoolId, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FeeError::MissingField {
                field: "class.name".to_string(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            school_id,
            name: name.to_string(),
        })
    }
}

/// a student record with its cached fee total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub name: String,
    pub roll_no: String,
    pub class_id: Option<ClassId>,
    pub academic_year: String,
    /// sum of net payable over current assignments, as of the last recompute
    pub total_fees: Money,
}

impl Student {
    pub fn new(school_id: SchoolId, registration: &StudentRegistration) -> Result<Self> {
        registration.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            school_id,
            name: registration.name.trim().to_string(),
            roll_no: registration.roll_no.trim().to_string(),
            class_id: Some(registration.class_id),
            academic_year: registration.academic_year.trim().to_string(),
            total_fees: Money::ZERO,
        })
    }

    /// sum of net payable over this student's assignments
    pub fn computed_total_fees<'a, I>(&self, assignments: I) -> Money
    where
        I: IntoIterator<Item = &'a FeeAssignment>,
    {
        assignments
            .into_iter()
            .filter(|a| a.student_id == self.id)
            .map(FeeAssignment::net_payable)
            .sum()
    }

    /// recompute and store the cached total; returns the new value
    pub fn recompute_total_fees<'a, I>(&mut self, assignments: I) -> Money
    where
        I: IntoIterator<Item = &'a FeeAssignment>,
    {
        self.total_fees = self.computed_total_fees(assignments);
        self.total_fees
    }

    /// whether two students would collide on roll number
    pub fn shares_roll_slot(&self, class_id: ClassId, roll_no: &str, academic_year: &str) -> bool {
        self.class_id == Some(class_id)
            && self.roll_no == roll_no.trim()
            && self.academic_year == academic_year.trim()
    }
}

/// fee picked during registration, with an optional discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSelection {
    pub fee_type_id: FeeTypeId,
    pub discount: Money,
    pub discount_description: Option<String>,
}

impl FeeSelection {
    pub fn full(fee_type_id: FeeTypeId) -> Self {
        Self {
            fee_type_id,
            discount: Money::ZERO,
            discount_description: None,
        }
    }

    pub fn discounted(fee_type_id: FeeTypeId, discount: Money, description: impl Into<String>) -> Self {
        Self {
            fee_type_id,
            discount,
            discount_description: Some(description.into()),
        }
    }
}

/// details captured when registering or editing a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub name: String,
    pub roll_no: String,
    pub class_id: ClassId,
    pub academic_year: String,
    pub fees: Vec<FeeSelection>,
}

impl StudentRegistration {
    pub fn new(
        name: impl Into<String>,
        roll_no: impl Into<String>,
        class_id: ClassId,
        academic_year: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            roll_no: roll_no.into(),
            class_id,
            academic_year: academic_year.into(),
            fees: Vec::new(),
        }
    }

    pub fn with_fee(mut self, selection: FeeSelection) -> Self {
        self.fees.push(selection);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("student.name", &self.name),
            ("student.roll_no", &self.roll_no),
            ("student.academic_year", &self.academic_year),
        ] {
            if value.trim().is_empty() {
                return Err(FeeError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
