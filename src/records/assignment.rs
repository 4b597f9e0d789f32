use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::records::FeeTypeDefinition;
use crate::types::{AssignmentId, FeeTypeId, StudentId};

/// one fee type assigned to one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeAssignment {
    pub id: AssignmentId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    /// copied from the fee type when assigned, never re-synced
    pub assigned_amount: Money,
    pub discount: Money,
    pub discount_description: Option<String>,
}

impl FeeAssignment {
    /// assign at the fee type's current base amount with no discount
    pub fn new(id: AssignmentId, student_id: StudentId, fee_type: &FeeTypeDefinition) -> Self {
        Self {
            id,
            student_id,
            fee_type_id: fee_type.id,
            assigned_amount: fee_type.base_amount,
            discount: Money::ZERO,
            discount_description: None,
        }
    }

    /// apply a discount; negative discounts are rejected
    pub fn with_discount(mut self, discount: Money, description: Option<String>) -> Result<Self> {
        self.set_discount(discount, description)?;
        Ok(self)
    }

    pub fn set_discount(&mut self, discount: Money, description: Option<String>) -> Result<()> {
        if discount.is_negative() {
            return Err(FeeError::InvalidAmount {
                field: "assignment.discount".to_string(),
                amount: discount,
            });
        }
        self.discount = discount;
        self.discount_description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(())
    }

    /// assigned amount minus discount; may go negative
    pub fn net_payable(&self) -> Money {
        self.assigned_amount - self.discount
    }
}

/// an assignment paired with its fee type, if that loaded
#[derive(Debug, Clone, Copy)]
pub struct AssignedFee<'a> {
    pub assignment: &'a FeeAssignment,
    pub fee_type: Option<&'a FeeTypeDefinition>,
}

impl<'a> AssignedFee<'a> {
    pub fn new(assignment: &'a FeeAssignment, fee_type: Option<&'a FeeTypeDefinition>) -> Self {
        Self { assignment, fee_type }
    }

    pub fn net_payable(&self) -> Money {
        self.assignment.net_payable()
    }
}
