use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::status::{balance_treatment, classify};
use crate::records::{latest_payment, AssignedFee, Payment, Student};
use crate::schedule::{Applicability, ApplicabilityEvaluator, CalendarDate};
use crate::types::{
    AssignmentId, BalanceTreatment, ClassId, FeeScope, FeeTypeId, PaymentId, PaymentMode,
    PaymentStatus, StudentId,
};

/// fee and payment totals for one student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeTotals {
    /// net payable over every assignment
    pub total_assigned_fees: Money,
    /// net payable over assignments whose fee type is currently due
    pub total_currently_due_fees: Money,
    pub total_paid: Money,
}

impl FeeTotals {
    pub fn fees_for(&self, scope: FeeScope) -> Money {
        match scope {
            FeeScope::Assigned => self.total_assigned_fees,
            FeeScope::CurrentlyDue => self.total_currently_due_fees,
        }
    }

    /// negative when the student has paid ahead
    pub fn balance(&self, scope: FeeScope) -> Money {
        self.fees_for(scope) - self.total_paid
    }

    pub fn status(&self, scope: FeeScope, tolerance: Decimal) -> PaymentStatus {
        classify(self.fees_for(scope), self.total_paid, tolerance)
    }
}

/// one assigned fee with its figures and due verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLine {
    pub assignment_id: AssignmentId,
    pub fee_type_id: FeeTypeId,
    pub name: String,
    pub assigned_amount: Money,
    pub discount: Money,
    pub discount_description: Option<String>,
    pub net_payable: Money,
    pub scheduled_date: Option<CalendarDate>,
    pub applicable_from: Option<CalendarDate>,
    pub applicable_until: Option<CalendarDate>,
    pub applicability: Applicability,
}

impl FeeLine {
    pub fn is_due(&self) -> bool {
        self.applicability.is_due()
    }
}

/// the parts of a payment shown next to a student's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDigest {
    pub payment_id: PaymentId,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub mode: PaymentMode,
    pub receipt_number: String,
}

impl From<&Payment> for PaymentDigest {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            date: payment.date,
            amount: payment.amount_paid,
            mode: payment.mode,
            receipt_number: payment.receipt_number.clone(),
        }
    }
}

/// everything reports need about one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeeSummary {
    pub student_id: StudentId,
    pub name: String,
    pub roll_no: String,
    pub class_id: Option<ClassId>,
    /// `None` when the student has no class or it was removed
    pub class_name: Option<String>,
    pub academic_year: String,
    pub totals: FeeTotals,
    pub lines: Vec<FeeLine>,
    pub payment_count: usize,
    pub last_payment: Option<PaymentDigest>,
}

impl StudentFeeSummary {
    pub fn fees(&self, scope: FeeScope) -> Money {
        self.totals.fees_for(scope)
    }

    pub fn paid(&self) -> Money {
        self.totals.total_paid
    }

    pub fn balance(&self, scope: FeeScope) -> Money {
        self.totals.balance(scope)
    }

    pub fn status(&self, scope: FeeScope, tolerance: Decimal) -> PaymentStatus {
        self.totals.status(scope, tolerance)
    }

    pub fn balance_treatment(&self, scope: FeeScope, tolerance: Decimal) -> BalanceTreatment {
        balance_treatment(self.balance(scope), tolerance)
    }

    /// class name, or the placeholder for unassigned students
    pub fn class_label<'a>(&'a self, unassigned: &'a str) -> &'a str {
        self.class_name.as_deref().unwrap_or(unassigned)
    }
}

/// sums a student's assignments and payments on a reference day
#[derive(Debug, Clone)]
pub struct StudentFeeAggregator {
    evaluator: ApplicabilityEvaluator,
    unknown_fee_type: String,
}

impl StudentFeeAggregator {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            evaluator: ApplicabilityEvaluator::new(today),
            unknown_fee_type: "Unknown Fee Type".to_string(),
        }
    }

    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_fee_type = label.into();
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.evaluator.today
    }

    /// totals over the given assignments and payments
    ///
    /// An assignment with no loaded fee type counts toward the assigned total
    /// but never toward the currently due total.
    pub fn totals<'a, I>(&self, fees: &[AssignedFee<'_>], payments: I) -> FeeTotals
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let mut totals = FeeTotals::default();
        for fee in fees {
            let net = fee.net_payable();
            totals.total_assigned_fees += net;
            if self.evaluator.is_currently_due(fee.fee_type) {
                totals.total_currently_due_fees += net;
            }
        }
        totals.total_paid = payments.into_iter().map(|p| p.amount_paid).sum();
        totals
    }

    /// per-fee breakdown, in the order given
    pub fn lines(&self, fees: &[AssignedFee<'_>]) -> Vec<FeeLine> {
        fees.iter()
            .map(|fee| {
                let assignment = fee.assignment;
                let definition = fee.fee_type;
                FeeLine {
                    assignment_id: assignment.id,
                    fee_type_id: assignment.fee_type_id,
                    name: definition
                        .map(|d| d.name.clone())
                        .unwrap_or_else(|| self.unknown_fee_type.clone()),
                    assigned_amount: assignment.assigned_amount,
                    discount: assignment.discount,
                    discount_description: assignment.discount_description.clone(),
                    net_payable: assignment.net_payable(),
                    scheduled_date: definition.and_then(|d| d.scheduled_date.clone()),
                    applicable_from: definition.and_then(|d| d.applicable_from.clone()),
                    applicable_until: definition.and_then(|d| d.applicable_until.clone()),
                    applicability: self.evaluator.evaluate(definition),
                }
            })
            .collect()
    }

    /// full summary for one student
    pub fn summarize(
        &self,
        student: &Student,
        class_name: Option<&str>,
        fees: &[AssignedFee<'_>],
        payments: &[&Payment],
    ) -> StudentFeeSummary {
        StudentFeeSummary {
            student_id: student.id,
            name: student.name.clone(),
            roll_no: student.roll_no.clone(),
            class_id: student.class_id,
            class_name: class_name.map(str::to_string),
            academic_year: student.academic_year.clone(),
            totals: self.totals(fees, payments.iter().copied()),
            lines: self.lines(fees),
            payment_count: payments.len(),
            last_payment: latest_payment(payments.iter().copied()).map(PaymentDigest::from),
        }
    }
}

/// totals for one student's assignments and payments on `today`
pub fn aggregate<'a, I>(fees: &[AssignedFee<'_>], payments: I, today: NaiveDate) -> FeeTotals
where
    I: IntoIterator<Item = &'a Payment>,
{
    StudentFeeAggregator::new(today).totals(fees, payments)
}
