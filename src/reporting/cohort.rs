use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::ReportContext;
use crate::decimal::Money;
use crate::ledger::{balance_treatment, StudentFeeSummary};
use crate::types::{BalanceTreatment, ClassId, FeeScope, PaymentStatus, SchoolId, StudentId};

/// number of students per payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub paid: usize,
    pub partially_paid: usize,
    pub unpaid: usize,
    pub no_fees_due: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: PaymentStatus) {
        match status {
            PaymentStatus::Paid => self.paid += 1,
            PaymentStatus::PartiallyPaid => self.partially_paid += 1,
            PaymentStatus::Unpaid => self.unpaid += 1,
            PaymentStatus::NoFeesDue => self.no_fees_due += 1,
        }
    }

    pub fn merge(&mut self, other: &StatusCounts) {
        self.paid += other.paid;
        self.partially_paid += other.partially_paid;
        self.unpaid += other.unpaid;
        self.no_fees_due += other.no_fees_due;
    }

    pub fn total(&self) -> usize {
        self.paid + self.partially_paid + self.unpaid + self.no_fees_due
    }
}

/// one student's row in a class view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub student_id: StudentId,
    pub name: String,
    pub roll_no: String,
    pub class_id: Option<ClassId>,
    pub class_name: String,
    pub fees: Money,
    pub paid: Money,
    pub balance: Money,
    pub treatment: BalanceTreatment,
    pub status: PaymentStatus,
}

impl LedgerLine {
    pub fn from_summary(summary: &StudentFeeSummary, context: &ReportContext, unassigned: &str) -> Self {
        Self {
            student_id: summary.student_id,
            name: summary.name.clone(),
            roll_no: summary.roll_no.clone(),
            // an id whose class no longer resolves counts as unassigned
            class_id: summary.class_name.as_ref().and(summary.class_id),
            class_name: summary.class_label(unassigned).to_string(),
            fees: summary.fees(context.scope),
            paid: summary.paid(),
            balance: summary.balance(context.scope),
            treatment: summary.balance_treatment(context.scope, context.tolerance),
            status: summary.status(context.scope, context.tolerance),
        }
    }
}

/// totals and student rows for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRollup {
    pub class_id: Option<ClassId>,
    pub class_name: String,
    pub total_fees: Money,
    pub total_paid: Money,
    pub total_balance: Money,
    pub treatment: BalanceTreatment,
    pub status_counts: StatusCounts,
    /// sorted by student name
    pub students: Vec<LedgerLine>,
}

impl ClassRollup {
    /// roll up lines that all belong to one class
    pub fn from_lines(
        class_id: Option<ClassId>,
        class_name: String,
        mut students: Vec<LedgerLine>,
        context: &ReportContext,
    ) -> Self {
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.roll_no.cmp(&b.roll_no)));

        let mut status_counts = StatusCounts::default();
        let mut total_fees = Money::ZERO;
        let mut total_paid = Money::ZERO;
        for line in &students {
            total_fees += line.fees;
            total_paid += line.paid;
            status_counts.record(line.status);
        }
        let total_balance = total_fees - total_paid;

        Self {
            class_id,
            class_name,
            total_fees,
            total_paid,
            total_balance,
            treatment: balance_treatment(total_balance, context.tolerance),
            status_counts,
            students,
        }
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// school-wide view with one rollup per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRollup {
    pub school_id: SchoolId,
    pub as_of: NaiveDate,
    pub scope: FeeScope,
    pub student_count: usize,
    pub total_fees: Money,
    pub total_paid: Money,
    pub total_balance: Money,
    pub treatment: BalanceTreatment,
    pub status_counts: StatusCounts,
    /// sorted by class name
    pub classes: Vec<ClassRollup>,
}

impl SchoolRollup {
    /// group summaries by class and roll them up
    ///
    /// Classes are keyed by label and id, so a real class that happens to
    /// share the unassigned label stays separate from unassigned students.
    pub fn build(summaries: &[StudentFeeSummary], context: &ReportContext, unassigned: &str) -> Self {
        let mut grouped: BTreeMap<(String, Option<ClassId>), Vec<LedgerLine>> = BTreeMap::new();
        for summary in summaries {
            let line = LedgerLine::from_summary(summary, context, unassigned);
            grouped
                .entry((line.class_name.clone(), line.class_id))
                .or_default()
                .push(line);
        }

        let classes: Vec<ClassRollup> = grouped
            .into_iter()
            .map(|((name, class_id), lines)| ClassRollup::from_lines(class_id, name, lines, context))
            .collect();

        let mut status_counts = StatusCounts::default();
        let mut total_fees = Money::ZERO;
        let mut total_paid = Money::ZERO;
        for class in &classes {
            total_fees += class.total_fees;
            total_paid += class.total_paid;
            status_counts.merge(&class.status_counts);
        }
        let total_balance = total_fees - total_paid;

        Self {
            school_id: context.school_id,
            as_of: context.today,
            scope: context.scope,
            student_count: summaries.len(),
            total_fees,
            total_paid,
            total_balance,
            treatment: balance_treatment(total_balance, context.tolerance),
            status_counts,
            classes,
        }
    }

    /// class view behind a class row, by name; the first match wins
    pub fn drill_down(&self, class_name: &str) -> Option<&ClassRollup> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    pub fn class(&self, class_id: ClassId) -> Option<&ClassRollup> {
        self.classes.iter().find(|c| c.class_id == Some(class_id))
    }

    /// students without a resolvable class
    pub fn unassigned(&self) -> Option<&ClassRollup> {
        self.classes.iter().find(|c| c.class_id.is_none())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
