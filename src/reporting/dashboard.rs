use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::StudentFeeSummary;
use crate::state::BookState;
use crate::types::SchoolId;

/// headline figures for a school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub school_id: SchoolId,
    pub as_of: NaiveDate,
    pub student_count: usize,
    /// sum of cached student totals
    pub total_assigned: Money,
    pub total_collected: Money,
    /// assigned minus collected
    pub total_outstanding: Money,
    pub total_currently_due: Money,
}

impl DashboardStats {
    pub fn build(state: &BookState, summaries: &[StudentFeeSummary], as_of: NaiveDate) -> Self {
        let total_assigned: Money = state.students.values().map(|s| s.total_fees).sum();
        let total_collected: Money = state.payments.iter().map(|p| p.amount_paid).sum();
        let total_currently_due: Money = summaries
            .iter()
            .map(|s| s.totals.total_currently_due_fees)
            .sum();

        Self {
            school_id: state.school_id,
            as_of,
            student_count: state.students.len(),
            total_assigned,
            total_collected,
            total_outstanding: total_assigned - total_collected,
            total_currently_due,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
