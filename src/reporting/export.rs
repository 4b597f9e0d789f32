use serde::{Deserialize, Serialize};

use crate::config::LabelConfig;
use crate::context::ReportContext;
use crate::ledger::StudentFeeSummary;
use crate::types::FeeScope;

/// column headings for exported ledgers
pub fn headers(scope: FeeScope) -> [&'static str; 12] {
    [
        "Student Name",
        "Class",
        "Roll No",
        scope.heading(),
        "Total Paid",
        "Balance",
        "Status",
        "Last Payment Date",
        "Last Payment Amount",
        "Last Payment Mode",
        "Academic Year",
        "Last Receipt #",
    ]
}

/// case-insensitive substring match on name, roll number and class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn matches(&self, summary: &StudentFeeSummary) -> bool {
        if self.is_empty() {
            return true;
        }
        summary.name.to_lowercase().contains(&self.term)
            || summary.roll_no.to_lowercase().contains(&self.term)
            || summary
                .class_name
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&self.term))
    }
}

/// one exported student row; amounts are fixed two-decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerExportRow {
    pub student_name: String,
    pub class_name: String,
    pub roll_no: String,
    pub fees: String,
    pub total_paid: String,
    pub balance: String,
    pub status: String,
    pub last_payment_date: String,
    pub last_payment_amount: String,
    pub last_payment_mode: String,
    pub academic_year: String,
    pub last_receipt_number: String,
}

impl LedgerExportRow {
    pub fn from_summary(summary: &StudentFeeSummary, context: &ReportContext, labels: &LabelConfig) -> Self {
        let missing = || labels.missing_value.clone();
        let last = summary.last_payment.as_ref();

        Self {
            student_name: summary.name.clone(),
            class_name: summary.class_label(&labels.unassigned_class).to_string(),
            roll_no: non_empty(&summary.roll_no).unwrap_or_else(|| labels.missing_roll_no.clone()),
            fees: summary.fees(context.scope).to_string(),
            total_paid: summary.paid().to_string(),
            balance: summary.balance(context.scope).to_string(),
            status: summary
                .status(context.scope, context.tolerance)
                .export_label()
                .to_string(),
            last_payment_date: last
                .map(|p| p.date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(missing),
            last_payment_amount: last.map(|p| p.amount.to_string()).unwrap_or_else(missing),
            last_payment_mode: last.map(|p| p.mode.label().to_string()).unwrap_or_else(missing),
            academic_year: non_empty(&summary.academic_year).unwrap_or_else(missing),
            last_receipt_number: last
                .and_then(|p| non_empty(&p.receipt_number))
                .unwrap_or_else(missing),
        }
    }

    /// cells in header order
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.student_name.clone(),
            self.class_name.clone(),
            self.roll_no.clone(),
            self.fees.clone(),
            self.total_paid.clone(),
            self.balance.clone(),
            self.status.clone(),
            self.last_payment_date.clone(),
            self.last_payment_amount.clone(),
            self.last_payment_mode.clone(),
            self.academic_year.clone(),
            self.last_receipt_number.clone(),
        ]
    }
}

/// the logical content of a ledger export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerExport {
    pub scope: FeeScope,
    pub headers: Vec<String>,
    pub rows: Vec<LedgerExportRow>,
}

impl LedgerExport {
    /// rows for summaries matching `query`, in the order given
    pub fn build(
        summaries: &[StudentFeeSummary],
        context: &ReportContext,
        labels: &LabelConfig,
        query: &SearchQuery,
    ) -> Self {
        Self {
            scope: context.scope,
            headers: headers(context.scope).iter().map(|h| h.to_string()).collect(),
            rows: summaries
                .iter()
                .filter(|s| query.matches(s))
                .map(|s| LedgerExportRow::from_summary(s, context, labels))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// header row followed by one record per student
    pub fn records(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().map(LedgerExportRow::to_record))
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
