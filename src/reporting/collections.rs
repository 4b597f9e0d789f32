use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LabelConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::schedule::{CollectionPeriod, DateRange};
use crate::state::BookState;
use crate::types::{ClassId, PaymentId, PaymentMode, StudentId};

/// one payment in a collections report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub payment_id: PaymentId,
    pub student_id: StudentId,
    pub student_name: String,
    pub roll_no: String,
    pub class_name: String,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub mode: PaymentMode,
    pub receipt_number: String,
    pub description: Option<String>,
}

/// payments collected within a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionsReport {
    pub period: CollectionPeriod,
    pub range: DateRange,
    pub class_id: Option<ClassId>,
    /// newest first
    pub entries: Vec<CollectionEntry>,
    pub total_collected: Money,
    pub by_mode: BTreeMap<PaymentMode, Money>,
}

impl CollectionsReport {
    /// collect payments whose UTC calendar day falls in the period
    pub fn build(
        state: &BookState,
        period: CollectionPeriod,
        class_id: Option<ClassId>,
        labels: &LabelConfig,
    ) -> Result<Self> {
        let range = period.range()?;

        let mut entries: Vec<CollectionEntry> = state
            .payments
            .iter()
            .filter(|p| range.contains(p.date.date_naive()))
            .filter_map(|p| {
                let student = state.students.get(&p.student_id);
                if let Some(wanted) = class_id {
                    if student.and_then(|s| s.class_id) != Some(wanted) {
                        return None;
                    }
                }
                Some(CollectionEntry {
                    payment_id: p.id,
                    student_id: p.student_id,
                    student_name: student
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|| labels.missing_value.clone()),
                    roll_no: student
                        .map(|s| s.roll_no.clone())
                        .unwrap_or_else(|| labels.missing_value.clone()),
                    class_name: state
                        .class_name(student.and_then(|s| s.class_id))
                        .unwrap_or(&labels.unassigned_class)
                        .to_string(),
                    date: p.date,
                    amount: p.amount_paid,
                    mode: p.mode,
                    receipt_number: p.receipt_number.clone(),
                    description: p.description.clone(),
                })
            })
            .collect();

        entries.sort_by(|a, b| b.date.cmp(&a.date));

        let mut by_mode: BTreeMap<PaymentMode, Money> = BTreeMap::new();
        let mut total_collected = Money::ZERO;
        for entry in &entries {
            total_collected += entry.amount;
            *by_mode.entry(entry.mode).or_default() += entry.amount;
        }

        tracing::debug!(
            start = %range.start,
            end = %range.end,
            payments = entries.len(),
            total = %total_collected,
            "collections report built"
        );

        Ok(Self {
            period,
            range,
            class_id,
            entries,
            total_collected,
            by_mode,
        })
    }

    pub fn payment_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_for(&self, mode: PaymentMode) -> Money {
        self.by_mode.get(&mode).copied().unwrap_or(Money::ZERO)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
