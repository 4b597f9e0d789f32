use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::schedule::{utc_today, ApplicabilityEvaluator};
use crate::types::{FeeScope, SchoolId};

/// explicit scope for every report: which school, which day, which total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    pub school_id: SchoolId,
    /// UTC calendar day used for currently due checks
    pub today: NaiveDate,
    pub scope: FeeScope,
    pub tolerance: Decimal,
}

impl ReportContext {
    pub fn new(school_id: SchoolId, today: NaiveDate) -> Self {
        let config = LedgerConfig::default();
        Self::from_config(school_id, today, &config)
    }

    /// context for the provider's current day with default settings
    pub fn at(school_id: SchoolId, time: &SafeTimeProvider) -> Self {
        Self::new(school_id, utc_today(time))
    }

    pub fn from_config(school_id: SchoolId, today: NaiveDate, config: &LedgerConfig) -> Self {
        Self {
            school_id,
            today,
            scope: config.status_config.default_scope,
            tolerance: config.tolerance(),
        }
    }

    pub fn with_scope(mut self, scope: FeeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn evaluator(&self) -> ApplicabilityEvaluator {
        ApplicabilityEvaluator::new(self.today)
    }
}
