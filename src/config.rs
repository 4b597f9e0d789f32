use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{FeeError, Result};
use crate::types::FeeScope;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    pub status_config: StatusConfig,
    pub label_config: LabelConfig,
    pub receipt_config: ReceiptConfig,
}

/// how figures are classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// amounts within this distance of zero count as zero
    pub balance_tolerance: Decimal,
    /// fee total used when the caller does not pick one
    pub default_scope: FeeScope,
}

/// placeholder text for missing data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub unassigned_class: String,
    /// roll number column for students without one
    pub missing_roll_no: String,
    pub unknown_fee_type: String,
    pub missing_value: String,
}

/// receipt numbering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// prefix of generated receipt numbers, followed by unix millis
    pub fallback_prefix: String,
}

// 0.009 rather than 0.01, so a single paisa still counts as owed
impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: dec!(0.009),
            default_scope: FeeScope::Assigned,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            unassigned_class: "N/A".to_string(),
            missing_roll_no: "N/A".to_string(),
            unknown_fee_type: "Unknown Fee Type".to_string(),
            missing_value: "-".to_string(),
        }
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            fallback_prefix: "R-".to_string(),
        }
    }
}

impl LedgerConfig {
    /// standard configuration used by school dashboards
    pub fn standard() -> Self {
        Self::default()
    }

    /// configuration measuring balances against currently due fees
    pub fn currently_due() -> Self {
        Self::default().with_scope(FeeScope::CurrentlyDue)
    }

    /// exact comparisons with no tolerance
    pub fn strict() -> Self {
        Self::default().with_tolerance(Decimal::ZERO)
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.status_config.balance_tolerance = tolerance;
        self
    }

    pub fn with_scope(mut self, scope: FeeScope) -> Self {
        self.status_config.default_scope = scope;
        self
    }

    pub fn with_unassigned_class_label(mut self, label: impl Into<String>) -> Self {
        self.label_config.unassigned_class = label.into();
        self
    }

    pub fn with_receipt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.receipt_config.fallback_prefix = prefix.into();
        self
    }

    pub fn tolerance(&self) -> Decimal {
        self.status_config.balance_tolerance
    }

    /// check values are usable
    pub fn validate(&self) -> Result<()> {
        let tolerance = self.status_config.balance_tolerance;
        if tolerance.is_sign_negative() || tolerance >= Decimal::ONE {
            return Err(FeeError::InvalidConfiguration {
                message: format!("balance tolerance must be in [0, 1), got {}", tolerance),
            });
        }

        if self.label_config.unassigned_class.trim().is_empty() {
            return Err(FeeError::InvalidConfiguration {
                message: "unassigned class label cannot be empty".to_string(),
            });
        }

        if self.label_config.unknown_fee_type.trim().is_empty() {
            return Err(FeeError::InvalidConfiguration {
                message: "unknown fee type label cannot be empty".to_string(),
            });
        }

        if self.receipt_config.fallback_prefix.trim().is_empty() {
            return Err(FeeError::InvalidConfiguration {
                message: "receipt prefix cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// load from json, missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
