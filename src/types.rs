use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::FeeError;

/// unique identifier for a school (the tenant)
pub type SchoolId = Uuid;

/// unique identifier for a class within a school
pub type ClassId = Uuid;

/// unique identifier for a student
pub type StudentId = Uuid;

/// unique identifier for a fee type
pub type FeeTypeId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// fee assignments keep the store's integer key
pub type AssignmentId = i64;

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
    #[serde(rename = "dd")]
    DemandDraft,
    OnlinePortal,
    Other,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 7] = [
        PaymentMode::Cash,
        PaymentMode::Upi,
        PaymentMode::BankTransfer,
        PaymentMode::Cheque,
        PaymentMode::DemandDraft,
        PaymentMode::OnlinePortal,
        PaymentMode::Other,
    ];

    /// code stored in the payments table
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::BankTransfer => "bank_transfer",
            PaymentMode::Cheque => "cheque",
            PaymentMode::DemandDraft => "dd",
            PaymentMode::OnlinePortal => "online_portal",
            PaymentMode::Other => "other",
        }
    }

    /// human readable label
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Upi => "UPI",
            PaymentMode::BankTransfer => "Bank Transfer",
            PaymentMode::Cheque => "Cheque",
            PaymentMode::DemandDraft => "Demand Draft",
            PaymentMode::OnlinePortal => "Online Portal",
            PaymentMode::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMode {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_");
        PaymentMode::ALL
            .into_iter()
            .find(|mode| mode.code() == normalized)
            .or(match normalized.as_str() {
                "demand_draft" => Some(PaymentMode::DemandDraft),
                _ => None,
            })
            .ok_or(FeeError::UnknownPaymentMode {
                mode: s.to_string(),
            })
    }
}

/// payment status of a student for a chosen fee scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// nothing to pay and nothing paid
    NoFeesDue,
    /// paid in full (or paid with nothing due)
    Paid,
    /// something paid, less than the fees
    PartiallyPaid,
    /// fees due, nothing paid
    Unpaid,
}

impl PaymentStatus {
    /// short badge text
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::NoFeesDue => "No Dues",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::PartiallyPaid => "Partial",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }

    /// text used in exported ledgers
    pub fn export_label(&self) -> &'static str {
        match self {
            PaymentStatus::NoFeesDue => "No Fees Due",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::PartiallyPaid => "Partially paid",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }
}

/// which fee total a balance is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FeeScope {
    /// every assigned fee, regardless of schedule
    #[default]
    #[serde(rename = "total")]
    Assigned,
    /// only fees whose schedule and window include today
    #[serde(rename = "due")]
    CurrentlyDue,
}

impl FeeScope {
    /// column heading for the fee total in reports
    pub fn heading(&self) -> &'static str {
        match self {
            FeeScope::Assigned => "Total Assigned",
            FeeScope::CurrentlyDue => "Total Due",
        }
    }
}

/// how a balance should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTreatment {
    /// money still owed
    Outstanding,
    /// within tolerance of zero
    Settled,
    /// paid more than the fees, carried as credit
    Advance,
}

impl BalanceTreatment {
    /// suffix shown next to the balance figure
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            BalanceTreatment::Advance => Some("(Adv)"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_codes_round_trip() {
        for mode in PaymentMode::ALL {
            assert_eq!(mode.code().parse::<PaymentMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_payment_mode_lenient_parsing() {
        assert_eq!("Bank Transfer".parse::<PaymentMode>().unwrap(), PaymentMode::BankTransfer);
        assert_eq!("UPI".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert_eq!("demand-draft".parse::<PaymentMode>().unwrap(), PaymentMode::DemandDraft);
        assert!("barter".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_payment_mode_serde_uses_store_codes() {
        let json = serde_json::to_string(&PaymentMode::DemandDraft).unwrap();
        assert_eq!(json, "\"dd\"");
        let mode: PaymentMode = serde_json::from_str("\"online_portal\"").unwrap();
        assert_eq!(mode, PaymentMode::OnlinePortal);
    }

    #[test]
    fn test_fee_scope_serde() {
        assert_eq!(serde_json::to_string(&FeeScope::CurrentlyDue).unwrap(), "\"due\"");
        assert_eq!(FeeScope::default(), FeeScope::Assigned);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(PaymentStatus::PartiallyPaid.label(), "Partial");
        assert_eq!(PaymentStatus::NoFeesDue.export_label(), "No Fees Due");
        assert_eq!(BalanceTreatment::Advance.marker(), Some("(Adv)"));
        assert_eq!(BalanceTreatment::Outstanding.marker(), None);
    }
}
