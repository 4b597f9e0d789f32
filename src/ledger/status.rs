use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BalanceTreatment, PaymentStatus};

/// classifies fee figures into a payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusClassifier {
    /// fees within this distance of zero count as nothing owed
    pub tolerance: Decimal,
}

impl StatusClassifier {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    pub fn classify(&self, fees: Money, paid: Money) -> PaymentStatus {
        classify(fees, paid, self.tolerance)
    }

    pub fn treatment(&self, balance: Money) -> BalanceTreatment {
        balance_treatment(balance, self.tolerance)
    }
}

/// status for `fees` against `paid`
///
/// Fees at or under the tolerance mean nothing is owed: any positive payment
/// then counts as paid. Otherwise exact equality is paid.
pub fn classify(fees: Money, paid: Money, tolerance: Decimal) -> PaymentStatus {
    if fees.as_decimal() <= tolerance {
        return if paid.is_positive() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::NoFeesDue
        };
    }

    if paid >= fees {
        PaymentStatus::Paid
    } else if paid.is_positive() {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    }
}

/// how a balance reads: owed, settled, or carried as an advance
pub fn balance_treatment(balance: Money, tolerance: Decimal) -> BalanceTreatment {
    let value = balance.as_decimal();
    if value < -tolerance {
        BalanceTreatment::Advance
    } else if value > tolerance {
        BalanceTreatment::Outstanding
    } else {
        BalanceTreatment::Settled
    }
}
