use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{PaymentId, PaymentMode, SchoolId, StudentId};

/// a payment received from a student; immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student_id: StudentId,
    pub school_id: SchoolId,
    pub amount_paid: Money,
    pub date: DateTime<Utc>,
    pub mode: PaymentMode,
    pub receipt_number: String,
    pub description: Option<String>,
}

/// payment request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub student_id: StudentId,
    pub amount: Money,
    pub mode: PaymentMode,
    /// left empty to generate one
    pub receipt_number: Option<String>,
    pub description: Option<String>,
}

impl PaymentRequest {
    pub fn new(student_id: StudentId, amount: Money, mode: PaymentMode) -> Self {
        Self {
            student_id,
            amount,
            mode,
            receipt_number: None,
            description: None,
        }
    }

    pub fn receipt(mut self, receipt_number: impl Into<String>) -> Self {
        self.receipt_number = Some(receipt_number.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(FeeError::InvalidPaymentAmount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

impl Payment {
    /// build a payment from a request at the given instant
    pub fn from_request(
        request: PaymentRequest,
        school_id: SchoolId,
        date: DateTime<Utc>,
        receipt_prefix: &str,
    ) -> Result<Self> {
        request.validate()?;

        let receipt_number = resolve_receipt_number(request.receipt_number, receipt_prefix, date);

        Ok(Self {
            id: Uuid::new_v4(),
            student_id: request.student_id,
            school_id,
            amount_paid: request.amount,
            date,
            mode: request.mode,
            receipt_number,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// keep a non-blank receipt number, otherwise `<prefix><unix millis>`
pub fn resolve_receipt_number(
    receipt_number: Option<String>,
    prefix: &str,
    date: DateTime<Utc>,
) -> String {
    receipt_number
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| format!("{}{}", prefix, date.timestamp_millis()))
}

/// most recent payment by date
pub fn latest_payment<'a, I>(payments: I) -> Option<&'a Payment>
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments.into_iter().max_by_key(|p| p.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_payment_from_request() {
        let student = Uuid::new_v4();
        let school = Uuid::new_v4();
        let request = PaymentRequest::new(student, Money::from_major(2_500), PaymentMode::Upi)
            .receipt(" INV-001 ")
            .description("June instalment");

        let payment = Payment::from_request(request, school, at(9), "R-").unwrap();

        assert_eq!(payment.student_id, student);
        assert_eq!(payment.school_id, school);
        assert_eq!(payment.amount_paid, Money::from_major(2_500));
        assert_eq!(payment.receipt_number, "INV-001");
        assert_eq!(payment.description.as_deref(), Some("June instalment"));
    }

    #[test]
    fn test_receipt_fallback_uses_millis() {
        let date = at(9);
        let request = PaymentRequest::new(Uuid::new_v4(), Money::from_major(100), PaymentMode::Cash)
            .receipt("   ");

        let payment = Payment::from_request(request, Uuid::new_v4(), date, "R-").unwrap();
        assert_eq!(payment.receipt_number, format!("R-{}", date.timestamp_millis()));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [Money::ZERO, Money::from_major(-10)] {
            let request = PaymentRequest::new(Uuid::new_v4(), amount, PaymentMode::Cash);
            let result = Payment::from_request(request, Uuid::new_v4(), at(9), "R-");
            assert!(matches!(result, Err(FeeError::InvalidPaymentAmount { .. })));
        }
    }

    #[test]
    fn test_latest_payment() {
        let school = Uuid::new_v4();
        let student = Uuid::new_v4();
        let payments: Vec<Payment> = [at(8), at(12), at(10)]
            .into_iter()
            .map(|date| {
                let request = PaymentRequest::new(student, Money::from_major(10), PaymentMode::Cash);
                Payment::from_request(request, school, date, "R-").unwrap()
            })
            .collect();

        assert_eq!(latest_payment(&payments).unwrap().date, at(12));
        assert!(latest_payment(&Vec::<Payment>::new()).is_none());
    }
}
