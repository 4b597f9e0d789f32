//! Raw store rows and their conversion into typed records.
//!
//! Rows arrive the way the hosted store returns them: numbers as floats,
//! dates as strings, nullable columns. Extra columns are ignored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::records::{resolve_receipt_number, FeeAssignment, FeeTypeDefinition, Payment, SchoolClass, Student};
use crate::schedule::{parse_timestamp, CalendarDate};
use crate::state::BookState;
use crate::types::{AssignmentId, ClassId, FeeTypeId, PaymentMode, SchoolId, StudentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTypeClassRow {
    pub school_id: SchoolId,
    pub fee_type_id: FeeTypeId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTypeRow {
    pub id: FeeTypeId,
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_amount: Option<f64>,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub applicable_from: Option<String>,
    #[serde(default)]
    pub applicable_until: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub roll_no: Option<String>,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub total_fees: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeeTypeRow {
    pub id: AssignmentId,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    #[serde(default)]
    pub assigned_amount: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub discount_description: Option<String>,
    /// stored copy of the net amount; never trusted
    #[serde(default)]
    pub net_payable_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: Uuid,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub amount_paid: f64,
    pub date: String,
    pub mode_of_payment: String,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// every table fetched for one school
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolRows {
    pub classes: Vec<ClassRow>,
    pub fee_types: Vec<FeeTypeRow>,
    pub fee_type_classes: Vec<FeeTypeClassRow>,
    pub students: Vec<StudentRow>,
    pub student_fee_types: Vec<StudentFeeTypeRow>,
    pub payments: Vec<PaymentRow>,
}

impl SchoolRows {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// validate and coerce every row into book state for `school_id`
    pub fn into_state(self, school_id: SchoolId, config: &LedgerConfig) -> Result<BookState> {
        let mut state = BookState::new(school_id);

        for row in self.classes {
            ensure_school(school_id, row.school_id)?;
            state.classes.insert(
                row.id,
                SchoolClass {
                    id: row.id,
                    school_id,
                    name: row.name.trim().to_string(),
                },
            );
        }

        for row in self.fee_types {
            ensure_school(school_id, row.school_id)?;
            let fee_type = row.into_definition()?;
            state.fee_types.insert(fee_type.id, fee_type);
        }

        for row in self.fee_type_classes {
            ensure_school(school_id, row.school_id)?;
            if !state.fee_types.contains_key(&row.fee_type_id) || !state.classes.contains_key(&row.class_id) {
                tracing::warn!(
                    fee_type_id = %row.fee_type_id,
                    class_id = %row.class_id,
                    "dropping link to unknown fee type or class"
                );
                continue;
            }
            state.fee_type_classes.insert((row.fee_type_id, row.class_id));
        }

        for row in self.students {
            ensure_school(school_id, row.school_id)?;
            let student = row.into_student()?;
            state.students.insert(student.id, student);
        }

        for row in self.student_fee_types {
            ensure_school(school_id, row.school_id)?;
            if !state.students.contains_key(&row.student_id) {
                return Err(FeeError::StudentNotFound { id: row.student_id });
            }
            let fee_type = state.fee_types.get(&row.fee_type_id);
            let assignment = row.into_assignment(fee_type)?;
            state.insert_assignment(assignment);
        }

        for row in self.payments {
            ensure_school(school_id, row.school_id)?;
            if !state.students.contains_key(&row.student_id) {
                return Err(FeeError::StudentNotFound { id: row.student_id });
            }
            let payment = row.into_payment(&config.receipt_config.fallback_prefix)?;
            state.payments.push(payment);
        }

        tracing::debug!(
            %school_id,
            classes = state.classes.len(),
            fee_types = state.fee_types.len(),
            students = state.students.len(),
            assignments = state.assignments.len(),
            payments = state.payments.len(),
            "loaded school rows"
        );

        Ok(state)
    }
}

impl FeeTypeRow {
    pub fn into_definition(self) -> Result<FeeTypeDefinition> {
        let base_amount = match self.default_amount {
            Some(value) => money("fee_type.default_amount", value)?,
            None => Money::ZERO,
        };

        let mut builder = FeeTypeDefinition::builder(self.school_id)
            .id(self.id)
            .name(self.name)
            .base_amount(base_amount);

        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(date) = non_blank(self.scheduled_date) {
            builder = builder.scheduled_on(CalendarDate::parse(&date));
        }
        if let Some(date) = non_blank(self.applicable_from) {
            builder = builder.applicable_from(CalendarDate::parse(&date));
        }
        if let Some(date) = non_blank(self.applicable_until) {
            builder = builder.applicable_until(CalendarDate::parse(&date));
        }

        builder.build()
    }
}

impl StudentRow {
    pub fn into_student(self) -> Result<Student> {
        let total_fees = match self.total_fees {
            Some(value) => money("student.total_fees", value)?,
            None => Money::ZERO,
        };
        Ok(Student {
            id: self.id,
            school_id: self.school_id,
            name: self.name.trim().to_string(),
            roll_no: self.roll_no.unwrap_or_default().trim().to_string(),
            class_id: self.class_id,
            academic_year: self.academic_year.unwrap_or_default().trim().to_string(),
            total_fees,
        })
    }
}

impl StudentFeeTypeRow {
    /// coerce using the fee type's base amount when the row has none
    pub fn into_assignment(self, fee_type: Option<&FeeTypeDefinition>) -> Result<FeeAssignment> {
        let assigned_amount = match self.assigned_amount {
            Some(value) => money("student_fee_type.assigned_amount", value)?,
            None => fee_type.map(|f| f.base_amount).unwrap_or(Money::ZERO),
        };
        let discount = match self.discount {
            Some(value) => money("student_fee_type.discount", value)?,
            None => Money::ZERO,
        };

        let mut assignment = FeeAssignment {
            id: self.id,
            student_id: self.student_id,
            fee_type_id: self.fee_type_id,
            assigned_amount,
            discount: Money::ZERO,
            discount_description: None,
        };
        assignment.set_discount(discount, self.discount_description)?;

        if let Some(stored) = self.net_payable_amount.and_then(Money::from_f64) {
            if stored != assignment.net_payable() {
                tracing::debug!(
                    assignment_id = self.id,
                    %stored,
                    computed = %assignment.net_payable(),
                    "stored net payable ignored"
                );
            }
        }

        Ok(assignment)
    }
}

impl PaymentRow {
    pub fn into_payment(self, receipt_prefix: &str) -> Result<Payment> {
        let amount_paid = money("payment.amount_paid", self.amount_paid)?;
        if !amount_paid.is_positive() {
            return Err(FeeError::InvalidPaymentAmount { amount: amount_paid });
        }

        let date = parse_timestamp(&self.date).ok_or_else(|| FeeError::InvalidDate {
            field: "payment.date".to_string(),
            value: self.date.clone(),
        })?;

        let mode = self.mode_of_payment.parse::<PaymentMode>().unwrap_or_else(|_| {
            tracing::warn!(
                payment_id = %self.id,
                mode = %self.mode_of_payment,
                "unknown payment mode, recorded as other"
            );
            PaymentMode::Other
        });

        Ok(Payment {
            id: self.id,
            student_id: self.student_id,
            school_id: self.school_id,
            amount_paid,
            date,
            mode,
            receipt_number: resolve_receipt_number(self.receipt_number, receipt_prefix, date),
            description: non_blank(self.description),
        })
    }
}

fn ensure_school(expected: SchoolId, found: SchoolId) -> Result<()> {
    if expected != found {
        return Err(FeeError::SchoolMismatch { expected, found });
    }
    Ok(())
}

fn money(field: &str, value: f64) -> Result<Money> {
    if !value.is_finite() {
        return Err(FeeError::NonFiniteNumber {
            field: field.to_string(),
        });
    }
    Money::from_f64(value).ok_or_else(|| FeeError::NonFiniteNumber {
        field: field.to_string(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Ids {
        school: Uuid,
        class: Uuid,
        fee: Uuid,
        student: Uuid,
    }

    fn ids() -> Ids {
        Ids {
            school: Uuid::new_v4(),
            class: Uuid::new_v4(),
            fee: Uuid::new_v4(),
            student: Uuid::new_v4(),
        }
    }

    fn rows(ids: &Ids) -> serde_json::Value {
        json!({
            "classes": [{ "id": ids.class, "school_id": ids.school, "name": "Grade 3", "created_at": "2025-01-01" }],
            "fee_types": [{
                "id": ids.fee, "school_id": ids.school, "name": "Tuition",
                "default_amount": 1200.0, "scheduled_date": "2025-04-01T00:00:00+00:00",
                "applicable_from": null, "applicable_until": "not a date"
            }],
            "fee_type_classes": [{ "school_id": ids.school, "fee_type_id": ids.fee, "class_id": ids.class }],
            "students": [{
                "id": ids.student, "school_id": ids.school, "name": "Meera",
                "roll_no": "4", "class_id": ids.class, "academic_year": "2025-26", "total_fees": null
            }],
            "student_fee_types": [{
                "id": 9, "school_id": ids.school, "student_id": ids.student, "fee_type_id": ids.fee,
                "assigned_amount": null, "discount": null, "net_payable_amount": 5.0
            }],
            "payments": [{
                "id": Uuid::new_v4(), "school_id": ids.school, "student_id": ids.student,
                "amount_paid": 300.5, "date": "2025-06-03T10:15:00Z",
                "mode_of_payment": "barter", "receipt_number": "  "
            }]
        })
    }

    fn load(value: serde_json::Value, school: Uuid) -> Result<BookState> {
        SchoolRows::from_json(&value.to_string())?.into_state(school, &LedgerConfig::default())
    }

    #[test]
    fn test_ingress_coerces_rows() {
        let ids = ids();
        let state = load(rows(&ids), ids.school).unwrap();

        let fee = &state.fee_types[&ids.fee];
        assert_eq!(fee.base_amount, Money::from_major(1_200));
        assert_eq!(fee.scheduled_date, Some(CalendarDate::from_ymd(2025, 4, 1)));
        assert!(fee.applicable_until.as_ref().unwrap().is_malformed());

        // assigned amount falls back to the fee type default; stored net ignored
        let assignment = &state.assignments[&9];
        assert_eq!(assignment.assigned_amount, Money::from_major(1_200));
        assert_eq!(assignment.discount, Money::ZERO);
        assert_eq!(assignment.net_payable(), Money::from_major(1_200));

        assert_eq!(state.students[&ids.student].total_fees, Money::ZERO);
        assert!(state.fee_type_classes.contains(&(ids.fee, ids.class)));

        let payment = &state.payments[0];
        assert_eq!(payment.mode, PaymentMode::Other);
        assert_eq!(payment.amount_paid, Money::from_minor(30_050));
        assert_eq!(payment.receipt_number, format!("R-{}", payment.date.timestamp_millis()));
    }

    #[test]
    fn test_missing_fee_type_keeps_assignment() {
        let ids = ids();
        let mut value = rows(&ids);
        value["student_fee_types"][0]["fee_type_id"] = json!(Uuid::new_v4());

        let state = load(value, ids.school).unwrap();
        assert_eq!(state.assignments[&9].assigned_amount, Money::ZERO);
    }

    #[test]
    fn test_rejects_other_school() {
        let ids = ids();
        let err = load(rows(&ids), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, FeeError::SchoolMismatch { .. }));
    }

    #[test]
    fn test_rejects_bad_payments() {
        let ids = ids();

        let mut value = rows(&ids);
        value["payments"][0]["amount_paid"] = json!(0.0);
        assert!(matches!(
            load(value, ids.school),
            Err(FeeError::InvalidPaymentAmount { .. })
        ));

        let mut value = rows(&ids);
        value["payments"][0]["date"] = json!("yesterday");
        assert!(matches!(load(value, ids.school), Err(FeeError::InvalidDate { .. })));
    }

    #[test]
    fn test_payment_dates_without_rfc3339_offset() {
        let ids = ids();
        for raw in ["2025-06-03T10:15:00", "2025-06-03 10:15:00+00", "2025-06-03T10:15:00.123456"] {
            let mut value = rows(&ids);
            value["payments"][0]["date"] = json!(raw);

            let state = load(value, ids.school).unwrap();
            let date = state.payments[0].date;
            assert_eq!(date.date_naive(), chrono::NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), "{raw}");
            assert_eq!(date.format("%H:%M:%S").to_string(), "10:15:00", "{raw}");
        }
    }

    #[test]
    fn test_rejects_negative_discount_and_base() {
        let ids = ids();

        let mut value = rows(&ids);
        value["student_fee_types"][0]["discount"] = json!(-5.0);
        assert!(matches!(load(value, ids.school), Err(FeeError::InvalidAmount { .. })));

        let mut value = rows(&ids);
        value["fee_types"][0]["default_amount"] = json!(-1.0);
        assert!(matches!(load(value, ids.school), Err(FeeError::InvalidAmount { .. })));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(matches!(
            money("x", f64::NAN),
            Err(FeeError::NonFiniteNumber { .. })
        ));
        assert!(matches!(
            money("x", f64::INFINITY),
            Err(FeeError::NonFiniteNumber { .. })
        ));
    }

    #[test]
    fn test_empty_rows() {
        let school = Uuid::new_v4();
        let state = SchoolRows::from_json("{}")
            .unwrap()
            .into_state(school, &LedgerConfig::default())
            .unwrap();
        assert!(state.students.is_empty());
    }
}
