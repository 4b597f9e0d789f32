use thiserror::Error;

use crate::decimal::Money;
use crate::types::{AssignmentId, ClassId, FeeTypeId, SchoolId, StudentId};

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("student not found: {id}")]
    StudentNotFound {
        id: StudentId,
    },

    #[error("class not found: {id}")]
    ClassNotFound {
        id: ClassId,
    },

    #[error("fee type not found: {id}")]
    FeeTypeNotFound {
        id: FeeTypeId,
    },

    #[error("fee assignment not found: {id}")]
    AssignmentNotFound {
        id: AssignmentId,
    },

    #[error("fee type {fee_type_id} is not assigned to student {student_id}")]
    FeeNotAssigned {
        student_id: StudentId,
        fee_type_id: FeeTypeId,
    },

    #[error("fee type {fee_type_id} already assigned to student {student_id}")]
    DuplicateAssignment {
        student_id: StudentId,
        fee_type_id: FeeTypeId,
    },

    #[error("roll number {roll_no} already exists in class {class_name} for {academic_year}")]
    DuplicateRollNumber {
        roll_no: String,
        class_name: String,
        academic_year: String,
    },

    #[error("class already exists: {name}")]
    DuplicateClassName {
        name: String,
    },

    #[error("student {student_id} is not in class {class_id}")]
    StudentNotInClass {
        student_id: StudentId,
        class_id: ClassId,
    },

    #[error("invalid amount for {field}: {amount}")]
    InvalidAmount {
        field: String,
        amount: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("non-finite number in {field}")]
    NonFiniteNumber {
        field: String,
    },

    #[error("missing required field: {field}")]
    MissingField {
        field: String,
    },

    #[error("invalid date in {field}: {value}")]
    InvalidDate {
        field: String,
        value: String,
    },

    #[error("unknown payment mode: {mode}")]
    UnknownPaymentMode {
        mode: String,
    },

    #[error("row belongs to school {found}, expected {expected}")]
    SchoolMismatch {
        expected: SchoolId,
        found: SchoolId,
    },

    #[error("invalid reporting period: {message}")]
    InvalidPeriod {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("malformed row data: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeeError>;
