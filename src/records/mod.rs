pub mod assignment;
pub mod fee_type;
pub mod payment;
pub mod rows;
pub mod student;

pub use assignment::{AssignedFee, FeeAssignment};
pub use fee_type::{FeeTypeBuilder, FeeTypeDefinition};
pub use payment::{latest_payment, resolve_receipt_number, Payment, PaymentRequest};
pub use rows::{
    ClassRow, FeeTypeClassRow, FeeTypeRow, PaymentRow, SchoolRows, StudentFeeTypeRow, StudentRow,
};
pub use student::{FeeSelection, SchoolClass, Student, StudentRegistration};
