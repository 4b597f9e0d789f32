pub mod book;
pub mod config;
pub mod context;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod records;
pub mod reporting;
pub mod schedule;
pub mod state;
pub mod types;

// re-export key types
pub use book::{AssignmentSync, FeeBook, TotalDrift};
pub use config::{LabelConfig, LedgerConfig, ReceiptConfig, StatusConfig};
pub use context::ReportContext;
pub use decimal::Money;
pub use errors::{FeeError, Result};
pub use events::{EventStore, LedgerEvent};
pub use ledger::{
    aggregate, balance_treatment, classify, FeeLine, FeeTotals, PaymentDigest, StatusClassifier,
    StudentFeeAggregator, StudentFeeSummary,
};
pub use records::{
    AssignedFee, FeeAssignment, FeeSelection, FeeTypeBuilder, FeeTypeDefinition, Payment,
    PaymentRequest, SchoolClass, SchoolRows, Student, StudentRegistration,
};
pub use reporting::{
    ClassRollup, CollectionEntry, CollectionsReport, DashboardStats, LedgerExport, LedgerExportRow,
    LedgerLine, SchoolRollup, SearchQuery, StatusCounts,
};
pub use schedule::{
    is_currently_due, Applicability, ApplicabilityEvaluator, CalendarDate, CollectionPeriod,
    DateRange,
};
pub use state::BookState;
pub use types::{
    AssignmentId, BalanceTreatment, ClassId, FeeScope, FeeTypeId, PaymentId, PaymentMode,
    PaymentStatus, SchoolId, StudentId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
