pub mod aggregator;
pub mod status;

pub use aggregator::{
    aggregate, FeeLine, FeeTotals, PaymentDigest, StudentFeeAggregator, StudentFeeSummary,
};
pub use status::{balance_treatment, classify, StatusClassifier};
