pub mod cohort;
pub mod collections;
pub mod dashboard;
pub mod export;

pub use cohort::{ClassRollup, LedgerLine, SchoolRollup, StatusCounts};
pub use collections::{CollectionEntry, CollectionsReport};
pub use dashboard::DashboardStats;
pub use export::{headers, LedgerExport, LedgerExportRow, SearchQuery};
