pub mod applicability;
pub mod calendar;
pub mod period;

pub use applicability::{is_currently_due, Applicability, ApplicabilityEvaluator, DateField};
pub use calendar::{parse_calendar_day, parse_timestamp, utc_today, CalendarDate};
pub use period::{CollectionPeriod, DateRange};
