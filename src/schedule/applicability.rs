use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::records::FeeTypeDefinition;
use crate::schedule::calendar::{utc_today, CalendarDate};

/// date field of a fee type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    ScheduledDate,
    ApplicableFrom,
    ApplicableUntil,
}

/// outcome of checking a fee type against a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Applicability {
    /// counts toward currently due totals
    Due,
    /// the assignment's fee type could not be loaded
    MissingDefinition,
    /// a date field is set but does not parse
    MalformedDate { field: DateField },
    /// scheduled date still in the future
    NotYetScheduled { scheduled: NaiveDate },
    /// window has not opened yet
    BeforeWindow { from: NaiveDate },
    /// window already closed
    AfterWindow { until: NaiveDate },
}

impl Applicability {
    pub fn is_due(&self) -> bool {
        matches!(self, Applicability::Due)
    }
}

/// decides whether fee types are currently due on a given UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicabilityEvaluator {
    pub today: NaiveDate,
}

impl ApplicabilityEvaluator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// evaluator for the provider's current UTC day
    pub fn from_time(time: &SafeTimeProvider) -> Self {
        Self::new(utc_today(time))
    }

    /// full verdict; the scheduled date is reported before the window
    pub fn evaluate(&self, fee_type: Option<&FeeTypeDefinition>) -> Applicability {
        let Some(fee_type) = fee_type else {
            return Applicability::MissingDefinition;
        };

        let scheduled = self.check_scheduled(fee_type.scheduled_date.as_ref());
        let window = self.check_window(
            fee_type.applicable_from.as_ref(),
            fee_type.applicable_until.as_ref(),
        );

        let verdict = scheduled.or(window).unwrap_or(Applicability::Due);
        if let Applicability::MalformedDate { field } = verdict {
            tracing::debug!(
                fee_type_id = %fee_type.id,
                fee_type = %fee_type.name,
                ?field,
                "unparseable date, fee treated as not due"
            );
        }
        verdict
    }

    pub fn is_currently_due(&self, fee_type: Option<&FeeTypeDefinition>) -> bool {
        self.evaluate(fee_type).is_due()
    }

    fn check_scheduled(&self, scheduled: Option<&CalendarDate>) -> Option<Applicability> {
        let scheduled = scheduled?;
        match scheduled.date() {
            None => Some(Applicability::MalformedDate {
                field: DateField::ScheduledDate,
            }),
            Some(date) if date <= self.today => None,
            Some(date) => Some(Applicability::NotYetScheduled { scheduled: date }),
        }
    }

    fn check_window(
        &self,
        from: Option<&CalendarDate>,
        until: Option<&CalendarDate>,
    ) -> Option<Applicability> {
        if let Some(from) = from {
            match from.date() {
                None => {
                    return Some(Applicability::MalformedDate {
                        field: DateField::ApplicableFrom,
                    })
                }
                Some(date) if self.today < date => {
                    return Some(Applicability::BeforeWindow { from: date })
                }
                Some(_) => {}
            }
        }

        if let Some(until) = until {
            match until.date() {
                None => {
                    return Some(Applicability::MalformedDate {
                        field: DateField::ApplicableUntil,
                    })
                }
                Some(date) if self.today > date => {
                    return Some(Applicability::AfterWindow { until: date })
                }
                Some(_) => {}
            }
        }

        None
    }
}

/// whether a fee type counts toward currently due totals on `today`
pub fn is_currently_due(fee_type: Option<&FeeTypeDefinition>, today: NaiveDate) -> bool {
    ApplicabilityEvaluator::new(today).is_currently_due(fee_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fee() -> crate::records::FeeTypeBuilder {
        FeeTypeDefinition::builder(Uuid::new_v4())
            .name("Tuition")
            .base_amount(Money::from_major(1_000))
    }

    #[test]
    fn test_unscheduled_fee_always_due() {
        let fee = fee().build().unwrap();
        for today in [day(1999, 1, 1), day(2025, 6, 1), day(2100, 12, 31)] {
            assert!(is_currently_due(Some(&fee), today));
        }
    }

    #[test]
    fn test_missing_definition_never_due() {
        let evaluator = ApplicabilityEvaluator::new(day(2025, 6, 1));
        assert_eq!(evaluator.evaluate(None), Applicability::MissingDefinition);
        assert!(!evaluator.is_currently_due(None));
    }

    #[test]
    fn test_applicable_from_is_inclusive() {
        let fee = fee().applicable_from(CalendarDate::from_ymd(2025, 6, 1)).build().unwrap();

        let before = ApplicabilityEvaluator::new(day(2025, 5, 28));
        assert_eq!(
            before.evaluate(Some(&fee)),
            Applicability::BeforeWindow { from: day(2025, 6, 1) }
        );

        let on_boundary = ApplicabilityEvaluator::new(day(2025, 6, 1));
        assert!(on_boundary.is_currently_due(Some(&fee)));
    }

    #[test]
    fn test_applicable_until_is_inclusive() {
        let fee = fee().applicable_until(CalendarDate::from_ymd(2025, 6, 30)).build().unwrap();

        assert!(is_currently_due(Some(&fee), day(2025, 6, 30)));
        assert_eq!(
            ApplicabilityEvaluator::new(day(2025, 7, 1)).evaluate(Some(&fee)),
            Applicability::AfterWindow { until: day(2025, 6, 30) }
        );
    }

    #[test]
    fn test_scheduled_date() {
        let fee = fee().scheduled_on(CalendarDate::from_ymd(2025, 4, 10)).build().unwrap();

        assert_eq!(
            ApplicabilityEvaluator::new(day(2025, 4, 9)).evaluate(Some(&fee)),
            Applicability::NotYetScheduled { scheduled: day(2025, 4, 10) }
        );
        assert!(is_currently_due(Some(&fee), day(2025, 4, 10)));
        assert!(is_currently_due(Some(&fee), day(2026, 1, 1)));
    }

    #[test]
    fn test_malformed_dates_fail_closed() {
        let today = day(2025, 6, 1);

        let fee_a = fee().scheduled_on(CalendarDate::parse("soon")).build().unwrap();
        assert_eq!(
            ApplicabilityEvaluator::new(today).evaluate(Some(&fee_a)),
            Applicability::MalformedDate { field: DateField::ScheduledDate }
        );

        let fee_b = fee().applicable_from(CalendarDate::parse("2025-02-30")).build().unwrap();
        assert!(!is_currently_due(Some(&fee_b), today));

        let fee_c = fee().applicable_until(CalendarDate::parse("31/12/2025")).build().unwrap();
        assert_eq!(
            ApplicabilityEvaluator::new(today).evaluate(Some(&fee_c)),
            Applicability::MalformedDate { field: DateField::ApplicableUntil }
        );
    }

    #[test]
    fn test_closed_window_checked_before_malformed_until() {
        // window already failed on the lower bound, so the bad upper bound is never read
        let fee = fee()
            .applicable_from(CalendarDate::from_ymd(2025, 9, 1))
            .applicable_until(CalendarDate::parse("garbage"))
            .build()
            .unwrap();

        assert_eq!(
            ApplicabilityEvaluator::new(day(2025, 6, 1)).evaluate(Some(&fee)),
            Applicability::BeforeWindow { from: day(2025, 9, 1) }
        );
    }

    #[test]
    fn test_schedule_and_window_combined() {
        let fee = fee()
            .scheduled_on(CalendarDate::from_ymd(2025, 7, 1))
            .window(CalendarDate::from_ymd(2025, 6, 1), CalendarDate::from_ymd(2025, 12, 31))
            .build()
            .unwrap();

        // inside the window but not yet scheduled
        assert!(!is_currently_due(Some(&fee), day(2025, 6, 15)));
        assert!(is_currently_due(Some(&fee), day(2025, 7, 1)));
        assert!(!is_currently_due(Some(&fee), day(2026, 1, 1)));
    }

    #[test]
    fn test_evaluator_from_time_provider() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap()
        ));
        let controller = time.test_control().unwrap();
        let fee = fee().applicable_from(CalendarDate::from_ymd(2025, 6, 1)).build().unwrap();

        assert!(!ApplicabilityEvaluator::from_time(&time).is_currently_due(Some(&fee)));

        controller.advance(chrono::Duration::seconds(1));
        assert!(ApplicabilityEvaluator::from_time(&time).is_currently_due(Some(&fee)));
    }
}
