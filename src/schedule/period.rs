use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{FeeError, Result};

/// inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(FeeError::InvalidPeriod {
                message: format!("range ends {} before it starts {}", end, start),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// reporting period for fee collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "period")]
pub enum CollectionPeriod {
    Daily { date: NaiveDate },
    /// the monday-to-sunday week containing `date`
    Weekly { date: NaiveDate },
    Monthly { year: i32, month: u32 },
    Quarterly { year: i32, quarter: u32 },
    Yearly { year: i32 },
}

impl CollectionPeriod {
    /// month period containing a date
    pub fn month_of(date: NaiveDate) -> Self {
        CollectionPeriod::Monthly {
            year: date.year(),
            month: date.month(),
        }
    }

    /// quarter period containing a date
    pub fn quarter_of(date: NaiveDate) -> Self {
        CollectionPeriod::Quarterly {
            year: date.year(),
            quarter: date.month0() / 3 + 1,
        }
    }

    /// resolve to the calendar days it covers
    pub fn range(&self) -> Result<DateRange> {
        match *self {
            CollectionPeriod::Daily { date } => DateRange::new(date, date),
            CollectionPeriod::Weekly { date } => {
                let out_of_range = || FeeError::InvalidPeriod {
                    message: format!("week of {} is outside the calendar", date),
                };
                let monday = date
                    .checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
                    .ok_or_else(out_of_range)?;
                let sunday = monday
                    .checked_add_signed(Duration::days(6))
                    .ok_or_else(out_of_range)?;
                DateRange::new(monday, sunday)
            }
            CollectionPeriod::Monthly { year, month } => {
                if !(1..=12).contains(&month) {
                    return Err(FeeError::InvalidPeriod {
                        message: format!("month must be 1-12, got {}", month),
                    });
                }
                DateRange::new(first_of_month(year, month)?, last_of_month(year, month)?)
            }
            CollectionPeriod::Quarterly { year, quarter } => {
                if !(1..=4).contains(&quarter) {
                    return Err(FeeError::InvalidPeriod {
                        message: format!("quarter must be 1-4, got {}", quarter),
                    });
                }
                let start_month = (quarter - 1) * 3 + 1;
                DateRange::new(
                    first_of_month(year, start_month)?,
                    last_of_month(year, start_month + 2)?,
                )
            }
            CollectionPeriod::Yearly { year } => {
                DateRange::new(first_of_month(year, 1)?, last_of_month(year, 12)?)
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(FeeError::InvalidPeriod {
        message: format!("no such month {}-{:02}", year, month),
    })
}

fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next = first_of_month(next_year, next_month)?;
    Ok(next - Duration::days(1))
}
