use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// a calendar date column as it came from the store
///
/// Fee types keep malformed dates instead of rejecting the row, so the
/// applicability check can treat them as "not due".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CalendarDate {
    Valid(NaiveDate),
    Malformed(String),
}

impl CalendarDate {
    /// parse a `YYYY-MM-DD` string, optionally followed by a time part
    pub fn parse(raw: &str) -> Self {
        match parse_calendar_day(raw) {
            Some(date) => CalendarDate::Valid(date),
            None => CalendarDate::Malformed(raw.to_string()),
        }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => CalendarDate::Valid(date),
            None => CalendarDate::Malformed(format!("{:04}-{:02}-{:02}", year, month, day)),
        }
    }

    /// the date, if it parsed
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            CalendarDate::Valid(date) => Some(*date),
            CalendarDate::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, CalendarDate::Malformed(_))
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        CalendarDate::Valid(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarDate::Valid(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            CalendarDate::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CalendarDate::parse(&raw))
    }
}

/// parse the calendar day of a date or timestamp string
///
/// Accepts `2025-06-01`, `2025-06-01T10:30:00Z` and `2025-06-01 10:30:00`.
/// The time part is ignored. Impossible dates such as `2025-02-30` fail.
pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day_part = match trimmed.find(|c: char| c == 'T' || c == ' ') {
        Some(index) => &trimmed[..index],
        None => trimmed,
    };
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// parse a payment timestamp
///
/// Accepts RFC 3339, the Postgres text form (`2025-06-03 10:15:00+00`) and
/// timestamps without an offset, which are read as UTC. Date-only values land
/// on UTC midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
    {
        return Some(naive.and_utc());
    }
    if trimmed.len() == 10 {
        return parse_calendar_day(trimmed)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
    }
    None
}

/// today's UTC calendar date from the time provider
pub fn utc_today(time: &SafeTimeProvider) -> NaiveDate {
    time.now().date_naive()
}
