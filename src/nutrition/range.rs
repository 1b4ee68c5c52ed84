//! Date range handling
//!
//! UTC date ranges and the error type shared by the aggregation core.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::db::DbError;

/// Errors from the aggregation core
#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("end date must be on or after start date")]
    InvalidRange,

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unsupported period: {0}")]
    UnsupportedPeriod(String),

    #[error(transparent)]
    Store(#[from] DbError),
}

/// An inclusive UTC time range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Create a range, rejecting `end < start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, NutritionError> {
        if end < start {
            return Err(NutritionError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Inclusive UTC bounds for a calendar date interval:
    /// start at 00:00:00, end at 23:59:59.999999
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, NutritionError> {
        if end_date < start_date {
            return Err(NutritionError::InvalidRange);
        }

        let start = start_date.and_time(NaiveTime::MIN).and_utc();
        let end = (end_date + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
            - Duration::microseconds(1);

        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_rejects_inverted_range() {
        let start = Utc.with_ymd_and_hms(2025, 8, 30, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 8, 28, 0, 0, 0).unwrap();
        assert!(matches!(
            DateRange::new(start, end),
            Err(NutritionError::InvalidRange)
        ));
        assert!(DateRange::new(end, start).is_ok());
    }

    #[test]
    fn test_from_dates_bounds() {
        let start_date = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        let end_date = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();

        let range = DateRange::from_dates(start_date, end_date).unwrap();
        assert_eq!(
            range.start,
            Utc.with_ymd_and_hms(2025, 8, 28, 0, 0, 0).unwrap()
        );
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2025, 8, 30, 23, 59, 59).unwrap()
                + Duration::microseconds(999_999)
        );
    }

    #[test]
    fn test_from_dates_rejects_inverted_dates() {
        let start_date = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();
        let end_date = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        assert!(matches!(
            DateRange::from_dates(start_date, end_date),
            Err(NutritionError::InvalidRange)
        ));
    }

    #[test]
    fn test_single_day_range() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        let range = DateRange::from_dates(day, day).unwrap();
        assert!(range.start < range.end);
        assert_eq!(range.start.date_naive(), range.end.date_naive());
    }
}
