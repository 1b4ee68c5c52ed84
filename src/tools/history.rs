//! History MCP Tools
//!
//! Day-grouped meal history over an explicit date range or a named
//! period, bucketed in the caller's timezone.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::db::Database;
use crate::nutrition::{history_grouped_by_day, resolve_period, HistoryView};

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: {} (expected YYYY-MM-DD)", text))
}

/// Day-grouped meal history
///
/// Explicit `start_date`/`end_date` take precedence over `period`; when
/// neither is given the last 7 days are shown. Named periods are
/// resolved against today in the caller's timezone.
pub fn get_history(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    period: Option<&str>,
    timezone: Option<&str>,
    base_url: Option<&str>,
) -> Result<HistoryView, String> {
    let tz_name = timezone.unwrap_or("UTC");
    let tz: Tz = tz_name
        .parse()
        .map_err(|_| format!("Invalid timezone: {}", tz_name))?;

    let (start, end) = match (start_date, end_date) {
        (Some(s), Some(e)) => (parse_date(s)?, parse_date(e)?),
        (None, None) => {
            let today = Utc::now().with_timezone(&tz).date_naive();
            resolve_period(period.unwrap_or("last_7_days"), today)
                .map_err(|e| e.to_string())?
        }
        _ => {
            return Err("start_date and end_date must be provided together".to_string());
        }
    };

    history_grouped_by_day(db, start, end, tz_name, base_url)
        .map_err(|e| format!("Failed to build history: {}", e))
}
