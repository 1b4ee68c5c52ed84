//! Statistics MCP Tools
//!
//! Date-range calorie statistics with a macro percentage split.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::nutrition::{daily_calories_and_macro_split, Basis, DayCalories, MacroPercentages};

/// Response for get_stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub basis: Basis,
    pub days: Vec<DayCalories>,
    pub macro_split: MacroPercentages,
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: {} (expected YYYY-MM-DD)", text))
}

/// Per-day calorie totals and range-wide macro split for a date interval
///
/// Days are grouped by the stored UTC date. Every day in the interval
/// appears in the output, zero-filled when no meals were logged.
pub fn get_stats(
    db: &Database,
    start_date: &str,
    end_date: &str,
    basis: Option<&str>,
    round_to: Option<u32>,
) -> Result<StatsResponse, String> {
    let start_date = parse_date(start_date)?;
    let end_date = parse_date(end_date)?;

    let basis = match basis {
        Some(text) => Basis::from_str(text)
            .ok_or_else(|| format!("Invalid basis: {} (expected kcal or grams)", text))?,
        None => Basis::Kcal,
    };
    let round_to = round_to.unwrap_or(1).min(6);

    let result = daily_calories_and_macro_split(db, start_date, end_date, basis, round_to)
        .map_err(|e| format!("Failed to compute stats: {}", e))?;

    Ok(StatsResponse {
        start_date,
        end_date,
        basis: result.basis,
        days: result.days,
        macro_split: result.macro_pct,
    })
}
