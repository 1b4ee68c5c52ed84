//! Day-grouped meal history
//!
//! Meals over a calendar date interval, bucketed by the day they fall
//! on in a caller-supplied IANA timezone. Buckets and meals within a
//! bucket are ordered most recent first.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::Meal;
use crate::nutrition::range::{DateRange, NutritionError};
use crate::nutrition::store::MealStore;

/// A meal as it appears in the history view
#[derive(Debug, Clone, Serialize)]
pub struct HistoryMeal {
    pub id: i64,
    pub name: String,
    pub eaten_at: DateTime<Utc>,
    pub eaten_at_local: String,
    pub kcal: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, String>,
}

/// Meals that share a local calendar day
#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub meals: Vec<HistoryMeal>,
    /// Sum of derived meal calories; None when the day has no
    /// computable calories at all
    pub total_kcal: Option<f64>,
}

/// Range-wide counts and calorie total
#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub day_count: usize,
    pub meal_count: usize,
    pub total_kcal: Option<f64>,
}

/// The full day-grouped history response
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub timezone: String,
    pub days: Vec<DayBucket>,
    pub summary: HistorySummary,
}

/// Map a named period to a concrete date interval ending today.
///
/// `this_week` starts on the ISO Monday of the current week,
/// `this_month` on the first of the month. `last_7_days` and
/// `last_30_days` are rolling windows that include today.
pub fn resolve_period(
    period: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), NutritionError> {
    let start = match period {
        "this_week" => today - Duration::days(today.weekday().num_days_from_monday() as i64),
        "this_month" => today - Duration::days(today.day0() as i64),
        "last_7_days" => today - Duration::days(6),
        "last_30_days" => today - Duration::days(29),
        other => return Err(NutritionError::UnsupportedPeriod(other.to_string())),
    };
    Ok((start, today))
}

fn action_links(base_url: Option<&str>, meal_id: i64) -> BTreeMap<String, String> {
    let mut actions = BTreeMap::new();
    if let Some(base) = base_url {
        let base = base.trim_end_matches('/');
        if !base.is_empty() {
            actions.insert("update".to_string(), format!("{}/meals/{}", base, meal_id));
            actions.insert("delete".to_string(), format!("{}/meals/{}", base, meal_id));
            actions.insert(
                "star".to_string(),
                format!("{}/meals/{}/favorite", base, meal_id),
            );
        }
    }
    actions
}

fn non_zero(kcal: f64) -> Option<f64> {
    if kcal > 0.0 {
        Some(kcal)
    } else {
        None
    }
}

/// Fetch meals in `[start_date, end_date]` and group them by the
/// calendar day of `eaten_at` in `tz_name`.
///
/// The interval bounds are interpreted as UTC dates when querying;
/// only the grouping uses the caller's timezone, so a late-evening UTC
/// meal can land on the previous local day.
pub fn history_grouped_by_day<S: MealStore>(
    store: &S,
    start_date: NaiveDate,
    end_date: NaiveDate,
    tz_name: &str,
    base_url: Option<&str>,
) -> Result<HistoryView, NutritionError> {
    let tz: Tz = tz_name
        .parse()
        .map_err(|_| NutritionError::InvalidTimezone(tz_name.to_string()))?;

    let range = DateRange::from_dates(start_date, end_date)?;
    let meals = store.meals_in_range(range.start, range.end)?;

    let mut grouped: BTreeMap<NaiveDate, Vec<HistoryMeal>> = BTreeMap::new();
    for meal in meals {
        let local = meal.eaten_at.with_timezone(&tz);
        grouped
            .entry(local.date_naive())
            .or_default()
            .push(HistoryMeal {
                id: meal.id,
                name: meal.name,
                eaten_at: meal.eaten_at,
                eaten_at_local: local.to_rfc3339(),
                kcal: meal.kcal,
                actions: action_links(base_url, meal.id),
            });
    }

    let mut meal_count = 0;
    let mut range_kcal = 0.0;
    let days: Vec<DayBucket> = grouped
        .into_iter()
        .rev()
        .map(|(day, mut bucket_meals)| {
            bucket_meals.sort_by(|a, b| b.eaten_at.cmp(&a.eaten_at));
            let day_kcal: f64 = bucket_meals.iter().filter_map(|m| m.kcal).sum();
            meal_count += bucket_meals.len();
            range_kcal += day_kcal;
            DayBucket {
                day,
                meals: bucket_meals,
                total_kcal: non_zero(day_kcal),
            }
        })
        .collect();

    let summary = HistorySummary {
        day_count: days.len(),
        meal_count,
        total_kcal: non_zero(range_kcal),
    };

    Ok(HistoryView {
        range_start: start_date,
        range_end: end_date,
        timezone: tz_name.to_string(),
        days,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::store::testing::VecStore;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meal(id: i64, name: &str, eaten_at: DateTime<Utc>, kcal: Option<f64>) -> Meal {
        Meal {
            id,
            name: name.to_string(),
            eaten_at,
            is_favorite: false,
            kcal,
            entries: vec![],
        }
    }

    fn store_with(meals: Vec<Meal>) -> VecStore {
        VecStore {
            meals,
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_local_day_across_utc_midnight() {
        // 02:00 UTC on the 31st is 22:00 on the 30th in New York (EDT)
        let store = store_with(vec![
            meal(
                1,
                "Late dinner",
                Utc.with_ymd_and_hms(2025, 8, 31, 2, 0, 0).unwrap(),
                Some(700.0),
            ),
            meal(
                2,
                "Lunch",
                Utc.with_ymd_and_hms(2025, 8, 30, 16, 0, 0).unwrap(),
                Some(500.0),
            ),
        ]);

        let view = history_grouped_by_day(
            &store,
            day(2025, 8, 30),
            day(2025, 8, 31),
            "America/New_York",
            None,
        )
        .unwrap();

        assert_eq!(view.days.len(), 1);
        assert_eq!(view.days[0].day, day(2025, 8, 30));
        assert_eq!(view.days[0].meals.len(), 2);
        assert!((view.days[0].total_kcal.unwrap() - 1200.0).abs() < 0.001);
    }

    #[test]
    fn test_buckets_and_meals_are_most_recent_first() {
        let store = store_with(vec![
            meal(
                1,
                "Breakfast",
                Utc.with_ymd_and_hms(2025, 8, 28, 8, 0, 0).unwrap(),
                Some(300.0),
            ),
            meal(
                2,
                "Dinner",
                Utc.with_ymd_and_hms(2025, 8, 28, 19, 0, 0).unwrap(),
                Some(600.0),
            ),
            meal(
                3,
                "Lunch",
                Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap(),
                Some(450.0),
            ),
        ]);

        let view = history_grouped_by_day(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            "UTC",
            None,
        )
        .unwrap();

        assert_eq!(view.days.len(), 2);
        assert_eq!(view.days[0].day, day(2025, 8, 30));
        assert_eq!(view.days[1].day, day(2025, 8, 28));
        assert_eq!(view.days[1].meals[0].name, "Dinner");
        assert_eq!(view.days[1].meals[1].name, "Breakfast");

        assert_eq!(view.summary.day_count, 2);
        assert_eq!(view.summary.meal_count, 3);
        assert!((view.summary.total_kcal.unwrap() - 1350.0).abs() < 0.001);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let store = store_with(vec![
            meal(
                1,
                "Breakfast",
                Utc.with_ymd_and_hms(2025, 8, 28, 8, 0, 0).unwrap(),
                Some(300.0),
            ),
            meal(
                2,
                "Dinner",
                Utc.with_ymd_and_hms(2025, 8, 29, 19, 0, 0).unwrap(),
                Some(600.0),
            ),
        ]);

        let first = history_grouped_by_day(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            "Europe/Berlin",
            Some("https://app.example.com"),
        )
        .unwrap();
        let second = history_grouped_by_day(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            "Europe/Berlin",
            Some("https://app.example.com"),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_day_without_computable_calories_has_null_total() {
        let store = store_with(vec![meal(
            1,
            "Black coffee",
            Utc.with_ymd_and_hms(2025, 8, 30, 7, 0, 0).unwrap(),
            None,
        )]);

        let view = history_grouped_by_day(
            &store,
            day(2025, 8, 30),
            day(2025, 8, 30),
            "UTC",
            None,
        )
        .unwrap();

        assert_eq!(view.days.len(), 1);
        assert_eq!(view.days[0].meals.len(), 1);
        assert!(view.days[0].total_kcal.is_none());
        assert!(view.summary.total_kcal.is_none());
    }

    #[test]
    fn test_action_links_only_with_base_url() {
        let store = store_with(vec![meal(
            7,
            "Lunch",
            Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap(),
            Some(450.0),
        )]);

        let without = history_grouped_by_day(
            &store,
            day(2025, 8, 30),
            day(2025, 8, 30),
            "UTC",
            None,
        )
        .unwrap();
        assert!(without.days[0].meals[0].actions.is_empty());

        let with = history_grouped_by_day(
            &store,
            day(2025, 8, 30),
            day(2025, 8, 30),
            "UTC",
            Some("https://app.example.com/"),
        )
        .unwrap();
        let actions = &with.days[0].meals[0].actions;
        assert_eq!(
            actions.get("update").unwrap(),
            "https://app.example.com/meals/7"
        );
        assert_eq!(
            actions.get("delete").unwrap(),
            "https://app.example.com/meals/7"
        );
        assert_eq!(
            actions.get("star").unwrap(),
            "https://app.example.com/meals/7/favorite"
        );
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let store = store_with(vec![]);
        assert!(matches!(
            history_grouped_by_day(
                &store,
                day(2025, 8, 30),
                day(2025, 8, 30),
                "Mars/Olympus",
                None,
            ),
            Err(NutritionError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_resolve_period_this_week_starts_monday() {
        // 2025-08-28 is a Thursday
        let (start, end) = resolve_period("this_week", day(2025, 8, 28)).unwrap();
        assert_eq!(start, day(2025, 8, 25));
        assert_eq!(end, day(2025, 8, 28));
    }

    #[test]
    fn test_resolve_period_this_month() {
        let (start, end) = resolve_period("this_month", day(2025, 8, 28)).unwrap();
        assert_eq!(start, day(2025, 8, 1));
        assert_eq!(end, day(2025, 8, 28));
    }

    #[test]
    fn test_resolve_period_rolling_windows_include_today() {
        let (start, end) = resolve_period("last_7_days", day(2025, 8, 28)).unwrap();
        assert_eq!(start, day(2025, 8, 22));
        assert_eq!(end, day(2025, 8, 28));

        let (start, _) = resolve_period("last_30_days", day(2025, 8, 28)).unwrap();
        assert_eq!(start, day(2025, 7, 30));
    }

    #[test]
    fn test_resolve_period_rejects_unknown_names() {
        assert!(matches!(
            resolve_period("fortnight", day(2025, 8, 28)),
            Err(NutritionError::UnsupportedPeriod(_))
        ));
    }
}
