//! Calorie statistics
//!
//! Zero-filled per-day calorie series plus a macro percentage split
//! over a calendar date interval. Days are bucketed by the stored UTC
//! date of each meal.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::MacroTotals;
use crate::nutrition::range::NutritionError;
use crate::nutrition::store::MealStore;

/// How the macro split is weighted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    /// Weight by calorie contribution: protein and carbs at 4 kcal/g,
    /// fat at 9 kcal/g
    Kcal,
    /// Weight by raw gram totals
    Grams,
}

impl Basis {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kcal" => Some(Basis::Kcal),
            "grams" => Some(Basis::Grams),
            _ => None,
        }
    }
}

/// One day's calorie total, zero-filled for days without meals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCalories {
    pub day: NaiveDate,
    pub calories: f64,
}

/// Macro split over the whole range, summing to exactly 100.0
/// (fat takes the rounding remainder)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroPercentages {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// Per-day calorie series and range-wide macro split
#[derive(Debug, Clone, Serialize)]
pub struct StatsResult {
    pub days: Vec<DayCalories>,
    pub macro_pct: MacroPercentages,
    pub basis: Basis,
}

fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

fn percentages_from_totals(totals: &MacroTotals, basis: Basis, round_to: u32) -> MacroPercentages {
    let (p, c, f) = match basis {
        Basis::Kcal => (totals.proteins * 4.0, totals.carbs * 4.0, totals.fats * 9.0),
        Basis::Grams => (totals.proteins, totals.carbs, totals.fats),
    };

    let denom = p + c + f;
    if denom <= 0.0 {
        return MacroPercentages {
            protein_pct: 0.0,
            carbs_pct: 0.0,
            fat_pct: 0.0,
        };
    }

    let protein_pct = round_to_places(p / denom * 100.0, round_to);
    let carbs_pct = round_to_places(c / denom * 100.0, round_to);
    let fat_pct = round_to_places(100.0 - protein_pct - carbs_pct, round_to);

    MacroPercentages {
        protein_pct,
        carbs_pct,
        fat_pct,
    }
}

/// Compute the per-day calorie series and macro split for
/// `[start_date, end_date]`.
///
/// Every date in the interval appears in the output; days without
/// meal data carry 0.0 calories. The macro split is computed from the
/// range-wide gram totals, not per day.
pub fn daily_calories_and_macro_split<S: MealStore>(
    store: &S,
    start_date: NaiveDate,
    end_date: NaiveDate,
    basis: Basis,
    round_to: u32,
) -> Result<StatsResult, NutritionError> {
    if end_date < start_date {
        return Err(NutritionError::InvalidRange);
    }

    let rows = store.daily_aggregate(start_date, end_date)?;
    let by_day: HashMap<NaiveDate, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.day, i))
        .collect();

    let mut days = Vec::new();
    let mut totals = MacroTotals::zero();

    let mut cursor = start_date;
    while cursor <= end_date {
        let kcal = match by_day.get(&cursor) {
            Some(&i) => {
                let row = &rows[i];
                totals = totals
                    + MacroTotals {
                        kcal: row.kcal,
                        proteins: row.protein_g,
                        carbs: row.carbs_g,
                        fats: row.fat_g,
                    };
                row.kcal
            }
            None => 0.0,
        };
        days.push(DayCalories {
            day: cursor,
            calories: round_to_places(kcal, round_to),
        });
        cursor += Duration::days(1);
    }

    let macro_pct = percentages_from_totals(&totals, basis, round_to);

    Ok(StatsResult {
        days,
        macro_pct,
        basis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::store::testing::VecStore;
    use crate::nutrition::store::DailyAggregateRow;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_day_store() -> VecStore {
        VecStore {
            rows: vec![
                DailyAggregateRow {
                    day: day(2025, 8, 28),
                    kcal: 600.0,
                    protein_g: 40.0,
                    carbs_g: 50.0,
                    fat_g: 20.0,
                },
                DailyAggregateRow {
                    day: day(2025, 8, 30),
                    kcal: 900.0,
                    protein_g: 60.0,
                    carbs_g: 70.0,
                    fat_g: 30.0,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_fills_gap_days() {
        let store = two_day_store();
        let result = daily_calories_and_macro_split(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            Basis::Kcal,
            1,
        )
        .unwrap();

        assert_eq!(result.days.len(), 3);
        assert_eq!(result.days[0].day, day(2025, 8, 28));
        assert!((result.days[0].calories - 600.0).abs() < 0.001);
        assert_eq!(result.days[1].day, day(2025, 8, 29));
        assert!((result.days[1].calories - 0.0).abs() < 0.001);
        assert_eq!(result.days[2].day, day(2025, 8, 30));
        assert!((result.days[2].calories - 900.0).abs() < 0.001);
    }

    #[test]
    fn test_kcal_basis_split() {
        // Protein 100g * 4 = 400, carbs 120g * 4 = 480, fat 50g * 9 = 450
        // denominator 1330
        let store = two_day_store();
        let result = daily_calories_and_macro_split(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            Basis::Kcal,
            1,
        )
        .unwrap();

        assert!((result.macro_pct.protein_pct - 30.1).abs() < 0.001);
        assert!((result.macro_pct.carbs_pct - 36.1).abs() < 0.001);
        assert!((result.macro_pct.fat_pct - 33.8).abs() < 0.001);
    }

    #[test]
    fn test_grams_basis_split() {
        // Protein 100g, carbs 120g, fat 50g over 270g total
        let store = two_day_store();
        let result = daily_calories_and_macro_split(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            Basis::Grams,
            1,
        )
        .unwrap();

        assert!((result.macro_pct.protein_pct - 37.0).abs() < 0.001);
        assert!((result.macro_pct.carbs_pct - 44.4).abs() < 0.001);
        assert!((result.macro_pct.fat_pct - 18.6).abs() < 0.001);
    }

    #[test]
    fn test_percentages_sum_to_exactly_one_hundred() {
        let store = two_day_store();
        for basis in [Basis::Kcal, Basis::Grams] {
            let result = daily_calories_and_macro_split(
                &store,
                day(2025, 8, 28),
                day(2025, 8, 30),
                basis,
                1,
            )
            .unwrap();
            let sum = result.macro_pct.protein_pct
                + result.macro_pct.carbs_pct
                + result.macro_pct.fat_pct;
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_store_yields_zeros() {
        let store = VecStore::default();
        let result = daily_calories_and_macro_split(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 30),
            Basis::Kcal,
            1,
        )
        .unwrap();

        assert_eq!(result.days.len(), 3);
        assert!(result.days.iter().all(|d| d.calories == 0.0));
        assert_eq!(result.macro_pct.protein_pct, 0.0);
        assert_eq!(result.macro_pct.carbs_pct, 0.0);
        assert_eq!(result.macro_pct.fat_pct, 0.0);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let store = VecStore::default();
        assert!(matches!(
            daily_calories_and_macro_split(
                &store,
                day(2025, 8, 30),
                day(2025, 8, 28),
                Basis::Kcal,
                1,
            ),
            Err(NutritionError::InvalidRange)
        ));
    }

    #[test]
    fn test_basis_from_str() {
        assert_eq!(Basis::from_str("kcal"), Some(Basis::Kcal));
        assert_eq!(Basis::from_str("GRAMS"), Some(Basis::Grams));
        assert_eq!(Basis::from_str("joules"), None);
    }

    #[test]
    fn test_rounding_respects_round_to() {
        let store = VecStore {
            rows: vec![DailyAggregateRow {
                day: day(2025, 8, 28),
                kcal: 123.456,
                protein_g: 10.0,
                carbs_g: 10.0,
                fat_g: 10.0,
            }],
            ..Default::default()
        };
        let result = daily_calories_and_macro_split(
            &store,
            day(2025, 8, 28),
            day(2025, 8, 28),
            Basis::Kcal,
            2,
        )
        .unwrap();
        assert!((result.days[0].calories - 123.46).abs() < 1e-9);
    }
}
