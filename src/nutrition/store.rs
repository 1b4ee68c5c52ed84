//! Meal store seam
//!
//! The aggregation core reads meal data through the `MealStore` trait so
//! the statistics and history functions never touch SQL directly. The
//! pooled `Database` handle is the production implementation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::db::{Database, DbError, DbResult};
use crate::models::Meal;

/// One day's grams-weighted nutrient sums, keyed by the stored UTC date
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregateRow {
    pub day: NaiveDate,
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Read access to meal data for the aggregation core
pub trait MealStore {
    /// One row per day in `[start_date, end_date]` that has at least one
    /// meal entry. Days without data are absent; the caller zero-fills.
    fn daily_aggregate(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyAggregateRow>, DbError>;

    /// Meals with `eaten_at` inside the inclusive UTC bounds, entries
    /// eager-loaded and derived kcal populated where computable.
    fn meals_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meal>, DbError>;
}

/// Run the daily aggregate query on one connection.
///
/// Filters on the raw timestamps with a half-open upper bound, then
/// groups by the stored UTC date. Each entry contributes
/// per-100g value * grams / 100.
pub(crate) fn daily_aggregate_query(
    conn: &Connection,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> DbResult<Vec<DailyAggregateRow>> {
    let start = start_date.format("%Y-%m-%d 00:00:00").to_string();
    let end_excl = (end_date + Duration::days(1))
        .format("%Y-%m-%d 00:00:00")
        .to_string();

    let mut stmt = conn.prepare(
        r#"
        SELECT date(m.eaten_at) AS day,
               SUM(i.kcal_per_100g * (e.grams / 100.0)) AS kcal,
               SUM(i.proteins_per_100g * (e.grams / 100.0)) AS protein_g,
               SUM(i.carbs_per_100g * (e.grams / 100.0)) AS carbs_g,
               SUM(i.fats_per_100g * (e.grams / 100.0)) AS fat_g
        FROM meals m
        INNER JOIN meal_entries e ON e.meal_id = m.id
        INNER JOIN ingredients i ON i.id = e.ingredient_id
        WHERE datetime(m.eaten_at) >= datetime(?1)
          AND datetime(m.eaten_at) < datetime(?2)
        GROUP BY date(m.eaten_at)
        ORDER BY day ASC
        "#,
    )?;

    let rows = stmt
        .query_map(params![start, end_excl], |row| {
            let raw: String = row.get("day")?;
            let day = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(DailyAggregateRow {
                day,
                kcal: row.get("kcal")?,
                protein_g: row.get("protein_g")?,
                carbs_g: row.get("carbs_g")?,
                fat_g: row.get("fat_g")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

impl MealStore for Database {
    fn daily_aggregate(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyAggregateRow>, DbError> {
        self.with_conn(|conn| daily_aggregate_query(conn, start_date, end_date))
    }

    fn meals_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meal>, DbError> {
        self.with_conn(|conn| Meal::list_between(conn, start, end))
    }
}

/// Vector-backed store for exercising the aggregation core in tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Default)]
    pub struct VecStore {
        pub rows: Vec<DailyAggregateRow>,
        pub meals: Vec<Meal>,
    }

    impl MealStore for VecStore {
        fn daily_aggregate(
            &self,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> Result<Vec<DailyAggregateRow>, DbError> {
            Ok(self
                .rows
                .iter()
                .filter(|r| r.day >= start_date && r.day <= end_date)
                .cloned()
                .collect())
        }

        fn meals_in_range(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Meal>, DbError> {
            let mut meals: Vec<Meal> = self
                .meals
                .iter()
                .filter(|m| m.eaten_at >= start && m.eaten_at <= end)
                .cloned()
                .collect();
            meals.sort_by_key(|m| m.eaten_at);
            Ok(meals)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use crate::models::{Ingredient, IngredientCreate, MealEntryInput};
    use chrono::TimeZone;

    // The SQL aggregate is exercised against a raw in-memory connection
    // since pooled in-memory databases are not shared between connections.
    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn seed_rice(conn: &Connection) -> Ingredient {
        Ingredient::create(
            conn,
            &IngredientCreate {
                name: "Rice".to_string(),
                kcal_per_100g: 130.0,
                carbs_per_100g: 28.0,
                fats_per_100g: 0.3,
                proteins_per_100g: 2.7,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_daily_aggregate_arithmetic_and_grouping() {
        let mut conn = test_conn();
        let rice = seed_rice(&conn);

        // Two meals on the 28th, one on the 30th, nothing on the 29th
        for (name, day, hour, grams) in [
            ("Breakfast", 28, 8, 100.0),
            ("Dinner", 28, 19, 200.0),
            ("Lunch", 30, 12, 50.0),
        ] {
            Meal::create(
                &mut conn,
                name,
                Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0).unwrap(),
                &[MealEntryInput {
                    ingredient_id: rice.id,
                    grams,
                }],
            )
            .unwrap();
        }

        let rows = daily_aggregate_query(
            &conn,
            NaiveDate::from_ymd_opt(2025, 8, 28).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].day, NaiveDate::from_ymd_opt(2025, 8, 28).unwrap());
        // 130 * (100/100) + 130 * (200/100) = 390
        assert!((rows[0].kcal - 390.0).abs() < 0.001);
        assert!((rows[0].carbs_g - 84.0).abs() < 0.001);

        assert_eq!(rows[1].day, NaiveDate::from_ymd_opt(2025, 8, 30).unwrap());
        assert!((rows[1].kcal - 65.0).abs() < 0.001);
    }

    #[test]
    fn test_daily_aggregate_upper_bound_excludes_next_day() {
        let mut conn = test_conn();
        let rice = seed_rice(&conn);

        Meal::create(
            &mut conn,
            "Midnight snack",
            Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap(),
            &[MealEntryInput {
                ingredient_id: rice.id,
                grams: 100.0,
            }],
        )
        .unwrap();
        Meal::create(
            &mut conn,
            "Late dinner",
            Utc.with_ymd_and_hms(2025, 8, 30, 23, 59, 59).unwrap(),
            &[MealEntryInput {
                ingredient_id: rice.id,
                grams: 100.0,
            }],
        )
        .unwrap();

        let rows = daily_aggregate_query(
            &conn,
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day, NaiveDate::from_ymd_opt(2025, 8, 30).unwrap());
        assert!((rows[0].kcal - 130.0).abs() < 0.001);
    }

    #[test]
    fn test_meals_without_entries_do_not_aggregate() {
        let mut conn = test_conn();
        seed_rice(&conn);

        Meal::create(
            &mut conn,
            "Black coffee",
            Utc.with_ymd_and_hms(2025, 8, 30, 7, 0, 0).unwrap(),
            &[],
        )
        .unwrap();

        let rows = daily_aggregate_query(
            &conn,
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
        )
        .unwrap();

        assert!(rows.is_empty());
    }
}
