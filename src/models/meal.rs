//! Meal model
//!
//! A logged meal with its ingredient entries eager-loaded.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{Ingredient, MacroTotals};

/// One ingredient quantity within a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub ingredient: Ingredient,
    pub quantity_g: f64,
}

impl MealEntry {
    /// Nutrient contribution of this entry (per-100g values weighted by grams)
    pub fn macros(&self) -> MacroTotals {
        self.ingredient.per_100g().scale(self.quantity_g / 100.0)
    }
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub eaten_at: DateTime<Utc>,
    pub is_favorite: bool,
    /// Derived calorie total, None when the meal has no entries
    pub kcal: Option<f64>,
    pub entries: Vec<MealEntry>,
}

/// Input for one meal entry when creating or replacing entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntryInput {
    pub ingredient_id: i64,
    pub grams: f64,
}

/// Parse a stored timestamp, treating zone-less values as UTC
pub(crate) fn parse_utc_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Format a timestamp for storage (RFC 3339 UTC, second precision)
pub(crate) fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a timestamp for SQLite datetime() comparisons
fn format_sql_bound(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

const SELECT_MEAL: &str = r#"
    SELECT m.id, m.name, m.eaten_at,
           EXISTS(SELECT 1 FROM favorite_meals f WHERE f.meal_id = m.id) AS is_favorite
    FROM meals m
"#;

impl Meal {
    /// Create a Meal from a database row (entries loaded separately)
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get("eaten_at")?;
        let eaten_at = parse_utc_timestamp(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("invalid eaten_at timestamp: {}", raw).into(),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            eaten_at,
            is_favorite: row.get("is_favorite")?,
            kcal: None,
            entries: Vec::new(),
        })
    }

    fn with_entries(mut self, entries: Vec<MealEntry>) -> Self {
        self.kcal = if entries.is_empty() {
            None
        } else {
            let totals: MacroTotals = entries.iter().map(|e| e.macros()).sum();
            Some(totals.kcal)
        };
        self.entries = entries;
        self
    }

    fn load_entries(conn: &Connection, meal_id: i64) -> DbResult<Vec<MealEntry>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id AS entry_id, e.grams, i.*
            FROM meal_entries e
            INNER JOIN ingredients i ON i.id = e.ingredient_id
            WHERE e.meal_id = ?1
            ORDER BY e.id ASC
            "#,
        )?;

        let entries = stmt
            .query_map([meal_id], |row| {
                Ok(MealEntry {
                    id: row.get("entry_id")?,
                    ingredient: Ingredient::from_row(row)?,
                    quantity_g: row.get("grams")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Insert a new meal with its entries in one transaction
    pub fn create(
        conn: &mut Connection,
        name: &str,
        eaten_at: DateTime<Utc>,
        entries: &[MealEntryInput],
    ) -> DbResult<Self> {
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO meals (name, eaten_at) VALUES (?1, ?2)",
            params![name, format_utc(eaten_at)],
        )?;
        let id = tx.last_insert_rowid();

        for entry in entries {
            tx.execute(
                "INSERT INTO meal_entries (meal_id, ingredient_id, grams) VALUES (?1, ?2, ?3)",
                params![id, entry.ingredient_id, entry.grams],
            )?;
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal by ID with entries eager-loaded
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let sql = format!("{} WHERE m.id = ?1", SELECT_MEAL);
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row([id], Self::from_row);
        let meal = match result {
            Ok(meal) => meal,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entries = Self::load_entries(conn, id)?;
        Ok(Some(meal.with_entries(entries)))
    }

    /// Search meals by name, most recently eaten first
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let sql = format!(
            "{} WHERE m.name LIKE ?1 ORDER BY datetime(m.eaten_at) DESC LIMIT ?2",
            SELECT_MEAL
        );
        let mut stmt = conn.prepare(&sql)?;

        let meals = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        meals
            .into_iter()
            .map(|m| {
                let entries = Self::load_entries(conn, m.id)?;
                Ok(m.with_entries(entries))
            })
            .collect()
    }

    /// List meals with `eaten_at` inside the inclusive UTC bounds,
    /// entries eager-loaded, ordered by eaten_at ascending
    pub fn list_between(
        conn: &Connection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Self>> {
        // datetime() normalizes both RFC 3339 and space-separated timestamps
        let sql = format!(
            "{} WHERE datetime(m.eaten_at) >= datetime(?1) AND datetime(m.eaten_at) <= datetime(?2) \
             ORDER BY datetime(m.eaten_at) ASC",
            SELECT_MEAL
        );
        let mut stmt = conn.prepare(&sql)?;

        let meals = stmt
            .query_map(
                params![format_sql_bound(start), format_sql_bound(end)],
                Self::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        meals
            .into_iter()
            .map(|m| {
                let entries = Self::load_entries(conn, m.id)?;
                Ok(m.with_entries(entries))
            })
            .collect()
    }

    /// Replace a meal's name, timestamp and entries in one transaction
    ///
    /// Entries are replaced wholesale; partial entry edits go through the
    /// entry-level operations instead.
    pub fn update(
        conn: &mut Connection,
        id: i64,
        name: &str,
        eaten_at: DateTime<Utc>,
        entries: &[MealEntryInput],
    ) -> DbResult<Option<Self>> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(None);
        }

        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE meals SET name = ?1, eaten_at = ?2, updated_at = datetime('now') WHERE id = ?3",
            params![name, format_utc(eaten_at), id],
        )?;
        tx.execute("DELETE FROM meal_entries WHERE meal_id = ?1", [id])?;

        for entry in entries {
            tx.execute(
                "INSERT INTO meal_entries (meal_id, ingredient_id, grams) VALUES (?1, ?2, ?3)",
                params![id, entry.ingredient_id, entry.grams],
            )?;
        }

        tx.commit()?;

        Self::get_by_id(conn, id)
    }

    /// Delete a meal (entries cascade)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Change one entry's quantity
    /// Returns Ok(false) when the entry does not belong to the meal
    pub fn update_entry_quantity(
        conn: &Connection,
        meal_id: i64,
        entry_id: i64,
        grams: f64,
    ) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE meal_entries SET grams = ?1 WHERE id = ?2 AND meal_id = ?3",
            params![grams, entry_id, meal_id],
        )?;
        Ok(rows > 0)
    }

    /// Point one entry at a different ingredient
    /// Returns Ok(false) when the entry does not belong to the meal
    pub fn update_entry_ingredient(
        conn: &Connection,
        meal_id: i64,
        entry_id: i64,
        ingredient_id: i64,
    ) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE meal_entries SET ingredient_id = ?1 WHERE id = ?2 AND meal_id = ?3",
            params![ingredient_id, entry_id, meal_id],
        )?;
        Ok(rows > 0)
    }

    /// Remove one entry from a meal
    /// Returns Ok(false) when the entry does not belong to the meal
    pub fn delete_entry(conn: &Connection, meal_id: i64, entry_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM meal_entries WHERE id = ?1 AND meal_id = ?2",
            params![entry_id, meal_id],
        )?;
        Ok(rows > 0)
    }
}
