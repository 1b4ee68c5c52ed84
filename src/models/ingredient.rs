//! Ingredient model
//!
//! Nutrient reference data for one ingredient, all values per 100 g.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::MacroTotals;

/// An ingredient with per-100g nutrient values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub kcal_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fats_per_100g: f64,
    pub proteins_per_100g: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub kcal_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fats_per_100g: f64,
    pub proteins_per_100g: f64,
}

/// Data for replacing an ingredient's fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: String,
    pub kcal_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fats_per_100g: f64,
    pub proteins_per_100g: f64,
}

impl Ingredient {
    /// Per-100g nutrient values as macro totals
    pub fn per_100g(&self) -> MacroTotals {
        MacroTotals {
            kcal: self.kcal_per_100g,
            proteins: self.proteins_per_100g,
            carbs: self.carbs_per_100g,
            fats: self.fats_per_100g,
        }
    }

    /// Create an Ingredient from a database row
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            kcal_per_100g: row.get("kcal_per_100g")?,
            carbs_per_100g: row.get("carbs_per_100g")?,
            fats_per_100g: row.get("fats_per_100g")?,
            proteins_per_100g: row.get("proteins_per_100g")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new ingredient into the database
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO ingredients (
                name, kcal_per_100g, carbs_per_100g, fats_per_100g, proteins_per_100g
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.name,
                data.kcal_per_100g,
                data.carbs_per_100g,
                data.fats_per_100g,
                data.proteins_per_100g,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM ingredients WHERE id = ?1"
        )?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Bulk fetch ingredients by ID, keyed by ID
    ///
    /// Missing IDs are simply absent from the map; the caller decides
    /// whether that is an error.
    pub fn get_many(conn: &Connection, ids: &[i64]) -> DbResult<HashMap<i64, Self>> {
        let mut map = HashMap::with_capacity(ids.len());
        if ids.is_empty() {
            return Ok(map);
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT * FROM ingredients WHERE id IN ({})", placeholders);

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        let items = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for item in items {
            map.insert(item.id, item);
        }
        Ok(map)
    }

    /// Search ingredients by name (case-insensitive substring match)
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM ingredients
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#
        )?;

        let items = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Replace an ingredient's fields
    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
        let rows = conn.execute(
            r#"
            UPDATE ingredients
            SET name = ?1, kcal_per_100g = ?2, carbs_per_100g = ?3,
                fats_per_100g = ?4, proteins_per_100g = ?5,
                updated_at = datetime('now')
            WHERE id = ?6
            "#,
            params![
                data.name,
                data.kcal_per_100g,
                data.carbs_per_100g,
                data.fats_per_100g,
                data.proteins_per_100g,
                id,
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        Self::get_by_id(conn, id)
    }

    /// Get the count of meal entries referencing this ingredient
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meal_entries WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an ingredient (blocked by FK if referenced by meal entries)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn chicken() -> IngredientCreate {
        IngredientCreate {
            name: "Chicken breast".to_string(),
            kcal_per_100g: 165.0,
            carbs_per_100g: 0.0,
            fats_per_100g: 3.6,
            proteins_per_100g: 31.0,
        }
    }

    #[test]
    fn test_create_and_get() {
        let conn = test_conn();
        let created = Ingredient::create(&conn, &chicken()).unwrap();
        assert!(created.id > 0);

        let fetched = Ingredient::get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Chicken breast");
        assert!((fetched.proteins_per_100g - 31.0).abs() < 0.001);
    }

    #[test]
    fn test_get_missing_is_none() {
        let conn = test_conn();
        assert!(Ingredient::get_by_id(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_get_many_skips_missing() {
        let conn = test_conn();
        let a = Ingredient::create(&conn, &chicken()).unwrap();

        let map = Ingredient::get_many(&conn, &[a.id, 999]).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&a.id));
    }

    #[test]
    fn test_search_case_insensitive() {
        let conn = test_conn();
        Ingredient::create(&conn, &chicken()).unwrap();

        let found = Ingredient::search(&conn, "chick", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Chicken breast");
    }

    #[test]
    fn test_update_replaces_fields() {
        let conn = test_conn();
        let created = Ingredient::create(&conn, &chicken()).unwrap();

        let updated = Ingredient::update(
            &conn,
            created.id,
            &IngredientUpdate {
                name: "Chicken thigh".to_string(),
                kcal_per_100g: 209.0,
                carbs_per_100g: 0.0,
                fats_per_100g: 10.9,
                proteins_per_100g: 26.0,
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(updated.name, "Chicken thigh");
        assert!((updated.kcal_per_100g - 209.0).abs() < 0.001);
    }

    #[test]
    fn test_delete() {
        let conn = test_conn();
        let created = Ingredient::create(&conn, &chicken()).unwrap();

        assert!(Ingredient::delete(&conn, created.id).unwrap());
        assert!(!Ingredient::delete(&conn, created.id).unwrap());
        assert!(Ingredient::get_by_id(&conn, created.id).unwrap().is_none());
    }
}
