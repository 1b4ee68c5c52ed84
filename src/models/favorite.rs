//! Favorite meal model
//!
//! A starred meal; at most one star per meal, enforced by a UNIQUE
//! constraint. The meal name is denormalized for fast favorite search.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A starred meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteMeal {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
    pub starred_at: String,
}

impl FavoriteMeal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            meal_id: row.get("meal_id")?,
            name: row.get("name")?,
            starred_at: row.get("starred_at")?,
        })
    }

    /// Star a meal
    pub fn create(conn: &Connection, meal_id: i64, name: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO favorite_meals (meal_id, name) VALUES (?1, ?2)",
            params![meal_id, name],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a favorite by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM favorite_meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(fav) => Ok(Some(fav)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the favorite row for a meal, if any
    pub fn get_by_meal_id(conn: &Connection, meal_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM favorite_meals WHERE meal_id = ?1")?;

        let result = stmt.query_row([meal_id], Self::from_row);
        match result {
            Ok(fav) => Ok(Some(fav)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List favorites, most recently starred first
    pub fn list_recent(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM favorite_meals ORDER BY starred_at DESC, id DESC LIMIT ?1",
        )?;

        let favorites = stmt
            .query_map([limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    /// Search favorites by name (case-insensitive substring match),
    /// most recently starred first
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM favorite_meals
            WHERE name LIKE ?1
            ORDER BY starred_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let favorites = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    /// Unstar (delete) a favorite
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM favorite_meals WHERE id = ?1", [id])?;
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

    fn seed_meal(conn: &Connection, name: &str) -> i64 {
        conn.execute(
            "INSERT INTO meals (name, eaten_at) VALUES (?1, '2025-08-30T12:00:00Z')",
            [name],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_star_and_fetch() {
        let conn = test_conn();
        let meal_id = seed_meal(&conn, "Pasta night");

        let fav = FavoriteMeal::create(&conn, meal_id, "Pasta night").unwrap();
        assert_eq!(fav.meal_id, meal_id);

        let by_meal = FavoriteMeal::get_by_meal_id(&conn, meal_id).unwrap().unwrap();
        assert_eq!(by_meal.id, fav.id);
    }

    #[test]
    fn test_double_star_is_rejected() {
        let conn = test_conn();
        let meal_id = seed_meal(&conn, "Pasta night");

        FavoriteMeal::create(&conn, meal_id, "Pasta night").unwrap();
        assert!(FavoriteMeal::create(&conn, meal_id, "Pasta night").is_err());
    }

    #[test]
    fn test_search_matches_denormalized_name() {
        let conn = test_conn();
        let a = seed_meal(&conn, "Pasta night");
        let b = seed_meal(&conn, "Taco tuesday");

        FavoriteMeal::create(&conn, a, "Pasta night").unwrap();
        FavoriteMeal::create(&conn, b, "Taco tuesday").unwrap();

        let found = FavoriteMeal::search(&conn, "pasta", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meal_id, a);
    }

    #[test]
    fn test_unstar() {
        let conn = test_conn();
        let meal_id = seed_meal(&conn, "Pasta night");
        let fav = FavoriteMeal::create(&conn, meal_id, "Pasta night").unwrap();

        assert!(FavoriteMeal::delete(&conn, fav.id).unwrap());
        assert!(!FavoriteMeal::delete(&conn, fav.id).unwrap());
        assert!(FavoriteMeal::get_by_meal_id(&conn, meal_id).unwrap().is_none());
    }
}
