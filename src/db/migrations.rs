//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Nutrient reference data, all values per 100 g
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK(length(name) <= 512),
            kcal_per_100g REAL NOT NULL DEFAULT 0 CHECK(kcal_per_100g >= 0),
            carbs_per_100g REAL NOT NULL DEFAULT 0 CHECK(carbs_per_100g >= 0),
            fats_per_100g REAL NOT NULL DEFAULT 0 CHECK(fats_per_100g >= 0),
            proteins_per_100g REAL NOT NULL DEFAULT 0 CHECK(proteins_per_100g >= 0),

            -- Metadata
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);

        -- ============================================
        -- MEALS
        -- One logged meal, entries attached separately
        -- ============================================
        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK(length(name) <= 512),
            eaten_at TEXT NOT NULL,              -- RFC 3339 UTC: "2025-08-30T12:15:00Z"

            -- Metadata
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meals_name ON meals(name);
        CREATE INDEX idx_meals_eaten_at ON meals(eaten_at);

        -- ============================================
        -- MEAL ENTRIES
        -- Ingredient quantities making up a meal
        -- ============================================
        CREATE TABLE meal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            grams REAL NOT NULL CHECK(grams > 0)
        );

        CREATE INDEX idx_meal_entries_meal ON meal_entries(meal_id);
        CREATE INDEX idx_meal_entries_ingredient ON meal_entries(ingredient_id);

        -- ============================================
        -- FAVORITE MEALS
        -- Starred meals, at most one star per meal
        -- ============================================
        CREATE TABLE favorite_meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL UNIQUE REFERENCES meals(id) ON DELETE CASCADE,
            name TEXT NOT NULL,                  -- denormalized meal name for fast search
            starred_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_favorite_meals_name ON favorite_meals(name);
        CREATE INDEX idx_favorite_meals_starred_at ON favorite_meals(starred_at);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
