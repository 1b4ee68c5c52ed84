//! Meal MCP Tools
//!
//! Tools for logging meals and editing their ingredient entries.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::models::{Ingredient, Meal, MealEntryInput};

/// One entry within a meal detail response
#[derive(Debug, Serialize)]
pub struct MealEntryDetail {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub grams: f64,
    pub kcal: f64,
}

/// Full meal detail with entries and derived calories
#[derive(Debug, Serialize)]
pub struct MealDetail {
    pub id: i64,
    pub name: String,
    pub eaten_at: String,
    pub is_favorite: bool,
    pub kcal: Option<f64>,
    pub entries: Vec<MealEntryDetail>,
}

impl MealDetail {
    pub fn from_meal(meal: Meal) -> Self {
        let entries = meal
            .entries
            .iter()
            .map(|e| MealEntryDetail {
                id: e.id,
                ingredient_id: e.ingredient.id,
                ingredient_name: e.ingredient.name.clone(),
                grams: e.quantity_g,
                kcal: e.macros().kcal,
            })
            .collect();

        Self {
            id: meal.id,
            name: meal.name,
            eaten_at: meal.eaten_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            is_favorite: meal.is_favorite,
            kcal: meal.kcal,
            entries,
        }
    }
}

/// Meal summary for search results
#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub id: i64,
    pub name: String,
    pub eaten_at: String,
    pub is_favorite: bool,
    pub kcal: Option<f64>,
    pub entry_count: usize,
}

impl From<&Meal> for MealSummary {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id,
            name: meal.name.clone(),
            eaten_at: meal.eaten_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            is_favorite: meal.is_favorite,
            kcal: meal.kcal,
            entry_count: meal.entries.len(),
        }
    }
}

/// Response for search_meals
#[derive(Debug, Serialize)]
pub struct SearchMealsResponse {
    pub meals: Vec<MealSummary>,
    pub total: usize,
}

/// Response for successful delete_meal
#[derive(Debug, Serialize)]
pub struct DeleteMealSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Parse a caller-supplied timestamp; zone-less values are taken as UTC
fn parse_eaten_at(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!(
        "Invalid eaten_at timestamp: {} (expected RFC 3339, e.g. 2025-08-30T12:00:00Z)",
        text
    ))
}

fn validate_entries(db: &Database, entries: &[MealEntryInput]) -> Result<(), String> {
    if entries.is_empty() {
        return Err("Meal must have at least one entry".to_string());
    }

    for entry in entries {
        if entry.ingredient_id < 1 {
            return Err(format!("Invalid ingredient_id: {}", entry.ingredient_id));
        }
        if entry.grams <= 0.0 {
            return Err(format!(
                "grams must be greater than 0 for ingredient {}",
                entry.ingredient_id
            ));
        }
    }

    let ids: Vec<i64> = entries.iter().map(|e| e.ingredient_id).collect();

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let found = Ingredient::get_many(&conn, &ids)
        .map_err(|e| format!("Database error checking ingredients: {}", e))?;

    for id in &ids {
        if !found.contains_key(id) {
            return Err(format!("Ingredient not found with id: {}", id));
        }
    }

    Ok(())
}

/// Log a new meal with its ingredient entries
///
/// `eaten_at` defaults to the current time when omitted.
pub fn log_meal(
    db: &Database,
    name: &str,
    eaten_at: Option<&str>,
    entries: &[MealEntryInput],
) -> Result<MealDetail, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Meal name cannot be empty".to_string());
    }

    let eaten_at = match eaten_at {
        Some(text) => parse_eaten_at(text)?,
        None => Utc::now(),
    };

    validate_entries(db, entries)?;

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meal = Meal::create(&mut conn, name, eaten_at, entries)
        .map_err(|e| format!("Failed to log meal: {}", e))?;

    Ok(MealDetail::from_meal(meal))
}

/// Get a meal by ID with entries and derived calories
pub fn get_meal(db: &Database, id: i64) -> Result<Option<MealDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meal = Meal::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get meal: {}", e))?;

    Ok(meal.map(MealDetail::from_meal))
}

/// Search meals by name, most recently eaten first
pub fn search_meals(db: &Database, query: &str, limit: i64) -> Result<SearchMealsResponse, String> {
    let limit = limit.min(100).max(1);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals = Meal::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<MealSummary> = meals.iter().map(MealSummary::from).collect();
    let total = summaries.len();

    Ok(SearchMealsResponse {
        meals: summaries,
        total,
    })
}

/// Replace a meal's name, timestamp and entries wholesale
pub fn update_meal(
    db: &Database,
    id: i64,
    name: &str,
    eaten_at: &str,
    entries: &[MealEntryInput],
) -> Result<MealDetail, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Meal name cannot be empty".to_string());
    }

    let eaten_at = parse_eaten_at(eaten_at)?;
    validate_entries(db, entries)?;

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Meal::update(&mut conn, id, name, eaten_at, entries)
        .map_err(|e| format!("Failed to update meal: {}", e))?;

    match updated {
        Some(meal) => Ok(MealDetail::from_meal(meal)),
        None => Err(format!("Meal not found with id: {}", id)),
    }
}

/// Delete a meal (entries cascade, any favorite star is removed)
pub fn delete_meal(db: &Database, id: i64) -> Result<DeleteMealSuccessResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Meal::delete(&conn, id)
        .map_err(|e| format!("Failed to delete meal: {}", e))?;

    if !deleted {
        return Err(format!("Meal not found with id: {}", id));
    }

    Ok(DeleteMealSuccessResponse {
        success: true,
        deleted_id: id,
    })
}

/// Change one entry's quantity, returning the meal with recomputed calories
pub fn update_meal_entry_quantity(
    db: &Database,
    meal_id: i64,
    entry_id: i64,
    grams: f64,
) -> Result<MealDetail, String> {
    if grams <= 0.0 {
        return Err("grams must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let changed = Meal::update_entry_quantity(&conn, meal_id, entry_id, grams)
        .map_err(|e| format!("Failed to update entry: {}", e))?;
    if !changed {
        return Err(format!("Entry {} not found in meal {}", entry_id, meal_id));
    }

    reload_meal(&conn, meal_id)
}

/// Point one entry at a different ingredient, returning the meal with
/// recomputed calories
pub fn update_meal_entry_ingredient(
    db: &Database,
    meal_id: i64,
    entry_id: i64,
    ingredient_id: i64,
) -> Result<MealDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::get_by_id(&conn, ingredient_id)
        .map_err(|e| format!("Database error checking ingredient: {}", e))?;
    if ingredient.is_none() {
        return Err(format!("Ingredient not found with id: {}", ingredient_id));
    }

    let changed = Meal::update_entry_ingredient(&conn, meal_id, entry_id, ingredient_id)
        .map_err(|e| format!("Failed to update entry: {}", e))?;
    if !changed {
        return Err(format!("Entry {} not found in meal {}", entry_id, meal_id));
    }

    reload_meal(&conn, meal_id)
}

/// Remove one entry from a meal, returning the meal with recomputed calories
pub fn remove_meal_entry(
    db: &Database,
    meal_id: i64,
    entry_id: i64,
) -> Result<MealDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Meal::delete_entry(&conn, meal_id, entry_id)
        .map_err(|e| format!("Failed to remove entry: {}", e))?;
    if !deleted {
        return Err(format!("Entry {} not found in meal {}", entry_id, meal_id));
    }

    reload_meal(&conn, meal_id)
}

fn reload_meal(conn: &rusqlite::Connection, meal_id: i64) -> Result<MealDetail, String> {
    let meal = Meal::get_by_id(conn, meal_id)
        .map_err(|e| format!("Failed to reload meal: {}", e))?
        .ok_or_else(|| format!("Meal not found with id: {}", meal_id))?;

    Ok(MealDetail::from_meal(meal))
}
