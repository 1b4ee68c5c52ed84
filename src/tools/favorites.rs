//! Favorite Meal MCP Tools
//!
//! Tools for starring meals and searching the favorites list.

use serde::Serialize;

use crate::db::Database;
use crate::models::{FavoriteMeal, Meal};

/// Response for star_meal
#[derive(Debug, Serialize)]
pub struct StarMealResponse {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
    pub starred_at: String,
}

/// Response for unstar_meal
#[derive(Debug, Serialize)]
pub struct UnstarMealResponse {
    pub success: bool,
    pub meal_id: i64,
}

/// Favorite summary for list/search results
#[derive(Debug, Serialize)]
pub struct FavoriteSummary {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
    pub starred_at: String,
}

impl From<&FavoriteMeal> for FavoriteSummary {
    fn from(fav: &FavoriteMeal) -> Self {
        Self {
            id: fav.id,
            meal_id: fav.meal_id,
            name: fav.name.clone(),
            starred_at: fav.starred_at.clone(),
        }
    }
}

/// Response for list_favorites and search_favorites
#[derive(Debug, Serialize)]
pub struct ListFavoritesResponse {
    pub favorites: Vec<FavoriteSummary>,
    pub total: usize,
}

/// Full favorite detail with the starred meal's derived calories
#[derive(Debug, Serialize)]
pub struct FavoriteDetail {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
    pub starred_at: String,
    pub kcal: Option<f64>,
    pub entry_count: usize,
}

/// Star a meal
pub fn star_meal(db: &Database, meal_id: i64) -> Result<StarMealResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meal = Meal::get_by_id(&conn, meal_id)
        .map_err(|e| format!("Database error checking meal: {}", e))?;
    let meal = match meal {
        Some(m) => m,
        None => return Err(format!("Meal not found with id: {}", meal_id)),
    };

    let existing = FavoriteMeal::get_by_meal_id(&conn, meal_id)
        .map_err(|e| format!("Database error checking favorites: {}", e))?;
    if existing.is_some() {
        return Err(format!("Meal {} is already starred", meal_id));
    }

    let fav = FavoriteMeal::create(&conn, meal_id, &meal.name)
        .map_err(|e| format!("Failed to star meal: {}", e))?;

    Ok(StarMealResponse {
        id: fav.id,
        meal_id: fav.meal_id,
        name: fav.name,
        starred_at: fav.starred_at,
    })
}

/// Unstar a meal
pub fn unstar_meal(db: &Database, meal_id: i64) -> Result<UnstarMealResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let fav = FavoriteMeal::get_by_meal_id(&conn, meal_id)
        .map_err(|e| format!("Database error checking favorites: {}", e))?;
    let fav = match fav {
        Some(f) => f,
        None => return Err(format!("Meal {} is not starred", meal_id)),
    };

    FavoriteMeal::delete(&conn, fav.id)
        .map_err(|e| format!("Failed to unstar meal: {}", e))?;

    Ok(UnstarMealResponse {
        success: true,
        meal_id,
    })
}

/// Get a favorite by ID with the starred meal's derived calories
pub fn get_favorite_meal(db: &Database, id: i64) -> Result<Option<FavoriteDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let fav = FavoriteMeal::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get favorite: {}", e))?;

    match fav {
        Some(fav) => {
            let meal = Meal::get_by_id(&conn, fav.meal_id)
                .map_err(|e| format!("Failed to get starred meal: {}", e))?;

            let (kcal, entry_count) = match meal {
                Some(meal) => (meal.kcal, meal.entries.len()),
                None => (None, 0),
            };

            Ok(Some(FavoriteDetail {
                id: fav.id,
                meal_id: fav.meal_id,
                name: fav.name,
                starred_at: fav.starred_at,
                kcal,
                entry_count,
            }))
        }
        None => Ok(None),
    }
}

/// List favorites, most recently starred first
pub fn list_favorites(db: &Database, limit: i64) -> Result<ListFavoritesResponse, String> {
    let limit = limit.min(500).max(1);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let favorites = FavoriteMeal::list_recent(&conn, limit)
        .map_err(|e| format!("Failed to list favorites: {}", e))?;

    let summaries: Vec<FavoriteSummary> = favorites.iter().map(FavoriteSummary::from).collect();
    let total = summaries.len();

    Ok(ListFavoritesResponse {
        favorites: summaries,
        total,
    })
}

/// Search favorites by name
pub fn search_favorites(
    db: &Database,
    query: &str,
    limit: i64,
) -> Result<ListFavoritesResponse, String> {
    if query.trim().is_empty() {
        return Err("Search query cannot be empty".to_string());
    }
    let limit = limit.min(500).max(1);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let favorites = FavoriteMeal::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<FavoriteSummary> = favorites.iter().map(FavoriteSummary::from).collect();
    let total = summaries.len();

    Ok(ListFavoritesResponse {
        favorites: summaries,
        total,
    })
}
