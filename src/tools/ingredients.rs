//! Ingredient MCP Tools
//!
//! Tools for managing the ingredient catalog.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Ingredient, IngredientCreate, IngredientUpdate};

/// Response for add_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Summary of an ingredient for search results
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: i64,
    pub name: String,
    pub kcal_per_100g: f64,
    pub proteins_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fats_per_100g: f64,
}

impl From<&Ingredient> for IngredientSummary {
    fn from(item: &Ingredient) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            kcal_per_100g: item.kcal_per_100g,
            proteins_per_100g: item.proteins_per_100g,
            carbs_per_100g: item.carbs_per_100g,
            fats_per_100g: item.fats_per_100g,
        }
    }
}

/// Response for search_ingredients
#[derive(Debug, Serialize)]
pub struct SearchIngredientsResponse {
    pub items: Vec<IngredientSummary>,
    pub total: usize,
}

/// Full ingredient detail response
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    pub id: i64,
    pub name: String,
    pub kcal_per_100g: f64,
    pub proteins_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fats_per_100g: f64,
    pub created_at: String,
    pub updated_at: String,
    pub usage_count: i64,
}

/// Response for update_ingredient
#[derive(Debug, Serialize)]
pub struct UpdateIngredientResponse {
    pub success: bool,
    pub updated_at: String,
}

/// Response for delete_ingredient blocked
#[derive(Debug, Serialize)]
pub struct DeleteIngredientBlockedResponse {
    pub error: String,
    pub usage_count: i64,
}

/// Response for successful delete_ingredient
#[derive(Debug, Serialize)]
pub struct DeleteIngredientSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_per_100g(data: &IngredientCreate) -> Result<(), String> {
    if data.name.trim().is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }
    if data.kcal_per_100g < 0.0 {
        return Err("kcal_per_100g cannot be negative".to_string());
    }
    if data.proteins_per_100g < 0.0 {
        return Err("proteins_per_100g cannot be negative".to_string());
    }
    if data.carbs_per_100g < 0.0 {
        return Err("carbs_per_100g cannot be negative".to_string());
    }
    if data.fats_per_100g < 0.0 {
        return Err("fats_per_100g cannot be negative".to_string());
    }
    Ok(())
}

/// Add a new ingredient
pub fn add_ingredient(db: &Database, data: IngredientCreate) -> Result<AddIngredientResponse, String> {
    validate_per_100g(&data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::create(&conn, &data)
        .map_err(|e| format!("Failed to create ingredient: {}", e))?;

    Ok(AddIngredientResponse {
        id: ingredient.id,
        name: ingredient.name,
        created_at: ingredient.created_at,
    })
}

/// Get an ingredient by ID with usage information
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?;

    match ingredient {
        Some(ingredient) => {
            let usage_count = Ingredient::get_usage_count(&conn, id)
                .map_err(|e| format!("Failed to get usage count: {}", e))?;

            Ok(Some(IngredientDetail {
                id: ingredient.id,
                name: ingredient.name,
                kcal_per_100g: ingredient.kcal_per_100g,
                proteins_per_100g: ingredient.proteins_per_100g,
                carbs_per_100g: ingredient.carbs_per_100g,
                fats_per_100g: ingredient.fats_per_100g,
                created_at: ingredient.created_at,
                updated_at: ingredient.updated_at,
                usage_count,
            }))
        }
        None => Ok(None),
    }
}

/// Search ingredients by name
pub fn search_ingredients(
    db: &Database,
    query: &str,
    limit: i64,
) -> Result<SearchIngredientsResponse, String> {
    let limit = limit.min(100).max(1);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = Ingredient::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<IngredientSummary> = items.iter().map(IngredientSummary::from).collect();
    let total = summaries.len();

    Ok(SearchIngredientsResponse {
        items: summaries,
        total,
    })
}

/// Update an ingredient (full replacement of name and per-100g values)
pub fn update_ingredient(
    db: &Database,
    id: i64,
    data: IngredientUpdate,
) -> Result<UpdateIngredientResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Ingredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update ingredient: {}", e))?;

    match updated {
        Some(ingredient) => Ok(UpdateIngredientResponse {
            success: true,
            updated_at: ingredient.updated_at,
        }),
        None => Err(format!("Ingredient not found with id: {}", id)),
    }
}

/// Delete an ingredient (blocked if referenced by any meal entry)
pub fn delete_ingredient(
    db: &Database,
    id: i64,
) -> Result<Result<DeleteIngredientSuccessResponse, DeleteIngredientBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if ingredient.is_none() {
        return Err(format!("Ingredient not found with id: {}", id));
    }

    let usage_count = Ingredient::get_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;

    if usage_count > 0 {
        return Ok(Err(DeleteIngredientBlockedResponse {
            error: format!("Cannot delete ingredient: used in {} meal entry(s)", usage_count),
            usage_count,
        }));
    }

    Ingredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    Ok(Ok(DeleteIngredientSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}
