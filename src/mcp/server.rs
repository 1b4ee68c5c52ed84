//! Macrolog MCP Server Implementation
//!
//! Implements the MCP server with all meal logging and statistics tools.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;

use crate::db::Database;
use crate::models::{IngredientCreate, IngredientUpdate, MealEntryInput};
use crate::tools::{favorites, history, ingredients, meals, stats};

/// Macrolog MCP Service
#[derive(Clone)]
pub struct MacrologService {
    database: Database,
    tool_router: ToolRouter<MacrologService>,
}

impl MacrologService {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    /// Ingredient name
    pub name: String,
    /// Calories per 100 grams
    #[serde(default)]
    pub kcal_per_100g: f64,
    /// Carbohydrates per 100 grams
    #[serde(default)]
    pub carbs_per_100g: f64,
    /// Fats per 100 grams
    #[serde(default)]
    pub fats_per_100g: f64,
    /// Proteins per 100 grams
    #[serde(default)]
    pub proteins_per_100g: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetIngredientParams {
    /// Ingredient ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchIngredientsParams {
    /// Search query (case-insensitive substring match on name)
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    /// Ingredient ID to update
    pub id: i64,
    /// New name
    pub name: String,
    /// New calories per 100 grams
    pub kcal_per_100g: f64,
    /// New carbohydrates per 100 grams
    pub carbs_per_100g: f64,
    /// New fats per 100 grams
    pub fats_per_100g: f64,
    /// New proteins per 100 grams
    pub proteins_per_100g: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteIngredientParams {
    /// Ingredient ID to delete
    pub id: i64,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

/// One ingredient quantity within a meal
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealEntryParam {
    /// Ingredient ID
    pub ingredient_id: i64,
    /// Quantity in grams (must be greater than 0)
    pub grams: f64,
}

impl From<MealEntryParam> for MealEntryInput {
    fn from(p: MealEntryParam) -> Self {
        Self {
            ingredient_id: p.ingredient_id,
            grams: p.grams,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    /// Meal name
    pub name: String,
    /// When the meal was eaten (RFC 3339, e.g. 2025-08-30T12:00:00Z;
    /// zone-less values are taken as UTC; defaults to now)
    pub eaten_at: Option<String>,
    /// Ingredient entries (at least one)
    pub entries: Vec<MealEntryParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMealParams {
    /// Meal ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchMealsParams {
    /// Search query (case-insensitive substring match on name)
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealParams {
    /// Meal ID to update
    pub id: i64,
    /// New name
    pub name: String,
    /// New eaten_at timestamp (RFC 3339)
    pub eaten_at: String,
    /// Replacement entries (at least one; existing entries are discarded)
    pub entries: Vec<MealEntryParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMealParams {
    /// Meal ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealEntryQuantityParams {
    /// Meal ID the entry belongs to
    pub meal_id: i64,
    /// Entry ID to update
    pub entry_id: i64,
    /// New quantity in grams (must be greater than 0)
    pub grams: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealEntryIngredientParams {
    /// Meal ID the entry belongs to
    pub meal_id: i64,
    /// Entry ID to update
    pub entry_id: i64,
    /// New ingredient ID
    pub ingredient_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveMealEntryParams {
    /// Meal ID the entry belongs to
    pub meal_id: i64,
    /// Entry ID to remove
    pub entry_id: i64,
}

// ============================================================================
// Favorite Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StarMealParams {
    /// Meal ID to star
    pub meal_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UnstarMealParams {
    /// Meal ID to unstar
    pub meal_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFavoriteMealParams {
    /// Favorite ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFavoritesParams {
    /// Maximum results (default 20, max 500)
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFavoritesParams {
    /// Search query (case-insensitive substring match on the starred name)
    pub query: String,
    /// Maximum results (default 20, max 500)
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

// ============================================================================
// Stats and History Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetStatsParams {
    /// Start date (inclusive) in ISO format: YYYY-MM-DD
    pub start_date: String,
    /// End date (inclusive) in ISO format: YYYY-MM-DD
    pub end_date: String,
    /// Macro split weighting: kcal (default) or grams
    pub basis: Option<String>,
    /// Decimal places for rounding (default 1)
    pub round_to: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetHistoryParams {
    /// Start date (inclusive) in ISO format: YYYY-MM-DD; requires end_date
    pub start_date: Option<String>,
    /// End date (inclusive) in ISO format: YYYY-MM-DD; requires start_date
    pub end_date: Option<String>,
    /// Named period: this_week, this_month, last_7_days, or last_30_days.
    /// Ignored when explicit dates are given. Default last_7_days.
    pub period: Option<String>,
    /// IANA timezone for day grouping (default UTC)
    pub timezone: Option<String>,
    /// Base URL for per-meal action links; links are omitted when absent
    pub base_url: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MacrologService {
    // --- Ingredients ---

    #[tool(description = "Add a new ingredient with its per-100g nutritional values")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            name: p.name,
            kcal_per_100g: p.kcal_per_100g,
            carbs_per_100g: p.carbs_per_100g,
            fats_per_100g: p.fats_per_100g,
            proteins_per_100g: p.proteins_per_100g,
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full details for an ingredient including meal usage count")]
    fn get_ingredient(&self, Parameters(p): Parameters<GetIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(item) => serde_json::to_string_pretty(&item),
            None => Ok(format!(r#"{{"error": "Ingredient not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search ingredients by name")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_ingredients(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an ingredient (full replacement of name and per-100g values)")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name,
            kcal_per_100g: p.kcal_per_100g,
            carbs_per_100g: p.carbs_per_100g,
            fats_per_100g: p.fats_per_100g,
            proteins_per_100g: p.proteins_per_100g,
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete an ingredient (only allowed if not used in any meal)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<DeleteIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Meals ---

    #[tool(description = "Log a meal with its ingredient entries. Calories are derived from per-100g values, never stored.")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let entries: Vec<MealEntryInput> = p.entries.into_iter().map(MealEntryInput::from).collect();
        let result = meals::log_meal(&self.database, &p.name, p.eaten_at.as_deref(), &entries)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a meal by ID with entries and derived calories")]
    fn get_meal(&self, Parameters(p): Parameters<GetMealParams>) -> Result<CallToolResult, McpError> {
        let result = meals::get_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(meal) => serde_json::to_string_pretty(&meal),
            None => Ok(format!(r#"{{"error": "Meal not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search meals by name, most recently eaten first")]
    fn search_meals(&self, Parameters(p): Parameters<SearchMealsParams>) -> Result<CallToolResult, McpError> {
        let result = meals::search_meals(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a meal's name, timestamp and entries (entries are replaced wholesale)")]
    fn update_meal(&self, Parameters(p): Parameters<UpdateMealParams>) -> Result<CallToolResult, McpError> {
        let entries: Vec<MealEntryInput> = p.entries.into_iter().map(MealEntryInput::from).collect();
        let result = meals::update_meal(&self.database, p.id, &p.name, &p.eaten_at, &entries)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a meal (entries and any favorite star go with it)")]
    fn delete_meal(&self, Parameters(p): Parameters<DeleteMealParams>) -> Result<CallToolResult, McpError> {
        let result = meals::delete_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Change one meal entry's quantity in grams")]
    fn update_meal_entry_quantity(&self, Parameters(p): Parameters<UpdateMealEntryQuantityParams>) -> Result<CallToolResult, McpError> {
        let result = meals::update_meal_entry_quantity(&self.database, p.meal_id, p.entry_id, p.grams)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Point one meal entry at a different ingredient")]
    fn update_meal_entry_ingredient(&self, Parameters(p): Parameters<UpdateMealEntryIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = meals::update_meal_entry_ingredient(&self.database, p.meal_id, p.entry_id, p.ingredient_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove one entry from a meal")]
    fn remove_meal_entry(&self, Parameters(p): Parameters<RemoveMealEntryParams>) -> Result<CallToolResult, McpError> {
        let result = meals::remove_meal_entry(&self.database, p.meal_id, p.entry_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Favorites ---

    #[tool(description = "Star a meal for quick re-logging (at most one star per meal)")]
    fn star_meal(&self, Parameters(p): Parameters<StarMealParams>) -> Result<CallToolResult, McpError> {
        let result = favorites::star_meal(&self.database, p.meal_id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a meal's favorite star")]
    fn unstar_meal(&self, Parameters(p): Parameters<UnstarMealParams>) -> Result<CallToolResult, McpError> {
        let result = favorites::unstar_meal(&self.database, p.meal_id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a favorite by ID with the starred meal's derived calories")]
    fn get_favorite_meal(&self, Parameters(p): Parameters<GetFavoriteMealParams>) -> Result<CallToolResult, McpError> {
        let result = favorites::get_favorite_meal(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(fav) => serde_json::to_string_pretty(&fav),
            None => Ok(format!(r#"{{"error": "Favorite not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List favorites, most recently starred first")]
    fn list_favorites(&self, Parameters(p): Parameters<ListFavoritesParams>) -> Result<CallToolResult, McpError> {
        let result = favorites::list_favorites(&self.database, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search favorites by name")]
    fn search_favorites(&self, Parameters(p): Parameters<SearchFavoritesParams>) -> Result<CallToolResult, McpError> {
        let result = favorites::search_favorites(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Stats and History ---

    #[tool(description = "Per-day calorie totals and macro percentage split for a date range. Days without meals show 0 calories. Basis: kcal weights protein/carbs at 4 and fat at 9 kcal per gram; grams uses raw gram totals.")]
    fn get_stats(&self, Parameters(p): Parameters<GetStatsParams>) -> Result<CallToolResult, McpError> {
        let result = stats::get_stats(&self.database, &p.start_date, &p.end_date, p.basis.as_deref(), p.round_to)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Meal history grouped by calendar day in the caller's timezone, most recent first. Accepts an explicit date range or a named period (this_week, this_month, last_7_days, last_30_days).")]
    fn get_history(&self, Parameters(p): Parameters<GetHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = history::get_history(
            &self.database,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.period.as_deref(),
            p.timezone.as_deref(),
            p.base_url.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MacrologService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "macrolog".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Macrolog".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Macrolog - meal logging and nutrition statistics. \
                 Ingredients: add/get/search/update/delete_ingredient (per-100g values). \
                 Meals: log_meal/get_meal/search_meals/update_meal/delete_meal, \
                 update_meal_entry_quantity, update_meal_entry_ingredient, remove_meal_entry. \
                 Calories are always derived from ingredient per-100g values, never stored. \
                 Favorites: star_meal/unstar_meal/get_favorite_meal/list_favorites/search_favorites. \
                 Stats: get_stats for per-day calories and a macro split over a date range. \
                 History: get_history for meals grouped by day in your timezone, \
                 with named periods like last_7_days or this_month."
                    .into(),
            ),
        }
    }
}
