//! Data models
//!
//! Rust structs representing database entities.

mod favorite;
mod ingredient;
mod macros;
mod meal;

pub use favorite::FavoriteMeal;
pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use macros::MacroTotals;
pub use meal::{Meal, MealEntry, MealEntryInput};
