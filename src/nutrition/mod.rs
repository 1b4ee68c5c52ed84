//! Nutrition aggregation module
//!
//! Handles date-range calorie statistics and day-grouped meal history.

pub mod history;
pub mod range;
pub mod stats;
pub mod store;

pub use history::{history_grouped_by_day, resolve_period, DayBucket, HistoryMeal, HistoryView};
pub use range::{DateRange, NutritionError};
pub use stats::{
    daily_calories_and_macro_split, Basis, DayCalories, MacroPercentages, StatsResult,
};
pub use store::{DailyAggregateRow, MealStore};
