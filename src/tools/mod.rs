//! Macrolog tools module
//!
//! MCP tool implementations for meal logging and nutrition statistics.

pub mod favorites;
pub mod history;
pub mod ingredients;
pub mod meals;
pub mod stats;
