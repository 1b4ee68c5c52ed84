//! Shared macro totals structure
//!
//! Used across meals, daily aggregates, and statistics.

use serde::{Deserialize, Serialize};

/// Calorie and macronutrient totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub kcal: f64,
    pub proteins: f64,     // grams
    pub carbs: f64,        // grams
    pub fats: f64,         // grams
}

impl MacroTotals {
    /// Create a new MacroTotals with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale totals by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            kcal: self.kcal * multiplier,
            proteins: self.proteins * multiplier,
            carbs: self.carbs * multiplier,
            fats: self.fats * multiplier,
        }
    }

    /// Add another totals to this one
    pub fn add(&self, other: &MacroTotals) -> Self {
        Self {
            kcal: self.kcal + other.kcal,
            proteins: self.proteins + other.proteins,
            carbs: self.carbs + other.carbs,
            fats: self.fats + other.fats,
        }
    }
}

impl std::ops::Add for MacroTotals {
    type Output = MacroTotals;

    fn add(self, other: MacroTotals) -> MacroTotals {
        MacroTotals::add(&self, &other)
    }
}

impl std::iter::Sum for MacroTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MacroTotals::zero(), |acc, n| acc + n)
    }
}
