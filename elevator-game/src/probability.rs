//! Configurable weight table over the five floor categories.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_WEIGHT_BOMB, DEFAULT_WEIGHT_CAT, DEFAULT_WEIGHT_GOLD, DEFAULT_WEIGHT_NORMAL,
    DEFAULT_WEIGHT_ZOMBIE, WEIGHT_MAX,
};
use crate::floor::FloorType;
use crate::numbers::share_percent;

/// Errors raised when the weight table cannot support a draw.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ProbabilityError {
    #[error("weight table is empty: every category has weight 0")]
    EmptyWeightTable,
}

/// Relative likelihood of each floor category.
///
/// Every category is always present; a zero weight makes that floor
/// unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityConfig {
    #[serde(default = "ProbabilityConfig::default_bomb")]
    pub bomb: u32,
    #[serde(default = "ProbabilityConfig::default_zombie")]
    pub zombie: u32,
    #[serde(default = "ProbabilityConfig::default_gold")]
    pub gold: u32,
    #[serde(default = "ProbabilityConfig::default_cat")]
    pub cat: u32,
    #[serde(default = "ProbabilityConfig::default_normal")]
    pub normal: u32,
}

impl ProbabilityConfig {
    const fn default_bomb() -> u32 {
        DEFAULT_WEIGHT_BOMB
    }

    const fn default_zombie() -> u32 {
        DEFAULT_WEIGHT_ZOMBIE
    }

    const fn default_gold() -> u32 {
        DEFAULT_WEIGHT_GOLD
    }

    const fn default_cat() -> u32 {
        DEFAULT_WEIGHT_CAT
    }

    const fn default_normal() -> u32 {
        DEFAULT_WEIGHT_NORMAL
    }

    /// Table with every category set to `weight`.
    #[must_use]
    pub const fn uniform(weight: u32) -> Self {
        Self {
            bomb: weight,
            zombie: weight,
            gold: weight,
            cat: weight,
            normal: weight,
        }
    }

    /// Table where only `kind` can be drawn.
    #[must_use]
    pub fn only(kind: FloorType) -> Self {
        let mut table = Self::uniform(0);
        table.set_weight(kind, WEIGHT_MAX);
        table
    }

    #[must_use]
    pub const fn weight(&self, kind: FloorType) -> u32 {
        match kind {
            FloorType::Bomb => self.bomb,
            FloorType::Zombie => self.zombie,
            FloorType::Gold => self.gold,
            FloorType::Cat => self.cat,
            FloorType::Normal => self.normal,
        }
    }

    pub const fn set_weight(&mut self, kind: FloorType, weight: u32) {
        let slot = match kind {
            FloorType::Bomb => &mut self.bomb,
            FloorType::Zombie => &mut self.zombie,
            FloorType::Gold => &mut self.gold,
            FloorType::Cat => &mut self.cat,
            FloorType::Normal => &mut self.normal,
        };
        *slot = weight;
    }

    /// Overwrite the whole table with the default weights.
    pub fn restore_defaults(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        FloorType::PRIORITY
            .into_iter()
            .map(|kind| self.weight(kind))
            .fold(0_u32, u32::saturating_add)
    }

    /// Check that the table supports a weighted draw.
    ///
    /// # Errors
    ///
    /// Returns [`ProbabilityError::EmptyWeightTable`] when every weight is 0.
    pub fn validate(&self) -> Result<(), ProbabilityError> {
        if self.total() == 0 {
            return Err(ProbabilityError::EmptyWeightTable);
        }
        Ok(())
    }

    /// Rounded share of each category in priority order.
    #[must_use]
    pub fn percentages(&self) -> [(FloorType, u32); 5] {
        let total = self.total();
        FloorType::PRIORITY.map(|kind| (kind, share_percent(self.weight(kind), total)))
    }

    /// Weights in priority order.
    #[must_use]
    pub fn entries(&self) -> [(FloorType, u32); 5] {
        FloorType::PRIORITY.map(|kind| (kind, self.weight(kind)))
    }
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            bomb: Self::default_bomb(),
            zombie: Self::default_zombie(),
            gold: Self::default_gold(),
            cat: Self::default_cat(),
            normal: Self::default_normal(),
        }
    }
}

/// Parse a slider or text-field weight.
///
/// Malformed input becomes 0 and values above the slider range are capped.
#[must_use]
pub fn parse_weight(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .map_or(0, |weight| weight.min(WEIGHT_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_table() {
        let table = ProbabilityConfig::default();
        assert_eq!(table.bomb, 10);
        assert_eq!(table.zombie, 33);
        assert_eq!(table.gold, 20);
        assert_eq!(table.cat, 17);
        assert_eq!(table.normal, 20);
        assert_eq!(table.total(), 100);
    }

    #[test]
    fn restore_defaults_overwrites_everything() {
        let mut table = ProbabilityConfig::uniform(0);
        table.set_weight(FloorType::Cat, 99);
        table.restore_defaults();
        assert_eq!(table, ProbabilityConfig::default());
    }

    #[test]
    fn parse_weight_clamps_malformed_to_zero() {
        assert_eq!(parse_weight("42"), 42);
        assert_eq!(parse_weight(" 7 "), 7);
        assert_eq!(parse_weight("abc"), 0);
        assert_eq!(parse_weight("-5"), 0);
        assert_eq!(parse_weight(""), 0);
        assert_eq!(parse_weight("250"), 100);
    }

    #[test]
    fn empty_table_fails_validation() {
        assert_eq!(
            ProbabilityConfig::uniform(0).validate(),
            Err(ProbabilityError::EmptyWeightTable)
        );
        assert!(ProbabilityConfig::only(FloorType::Gold).validate().is_ok());
    }

    #[test]
    fn percentages_follow_priority_order() {
        let table = ProbabilityConfig {
            bomb: 1,
            zombie: 1,
            gold: 1,
            cat: 0,
            normal: 0,
        };
        let shares = table.percentages();
        assert_eq!(shares[0], (FloorType::Bomb, 33));
        assert_eq!(shares[3], (FloorType::Cat, 0));
        assert!(
            ProbabilityConfig::uniform(0)
                .percentages()
                .iter()
                .all(|(_, pct)| *pct == 0)
        );
    }

    #[test]
    fn missing_fields_use_defaults() {
        let table: ProbabilityConfig = serde_json::from_str(r#"{"bomb": 0}"#).expect("deserialize");
        assert_eq!(table.bomb, 0);
        assert_eq!(table.zombie, 33);
    }
}
