//! Weighted outcome selection.
//!
//! Draws a single [`FloorType`] from a [`ProbabilityConfig`] with a
//! cumulative walk in [`FloorType::PRIORITY`] order. The walk order is part
//! of the contract: it decides which category wins at cumulative boundaries,
//! and a zero-weight category never wins because its cumulative weight does
//! not exceed the roll.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::LOG_TARGET_SELECTOR;
use crate::floor::FloorType;
use crate::probability::ProbabilityConfig;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("cannot draw an outcome from an empty weight table")]
    EmptyWeightTable,
}

/// Explainability record for a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawTrace {
    /// Uniform roll in `[0, total)`.
    pub roll: u32,
    pub total: u32,
    /// Candidate weights in walk order.
    pub candidates: [(FloorType, u32); 5],
    pub chosen: FloorType,
}

/// Draw one category with a fresh roll.
///
/// # Errors
///
/// Returns [`SelectorError::EmptyWeightTable`] when every weight is 0.
pub fn draw_floor_type<R: Rng>(
    weights: &ProbabilityConfig,
    rng: &mut R,
) -> Result<DrawTrace, SelectorError> {
    let total = weights.total();
    if total == 0 {
        log::error!(target: LOG_TARGET_SELECTOR, "draw requested with empty weight table");
        return Err(SelectorError::EmptyWeightTable);
    }
    let roll = rng.gen_range(0..total);
    let chosen = pick_for_roll(weights, roll);
    log::debug!(target: LOG_TARGET_SELECTOR, "roll {roll}/{total} -> {chosen}");
    Ok(DrawTrace {
        roll,
        total,
        candidates: weights.entries(),
        chosen,
    })
}

/// Resolve a roll against the cumulative table.
///
/// Rolls at or beyond the total fall through to [`FloorType::Normal`].
#[must_use]
pub fn pick_for_roll(weights: &ProbabilityConfig, roll: u32) -> FloorType {
    let mut cumulative = 0_u32;
    for (kind, weight) in weights.entries() {
        cumulative = cumulative.saturating_add(weight);
        if roll < cumulative {
            return kind;
        }
    }
    FloorType::Normal
}
