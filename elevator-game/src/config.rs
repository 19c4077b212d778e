//! Session configuration.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{FLOOR_MAX, FLOOR_MIN, MAX_INPUT_LEN, SETTLE_MS, START_FLOOR, TICK_MS};
use crate::probability::ProbabilityConfig;

/// Inclusive range of selectable floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorRange {
    pub min: i32,
    pub max: i32,
}

impl FloorRange {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn contains(self, floor: i32) -> bool {
        floor >= self.min && floor <= self.max
    }
}

impl Default for FloorRange {
    fn default() -> Self {
        Self::new(FLOOR_MIN, FLOOR_MAX)
    }
}

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElevatorConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("floor range invalid (min {min} > max {max})")]
    FloorRange { min: i32, max: i32 },
    #[error("start floor {start} lies outside {min}..={max}")]
    StartOutsideRange { start: i32, min: i32, max: i32 },
    #[error("empty input selects floor {floor}, which lies outside {min}..={max}")]
    EmptyInputOutsideRange { floor: i32, min: i32, max: i32 },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Timing, floor contract, and initial weight table for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevatorCfg {
    #[serde(default = "ElevatorCfg::default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "ElevatorCfg::default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "ElevatorCfg::default_floor_min")]
    pub floor_min: i32,
    #[serde(default = "ElevatorCfg::default_floor_max")]
    pub floor_max: i32,
    #[serde(default = "ElevatorCfg::default_start_floor")]
    pub start_floor: i32,
    #[serde(default = "ElevatorCfg::default_max_input_len")]
    pub max_input_len: usize,
    #[serde(default)]
    pub weights: ProbabilityConfig,
}

impl ElevatorCfg {
    const fn default_tick_ms() -> u64 {
        TICK_MS
    }

    const fn default_settle_ms() -> u64 {
        SETTLE_MS
    }

    const fn default_floor_min() -> i32 {
        FLOOR_MIN
    }

    const fn default_floor_max() -> i32 {
        FLOOR_MAX
    }

    const fn default_start_floor() -> i32 {
        START_FLOOR
    }

    const fn default_max_input_len() -> usize {
        MAX_INPUT_LEN
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ElevatorConfigError` when parsing fails or any field violates
    /// its bounds.
    pub fn from_json(json: &str) -> Result<Self, ElevatorConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ElevatorConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ElevatorConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ElevatorConfigError> {
        check_range("tick_ms", self.tick_ms, 1, 10_000)?;
        check_range("settle_ms", self.settle_ms, 0, 60_000)?;
        check_range(
            "max_input_len",
            u64::try_from(self.max_input_len).unwrap_or(u64::MAX),
            1,
            6,
        )?;
        if self.floor_min > self.floor_max {
            return Err(ElevatorConfigError::FloorRange {
                min: self.floor_min,
                max: self.floor_max,
            });
        }
        if !self.floor_range().contains(self.start_floor) {
            return Err(ElevatorConfigError::StartOutsideRange {
                start: self.start_floor,
                min: self.floor_min,
                max: self.floor_max,
            });
        }
        if !self.floor_range().contains(START_FLOOR) {
            return Err(ElevatorConfigError::EmptyInputOutsideRange {
                floor: START_FLOOR,
                min: self.floor_min,
                max: self.floor_max,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn floor_range(&self) -> FloorRange {
        FloorRange::new(self.floor_min, self.floor_max)
    }

    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for ElevatorCfg {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
            settle_ms: Self::default_settle_ms(),
            floor_min: Self::default_floor_min(),
            floor_max: Self::default_floor_max(),
            start_floor: Self::default_start_floor(),
            max_input_len: Self::default_max_input_len(),
            weights: ProbabilityConfig::default(),
        }
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ElevatorConfigError> {
    if (min..=max).contains(&value) {
        return Ok(());
    }
    let widen = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
    Err(ElevatorConfigError::RangeViolation {
        field,
        min: widen(min),
        max: widen(max),
        value: widen(value),
    })
}
