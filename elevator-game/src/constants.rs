//! Centralized tuning constants for the elevator game logic.
//!
//! These values define the fixed contract of the core simulation. Runtime
//! overrides go through [`crate::config::ElevatorCfg`], which defaults to
//! the values below.

// Logging targets -----------------------------------------------------------
pub(crate) const LOG_TARGET_JOURNEY: &str = "elevator::journey";
pub(crate) const LOG_TARGET_SELECTOR: &str = "elevator::selector";
pub(crate) const LOG_TARGET_SESSION: &str = "elevator::session";
#[cfg(feature = "async")]
pub(crate) const LOG_TARGET_RUNTIME: &str = "elevator::runtime";

// Notice keys ---------------------------------------------------------------
pub const NOTICE_INVALID_FLOOR: &str = "notice.invalid-floor";
pub const NOTICE_EMPTY_WEIGHTS: &str = "notice.empty-weights";

// Floor contract ------------------------------------------------------------
pub const FLOOR_MIN: i32 = -3;
pub const FLOOR_MAX: i32 = 100;
pub const START_FLOOR: i32 = 1;
pub const MAX_INPUT_LEN: usize = 3;

// Timing --------------------------------------------------------------------
pub const TICK_MS: u64 = 100;
pub const SETTLE_MS: u64 = 500;

// Weight table --------------------------------------------------------------
pub const WEIGHT_MAX: u32 = 100;
pub const DEFAULT_WEIGHT_BOMB: u32 = 10;
pub const DEFAULT_WEIGHT_ZOMBIE: u32 = 33;
pub const DEFAULT_WEIGHT_GOLD: u32 = 20;
pub const DEFAULT_WEIGHT_CAT: u32 = 17;
pub const DEFAULT_WEIGHT_NORMAL: u32 = 20;
