//! Journey state machine.
//!
//! [`JourneyController`] owns the floors, the composed input, and the armed
//! timers. Every transition takes an [`Effects`] buffer and pushes the audio
//! cues, timer commands, and events it produces; the controller itself never
//! touches a clock or a speaker.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::audio::AudioCue;
use crate::config::{ElevatorCfg, FloorRange};
use crate::constants::{LOG_TARGET_JOURNEY, NOTICE_EMPTY_WEIGHTS, NOTICE_INVALID_FLOOR};
use crate::floor::FloorType;
use crate::input::{FloorInput, FloorInputError};
use crate::probability::{ProbabilityConfig, ProbabilityError};
use crate::selector::{DrawTrace, SelectorError, draw_floor_type};

pub mod event;
pub mod session;
pub mod timer;
pub use event::JourneyEvent;
pub use session::{Dispatch, JourneySession, SessionEvent, SessionSnapshot};
pub use timer::{TimerCommand, TimerId, TimerKind, TimerLedger};

/// Session phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Input,
    Moving,
    Arrival,
    #[serde(rename = "gameover")]
    GameOver,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Moving => "moving",
            Self::Arrival => "arrival",
            Self::GameOver => "gameover",
        })
    }
}

/// Player-initiated controller actions, used to report refused transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyAction {
    Digit,
    Minus,
    Clear,
    Start,
    ReturnToElevator,
    Restart,
}

impl fmt::Display for JourneyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Digit => "digit",
            Self::Minus => "minus",
            Self::Clear => "clear",
            Self::Start => "start journey",
            Self::ReturnToElevator => "return to elevator",
            Self::Restart => "restart",
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JourneyError {
    #[error("{action} is not permitted while {status}")]
    NotPermitted {
        status: GameStatus,
        action: JourneyAction,
    },
    #[error(transparent)]
    InvalidTarget(#[from] FloorInputError),
    #[error(transparent)]
    Weights(#[from] ProbabilityError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// User-facing validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub key: String,
    pub message: String,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Play(AudioCue),
    Stop(AudioCue),
    Timer(TimerCommand),
    Event(JourneyEvent),
}

pub type Effects = SmallVec<[Effect; 8]>;

/// Elevator travel state machine.
#[derive(Debug, Clone)]
pub struct JourneyController {
    range: FloorRange,
    start_floor: i32,
    tick_period: Duration,
    settle_delay: Duration,
    current_floor: i32,
    target_floor: Option<i32>,
    displayed_floor: i32,
    status: GameStatus,
    floor_type: FloorType,
    input: FloorInput,
    notice: Option<Notice>,
    trip_weights: Option<ProbabilityConfig>,
    pending_outcome: Option<DrawTrace>,
    timers: TimerLedger,
}

impl Default for JourneyController {
    fn default() -> Self {
        Self::new(&ElevatorCfg::default())
    }
}

impl JourneyController {
    #[must_use]
    pub fn new(cfg: &ElevatorCfg) -> Self {
        Self {
            range: cfg.floor_range(),
            start_floor: cfg.start_floor,
            tick_period: cfg.tick_period(),
            settle_delay: cfg.settle_delay(),
            current_floor: cfg.start_floor,
            target_floor: None,
            displayed_floor: cfg.start_floor,
            status: GameStatus::Input,
            floor_type: FloorType::Normal,
            input: FloorInput::with_max_len(cfg.max_input_len),
            notice: None,
            trip_weights: None,
            pending_outcome: None,
            timers: TimerLedger::default(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub const fn current_floor(&self) -> i32 {
        self.current_floor
    }

    #[must_use]
    pub const fn target_floor(&self) -> Option<i32> {
        self.target_floor
    }

    #[must_use]
    pub const fn displayed_floor(&self) -> i32 {
        self.displayed_floor
    }

    /// Floor number the display should show right now.
    #[must_use]
    pub const fn shown_floor(&self) -> i32 {
        match self.status {
            GameStatus::Moving => self.displayed_floor,
            _ => self.current_floor,
        }
    }

    #[must_use]
    pub const fn floor_type(&self) -> FloorType {
        self.floor_type
    }

    #[must_use]
    pub const fn input(&self) -> &FloorInput {
        &self.input
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True between arrival resolution and the outcome reveal.
    #[must_use]
    pub const fn is_settling(&self) -> bool {
        self.pending_outcome.is_some()
    }

    #[must_use]
    pub const fn timers(&self) -> &TimerLedger {
        &self.timers
    }

    #[must_use]
    pub const fn floor_range(&self) -> FloorRange {
        self.range
    }

    fn require(&self, allowed: GameStatus, action: JourneyAction) -> Result<(), JourneyError> {
        if self.status == allowed {
            return Ok(());
        }
        log::warn!(
            target: LOG_TARGET_JOURNEY,
            "refused {action} while {status}",
            status = self.status
        );
        Err(JourneyError::NotPermitted {
            status: self.status,
            action,
        })
    }

    /// Append a digit to the composed floor.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the input phase.
    pub fn press_digit(&mut self, digit: u8, fx: &mut Effects) -> Result<bool, JourneyError> {
        self.require(GameStatus::Input, JourneyAction::Digit)?;
        fx.push(Effect::Play(AudioCue::Click));
        let accepted = self.input.push_digit(digit);
        if accepted {
            self.notice = None;
        }
        Ok(accepted)
    }

    /// Start a negative floor number.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the input phase.
    pub fn press_minus(&mut self, fx: &mut Effects) -> Result<bool, JourneyError> {
        self.require(GameStatus::Input, JourneyAction::Minus)?;
        fx.push(Effect::Play(AudioCue::Click));
        let accepted = self.input.push_minus();
        if accepted {
            self.notice = None;
        }
        Ok(accepted)
    }

    /// Discard the composed floor.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the input phase.
    pub fn clear_input(&mut self, fx: &mut Effects) -> Result<(), JourneyError> {
        self.require(GameStatus::Input, JourneyAction::Clear)?;
        fx.push(Effect::Play(AudioCue::Click));
        self.input.clear();
        Ok(())
    }

    fn refuse(&mut self, key: &str, message: String, fx: &mut Effects) {
        log::warn!(target: LOG_TARGET_JOURNEY, "journey refused: {message}");
        fx.push(Effect::Event(JourneyEvent::Refused {
            key: key.to_string(),
            message: message.clone(),
        }));
        self.notice = Some(Notice {
            key: key.to_string(),
            message,
        });
    }

    /// Validate the composed floor and depart toward it.
    ///
    /// The weight table is copied here; the arrival draw uses that copy.
    /// A zero-distance journey resolves immediately without a ticker.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::InvalidTarget`] (input cleared, notice set) for
    /// a bad floor, [`JourneyError::Weights`] when the table is empty, and
    /// [`JourneyError::NotPermitted`] outside the input phase.
    pub fn start_journey<R: Rng>(
        &mut self,
        weights: &ProbabilityConfig,
        rng: &mut R,
        fx: &mut Effects,
    ) -> Result<i32, JourneyError> {
        self.require(GameStatus::Input, JourneyAction::Start)?;
        fx.push(Effect::Play(AudioCue::Click));
        let target = match self.input.parse_target(self.range) {
            Ok(target) => target,
            Err(err) => {
                self.input.clear();
                self.refuse(NOTICE_INVALID_FLOOR, err.to_string(), fx);
                return Err(err.into());
            }
        };
        if let Err(err) = weights.validate() {
            self.refuse(NOTICE_EMPTY_WEIGHTS, err.to_string(), fx);
            return Err(err.into());
        }

        let from = self.current_floor;
        self.input.clear();
        self.notice = None;
        self.target_floor = Some(target);
        self.displayed_floor = from;
        self.status = GameStatus::Moving;
        self.trip_weights = Some(*weights);
        log::debug!(target: LOG_TARGET_JOURNEY, "departing {from} -> {target}");
        fx.push(Effect::Event(JourneyEvent::Departed { from, target }));
        fx.push(Effect::Play(AudioCue::Moving));

        if from == target {
            self.resolve_arrival(target, rng, fx)?;
        } else {
            let (id, replaced) = self.timers.arm(TimerKind::Ticker);
            if let Some(stale) = replaced {
                fx.push(Effect::Timer(TimerCommand::Cancel {
                    id: stale,
                    kind: TimerKind::Ticker,
                }));
            }
            fx.push(Effect::Timer(TimerCommand::StartTicker {
                id,
                period: self.tick_period,
            }));
        }
        Ok(target)
    }

    /// Advance the display counter one floor toward the target.
    ///
    /// Returns false for a stale tick, which changes nothing.
    ///
    /// # Errors
    ///
    /// Propagates a failed outcome draw on arrival.
    pub fn on_tick<R: Rng>(
        &mut self,
        id: TimerId,
        rng: &mut R,
        fx: &mut Effects,
    ) -> Result<bool, JourneyError> {
        if !self.timers.is_armed(TimerKind::Ticker, id) {
            log::debug!(target: LOG_TARGET_JOURNEY, "ignoring stale tick {}", id.0);
            fx.push(Effect::Event(JourneyEvent::StaleTimer { id: id.0 }));
            return Ok(false);
        }
        let Some(target) = self.target_floor else {
            self.cancel_timer(TimerKind::Ticker, fx);
            return Ok(false);
        };

        if self.displayed_floor != target {
            self.displayed_floor += if target > self.displayed_floor { 1 } else { -1 };
            fx.push(Effect::Event(JourneyEvent::Stepped {
                floor: self.displayed_floor,
            }));
        }
        if self.displayed_floor == target {
            self.cancel_timer(TimerKind::Ticker, fx);
            self.resolve_arrival(target, rng, fx)?;
        }
        Ok(true)
    }

    fn cancel_timer(&mut self, kind: TimerKind, fx: &mut Effects) {
        if let Some(id) = self.timers.disarm(kind) {
            fx.push(Effect::Timer(TimerCommand::Cancel { id, kind }));
        }
    }

    fn resolve_arrival<R: Rng>(
        &mut self,
        target: i32,
        rng: &mut R,
        fx: &mut Effects,
    ) -> Result<(), JourneyError> {
        let weights = self
            .trip_weights
            .ok_or(JourneyError::Selector(SelectorError::EmptyWeightTable))?;
        let trace = draw_floor_type(&weights, rng)?;
        fx.push(Effect::Stop(AudioCue::Moving));
        fx.push(Effect::Play(AudioCue::Ding));
        self.current_floor = target;
        self.displayed_floor = target;
        self.pending_outcome = Some(trace);
        log::info!(
            target: LOG_TARGET_JOURNEY,
            "arrived at floor {target}, drew {} (roll {}/{})",
            trace.chosen,
            trace.roll,
            trace.total
        );
        fx.push(Effect::Event(JourneyEvent::Resolved {
            floor: target,
            trace,
        }));
        let (id, replaced) = self.timers.arm(TimerKind::Settle);
        if let Some(stale) = replaced {
            fx.push(Effect::Timer(TimerCommand::Cancel {
                id: stale,
                kind: TimerKind::Settle,
            }));
        }
        fx.push(Effect::Timer(TimerCommand::ScheduleSettle {
            id,
            delay: self.settle_delay,
        }));
        Ok(())
    }

    /// Reveal the drawn outcome once the settle delay has elapsed.
    ///
    /// Returns false for a stale completion, which changes nothing.
    pub fn on_settle_elapsed(&mut self, id: TimerId, fx: &mut Effects) -> bool {
        if !self.timers.is_armed(TimerKind::Settle, id) {
            log::debug!(target: LOG_TARGET_JOURNEY, "ignoring stale settle {}", id.0);
            fx.push(Effect::Event(JourneyEvent::StaleTimer { id: id.0 }));
            return false;
        }
        self.timers.disarm(TimerKind::Settle);
        let Some(trace) = self.pending_outcome.take() else {
            return false;
        };
        self.trip_weights = None;
        self.floor_type = trace.chosen;
        self.status = if trace.chosen.ends_game() {
            GameStatus::GameOver
        } else {
            GameStatus::Arrival
        };
        log::debug!(
            target: LOG_TARGET_JOURNEY,
            "revealed {} on floor {}, status {}",
            trace.chosen,
            self.current_floor,
            self.status
        );
        fx.push(Effect::Play(trace.chosen.reveal_cue()));
        fx.push(Effect::Event(JourneyEvent::Revealed {
            floor: self.current_floor,
            floor_type: trace.chosen,
            status: self.status,
        }));
        true
    }

    /// Leave the arrival screen and compose the next floor.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the arrival phase.
    pub fn return_to_elevator(&mut self, fx: &mut Effects) -> Result<(), JourneyError> {
        self.require(GameStatus::Arrival, JourneyAction::ReturnToElevator)?;
        fx.push(Effect::Play(AudioCue::Click));
        self.floor_type = FloorType::Normal;
        self.status = GameStatus::Input;
        fx.push(Effect::Event(JourneyEvent::Returned));
        Ok(())
    }

    /// Start over after a bomb floor.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the game-over phase.
    pub fn restart(&mut self, fx: &mut Effects) -> Result<(), JourneyError> {
        self.require(GameStatus::GameOver, JourneyAction::Restart)?;
        fx.push(Effect::Play(AudioCue::Click));
        self.reset(fx);
        fx.push(Effect::Event(JourneyEvent::Restarted));
        Ok(())
    }

    /// Cancel every armed timer and return to the initial state, from any
    /// phase. Used on teardown.
    pub fn reset(&mut self, fx: &mut Effects) {
        if self.timers.armed(TimerKind::Ticker).is_some() {
            fx.push(Effect::Stop(AudioCue::Moving));
        }
        fx.extend(self.timers.disarm_all().into_iter().map(Effect::Timer));
        self.current_floor = self.start_floor;
        self.displayed_floor = self.start_floor;
        self.target_floor = None;
        self.status = GameStatus::Input;
        self.floor_type = FloorType::Normal;
        self.input.clear();
        self.notice = None;
        self.trip_weights = None;
        self.pending_outcome = None;
    }
}
