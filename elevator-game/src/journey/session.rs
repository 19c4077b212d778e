use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::audio::{AudioGate, AudioSink, NullAudio};
use crate::config::ElevatorCfg;
use crate::constants::LOG_TARGET_SESSION;
use crate::floor::FloorType;
use crate::journey::{
    Effect, Effects, GameStatus, JourneyController, JourneyError, JourneyEvent, Notice,
    TimerCommand, TimerId,
};
use crate::probability::{ProbabilityConfig, parse_weight};
use crate::rng::CountingRng;

/// Every input the session reacts to. User events and timer completions go
/// through the same [`JourneySession::dispatch`] path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum SessionEvent {
    Digit(u8),
    Minus,
    Clear,
    Confirm,
    ReturnToElevator,
    Restart,
    ToggleMute,
    ToggleSettings,
    /// Raw slider or field value; malformed input clamps to 0.
    SetWeight(FloorType, String),
    RestoreDefaults,
    Tick(TimerId),
    SettleElapsed(TimerId),
}

/// What a dispatched event asks of the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub timers: SmallVec<[TimerCommand; 2]>,
    pub events: SmallVec<[JourneyEvent; 4]>,
}

/// Immutable view handed to the renderer after each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: GameStatus,
    /// Animated counter while moving, last arrival floor otherwise.
    pub floor: i32,
    pub current_floor: i32,
    pub displayed_floor: i32,
    pub target_floor: Option<i32>,
    pub floor_type: FloorType,
    pub input: String,
    pub notice: Option<Notice>,
    pub muted: bool,
    pub settings_open: bool,
    pub settling: bool,
    pub weights: ProbabilityConfig,
    pub percentages: [(FloorType, u32); 5],
}

/// High-level session wrapper binding a journey controller to the weight
/// table, the outcome RNG stream, and the audio gate.
#[derive(Debug, Clone)]
pub struct JourneySession<A = NullAudio> {
    controller: JourneyController,
    weights: ProbabilityConfig,
    rng: CountingRng<ChaCha8Rng>,
    audio: AudioGate<A>,
    settings_open: bool,
    seed: u64,
}

impl JourneySession<NullAudio> {
    /// Construct a silent session with default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(&ElevatorCfg::default(), seed, NullAudio)
    }
}

impl<A: AudioSink> JourneySession<A> {
    #[must_use]
    pub fn with_config(cfg: &ElevatorCfg, seed: u64, audio: A) -> Self {
        Self {
            controller: JourneyController::new(cfg),
            weights: cfg.weights,
            rng: CountingRng::outcome_stream(seed),
            audio: AudioGate::new(audio),
            settings_open: false,
            seed,
        }
    }

    /// Apply one event and perform its audio side effects.
    ///
    /// # Errors
    ///
    /// Returns the controller's [`JourneyError`] when the event is not
    /// permitted or the journey start is refused. Refusals are recovered
    /// locally: the snapshot carries the notice and the status is unchanged.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Dispatch, JourneyError> {
        let (dispatch, result) = self.dispatch_recorded(event);
        result.map(|()| dispatch)
    }

    /// Like [`Self::dispatch`], but hands back the timer commands and events
    /// a refused event still produced.
    pub fn dispatch_recorded(&mut self, event: SessionEvent) -> (Dispatch, Result<(), JourneyError>) {
        log::trace!(target: LOG_TARGET_SESSION, "dispatch {event:?}");
        let mut fx = Effects::new();
        let result = self.route(event, &mut fx);
        (self.apply_effects(fx), result)
    }

    fn route(&mut self, event: SessionEvent, fx: &mut Effects) -> Result<(), JourneyError> {
        match event {
            SessionEvent::Digit(digit) => self.controller.press_digit(digit, fx).map(drop),
            SessionEvent::Minus => self.controller.press_minus(fx).map(drop),
            SessionEvent::Clear => self.controller.clear_input(fx),
            SessionEvent::Confirm => self
                .controller
                .start_journey(&self.weights, &mut self.rng, fx)
                .map(drop),
            SessionEvent::ReturnToElevator => self.controller.return_to_elevator(fx),
            SessionEvent::Restart => self.controller.restart(fx),
            SessionEvent::ToggleMute => {
                let muted = self.audio.toggle_mute();
                log::debug!(target: LOG_TARGET_SESSION, "muted: {muted}");
                Ok(())
            }
            SessionEvent::ToggleSettings => {
                self.settings_open = !self.settings_open;
                fx.push(Effect::Play(crate::audio::AudioCue::Click));
                Ok(())
            }
            SessionEvent::SetWeight(kind, raw) => {
                let weight = parse_weight(&raw);
                self.weights.set_weight(kind, weight);
                log::debug!(target: LOG_TARGET_SESSION, "weight {kind} = {weight}");
                Ok(())
            }
            SessionEvent::RestoreDefaults => {
                self.weights.restore_defaults();
                fx.push(Effect::Play(crate::audio::AudioCue::Click));
                Ok(())
            }
            SessionEvent::Tick(id) => self.controller.on_tick(id, &mut self.rng, fx).map(drop),
            SessionEvent::SettleElapsed(id) => {
                self.controller.on_settle_elapsed(id, fx);
                Ok(())
            }
        }
    }

    fn apply_effects(&mut self, fx: Effects) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for effect in fx {
            match effect {
                Effect::Play(cue) => self.audio.play(cue),
                Effect::Stop(cue) => self.audio.stop(cue),
                Effect::Timer(command) => dispatch.timers.push(command),
                Effect::Event(event) => dispatch.events.push(event),
            }
        }
        dispatch
    }

    /// Cancel armed timers and reset the journey, leaving the weight table.
    /// The returned cancels must reach the driver.
    pub fn teardown(&mut self) -> Dispatch {
        let mut fx = Effects::new();
        self.controller.reset(&mut fx);
        self.apply_effects(fx)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let controller = &self.controller;
        SessionSnapshot {
            status: controller.status(),
            floor: controller.shown_floor(),
            current_floor: controller.current_floor(),
            displayed_floor: controller.displayed_floor(),
            target_floor: controller.target_floor(),
            floor_type: controller.floor_type(),
            input: controller.input().as_str().to_string(),
            notice: controller.notice().cloned(),
            muted: self.audio.muted(),
            settings_open: self.settings_open,
            settling: controller.is_settling(),
            weights: self.weights,
            percentages: self.weights.percentages(),
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &JourneyController {
        &self.controller
    }

    #[must_use]
    pub const fn weights(&self) -> &ProbabilityConfig {
        &self.weights
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Outcome draws consumed so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub const fn audio(&self) -> &A {
        self.audio.sink()
    }

    pub const fn audio_mut(&mut self) -> &mut A {
        self.audio.sink_mut()
    }

    /// Deterministically reseed the outcome stream.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = CountingRng::outcome_stream(seed);
    }
}
