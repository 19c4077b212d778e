//! Elevator Roulette Game Engine
//!
//! Platform-agnostic core for the Elevator Roulette arcade toy: a journey
//! state machine that carries a virtual elevator to a chosen floor and a
//! weighted selector that decides what waits there. Rendering, animation, and
//! audio playback stay outside this crate.

pub mod audio;
pub mod config;
pub mod constants;
pub mod driver;
pub mod floor;
pub mod input;
pub mod journey;
pub mod numbers;
pub mod probability;
pub mod rng;
#[cfg(feature = "async")]
pub mod runtime;
pub mod selector;

// Re-export commonly used types
pub use audio::{AudioCall, AudioCue, AudioGate, AudioSink, NullAudio, RecordingAudio};
pub use config::{ElevatorCfg, ElevatorConfigError, FloorRange};
pub use driver::{SimulatedDriver, VirtualClock};
pub use floor::FloorType;
pub use input::{FloorInput, FloorInputError, parse_target_floor};
pub use journey::{
    Dispatch, Effect, Effects, GameStatus, JourneyAction, JourneyController, JourneyError,
    JourneyEvent, JourneySession, Notice, SessionEvent, SessionSnapshot, TimerCommand, TimerId,
    TimerKind, TimerLedger,
};
pub use probability::{ProbabilityConfig, ProbabilityError, parse_weight};
pub use rng::{CountingRng, derive_stream_seed};
#[cfg(feature = "async")]
pub use runtime::{RuntimeError, SessionRuntime};
pub use selector::{DrawTrace, SelectorError, draw_floor_type, pick_for_roll};

/// Trait for abstracting configuration loading
/// Platform-specific implementations should provide this
pub trait ConfigLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the session configuration from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<ElevatorCfg, Self::Error>;
}

/// Loader that always yields the built-in defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl ConfigLoader for DefaultConfig {
    type Error = std::convert::Infallible;

    fn load_config(&self) -> Result<ElevatorCfg, Self::Error> {
        Ok(ElevatorCfg::default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError<E: std::error::Error + 'static> {
    #[error("failed to load configuration")]
    Load(#[source] E),
    #[error(transparent)]
    Invalid(#[from] ElevatorConfigError),
}

/// Main game engine for creating sessions from a shared configuration source
pub struct ElevatorEngine<L>
where
    L: ConfigLoader,
{
    loader: L,
}

impl<L> ElevatorEngine<L>
where
    L: ConfigLoader,
{
    /// Create a new game engine with the provided configuration loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails validation.
    pub fn config(&self) -> Result<ElevatorCfg, EngineError<L::Error>> {
        let cfg = self.loader.load_config().map_err(EngineError::Load)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Create a silent session with the specified seed
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails validation.
    pub fn create_session(&self, seed: u64) -> Result<JourneySession, EngineError<L::Error>> {
        self.create_session_with_audio(seed, NullAudio)
    }

    /// Construct a session that plays cues through `audio`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails validation.
    pub fn create_session_with_audio<A: AudioSink>(
        &self,
        seed: u64,
        audio: A,
    ) -> Result<JourneySession<A>, EngineError<L::Error>> {
        let cfg = self.config()?;
        log::debug!(
            target: constants::LOG_TARGET_SESSION,
            "new session seed={seed} tick={}ms settle={}ms",
            cfg.tick_ms,
            cfg.settle_ms
        );
        Ok(JourneySession::with_config(&cfg, seed, audio))
    }
}
