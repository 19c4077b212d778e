use anyhow::Result;
use std::sync::Arc;

use elevator_game::{
    AudioCall, ElevatorCfg, FloorType, GameStatus, JourneyEvent, JourneySession,
    ProbabilityConfig, RecordingAudio, SessionEvent, SessionSnapshot, SimulatedDriver, TimerKind,
};

/// Upper bound on timer completions per `Settle` step. A journey across the
/// default range needs at most a few hundred.
pub const DEFAULT_MAX_FIRES: usize = 1_000;

/// One scripted action against a simulated session.
#[derive(Debug, Clone)]
pub enum PlanStep {
    /// Type keys on the keypad; unknown characters are skipped.
    Compose(String),
    Send(SessionEvent),
    /// Advance the virtual clock by this many milliseconds.
    Advance(u64),
    /// Fire timers until none are pending.
    Settle,
    /// Compose, confirm, and settle until the reveal.
    Journey(String),
    /// Run `count` journeys to `keys`, leaving each reveal before the next.
    Repeat { keys: String, count: usize },
    /// Re-deliver completions for every timer cancelled so far.
    ReplayCancelled,
    Teardown,
}

/// Deterministic script for one simulated session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub weights: Option<ProbabilityConfig>,
    pub steps: Vec<PlanStep>,
    pub max_fires: usize,
    pub expectations: Vec<SimulationExpectation>,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationPlan {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            weights: None,
            steps: Vec::new(),
            max_fires: DEFAULT_MAX_FIRES,
            expectations: Vec::new(),
        }
    }

    /// Start from this weight table instead of the configured one.
    #[must_use]
    pub const fn with_weights(mut self, weights: ProbabilityConfig) -> Self {
        self.weights = Some(weights);
        self
    }

    #[must_use]
    pub fn step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn journey(self, keys: &str) -> Self {
        self.step(PlanStep::Journey(keys.to_string()))
    }

    #[must_use]
    pub fn send(self, event: SessionEvent) -> Self {
        self.step(PlanStep::Send(event))
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulated session.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    /// Snapshot after each plan step, in order.
    pub snapshots: Vec<SessionSnapshot>,
    pub final_snapshot: SessionSnapshot,
    pub events: Vec<JourneyEvent>,
    /// Refused steps as `step index: error`.
    pub refusals: Vec<String>,
    pub stepped_floors: Vec<i32>,
    pub reveals: Vec<FloorType>,
    pub ticker_cancels: usize,
    pub settle_cancels: usize,
    pub stale_completions: usize,
    pub pending_timers: usize,
    pub elapsed_ms: u64,
    pub draws: u64,
    pub audio: Vec<AudioCall>,
}

impl SimulationSummary {
    #[must_use]
    pub fn reveal_count(&self, kind: FloorType) -> usize {
        self.reveals.iter().filter(|reveal| **reveal == kind).count()
    }

    /// Snapshot recorded after step `index`.
    #[must_use]
    pub fn after(&self, index: usize) -> Option<&SessionSnapshot> {
        self.snapshots.get(index)
    }
}

/// Headless deterministic runner for scripted sessions.
#[derive(Debug, Clone)]
pub struct GameTester {
    cfg: ElevatorCfg,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(cfg: ElevatorCfg, verbose: bool) -> Self {
        Self { cfg, verbose }
    }

    #[must_use]
    pub const fn config(&self) -> &ElevatorCfg {
        &self.cfg
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut cfg = self.cfg.clone();
        if let Some(weights) = plan.weights {
            cfg.weights = weights;
        }
        let session = JourneySession::with_config(&cfg, seed, RecordingAudio::default());
        let mut driver = SimulatedDriver::new(session);
        let mut snapshots = Vec::with_capacity(plan.steps.len());
        let mut refusals = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            if let Err(err) = run_step(&mut driver, step, plan.max_fires) {
                if self.verbose {
                    println!("     ↳ step {index} refused: {err}");
                }
                refusals.push(format!("{index}: {err}"));
            }
            snapshots.push(driver.session().snapshot());
        }

        summarize(&driver, seed, snapshots, refusals)
    }
}

fn run_step(
    driver: &mut SimulatedDriver<RecordingAudio>,
    step: &PlanStep,
    max_fires: usize,
) -> Result<()> {
    match step {
        PlanStep::Compose(keys) => driver.compose(keys)?,
        PlanStep::Send(event) => driver.send(event.clone())?,
        PlanStep::Advance(ms) => driver.advance(*ms)?,
        PlanStep::Settle => {
            driver.run_until_idle(max_fires)?;
        }
        PlanStep::Journey(keys) => {
            driver.compose(keys)?;
            driver.send(SessionEvent::Confirm)?;
            driver.run_until_idle(max_fires)?;
        }
        PlanStep::Repeat { keys, count } => {
            for _ in 0..*count {
                driver.compose(keys)?;
                driver.send(SessionEvent::Confirm)?;
                driver.run_until_idle(max_fires)?;
                let leave = match driver.session().snapshot().status {
                    GameStatus::GameOver => SessionEvent::Restart,
                    _ => SessionEvent::ReturnToElevator,
                };
                driver.send(leave)?;
            }
        }
        PlanStep::ReplayCancelled => {
            let cancelled = driver.clock().cancelled().to_vec();
            for (id, kind) in cancelled {
                driver.fire(kind, id)?;
            }
        }
        PlanStep::Teardown => driver.teardown(),
    }
    Ok(())
}

fn summarize(
    driver: &SimulatedDriver<RecordingAudio>,
    seed: u64,
    snapshots: Vec<SessionSnapshot>,
    refusals: Vec<String>,
) -> SimulationSummary {
    let events = driver.events().to_vec();
    let reveals = events
        .iter()
        .filter_map(|event| match event {
            JourneyEvent::Revealed { floor_type, .. } => Some(*floor_type),
            _ => None,
        })
        .collect();
    let stale_completions = events
        .iter()
        .filter(|event| matches!(event, JourneyEvent::StaleTimer { .. }))
        .count();
    let cancels = |kind: TimerKind| {
        driver
            .clock()
            .cancelled()
            .iter()
            .filter(|(_, cancelled)| *cancelled == kind)
            .count()
    };
    let session = driver.session();
    SimulationSummary {
        seed,
        snapshots,
        final_snapshot: session.snapshot(),
        stepped_floors: driver.stepped_floors(),
        reveals,
        ticker_cancels: cancels(TimerKind::Ticker),
        settle_cancels: cancels(TimerKind::Settle),
        stale_completions,
        pending_timers: driver.clock().pending(),
        elapsed_ms: driver.clock().now_ms(),
        draws: session.draws(),
        audio: session.audio().calls().to_vec(),
        events,
        refusals,
    }
}
