use anyhow::{Context, Result, ensure};

use super::TestScenario;
use crate::logic::{PlanStep, SimulationPlan, SimulationSummary};
use elevator_game::numbers::frequency;
use elevator_game::{
    AudioCall, AudioCue, FloorType, GameStatus, JourneyEvent, ProbabilityConfig, SessionEvent,
};

/// Journeys per iteration in the distribution scenario.
pub const DISTRIBUTION_JOURNEYS: usize = 2_000;
const DISTRIBUTION_TOLERANCE: f64 = 0.04;

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "smoke",
            "Travel to floor 5 and reveal an outcome",
            SimulationPlan::new()
                .journey("5")
                .with_expectation(smoke_expectation),
        ),
        TestScenario::new(
            "zero-distance",
            "Confirm the current floor and still resolve an arrival",
            SimulationPlan::new()
                .journey("1")
                .with_expectation(zero_distance_expectation),
        ),
        TestScenario::new(
            "keypad-journey",
            "Key in floor 4, confirm, and let the timers run out",
            SimulationPlan::new()
                .step(PlanStep::Compose("4".into()))
                .send(SessionEvent::Confirm)
                .step(PlanStep::Settle)
                .with_expectation(keypad_journey_expectation),
        ),
        TestScenario::new(
            "floor-range",
            "Refuse -4 and 101, accept the -3 boundary",
            SimulationPlan::new()
                .journey("-4")
                .journey("101")
                .journey("-3")
                .with_expectation(floor_range_expectation),
        ),
        TestScenario::new(
            "input-composition",
            "Cap composition at 3 characters with a leading minus only",
            SimulationPlan::new()
                .step(PlanStep::Compose("1234".into()))
                .send(SessionEvent::Clear)
                .step(PlanStep::Compose("-12".into()))
                .send(SessionEvent::Clear)
                .step(PlanStep::Compose("4-".into()))
                .with_expectation(input_composition_expectation),
        ),
        TestScenario::new(
            "bomb-gameover",
            "A bomb floor ends the game and only restart is accepted",
            SimulationPlan::new()
                .with_weights(ProbabilityConfig::only(FloorType::Bomb))
                .journey("3")
                .send(SessionEvent::Digit(1))
                .send(SessionEvent::ReturnToElevator)
                .send(SessionEvent::Restart)
                .with_expectation(bomb_gameover_expectation),
        ),
        TestScenario::new(
            "restart-keeps-weights",
            "Restart resets the journey but not the edited weight table",
            SimulationPlan::new()
                .with_weights(ProbabilityConfig::only(FloorType::Bomb))
                .send(SessionEvent::SetWeight(FloorType::Bomb, "60".into()))
                .journey("2")
                .send(SessionEvent::Restart)
                .with_expectation(restart_keeps_weights_expectation),
        ),
        TestScenario::new(
            "restore-defaults",
            "Restore defaults overwrites clamped and malformed edits",
            SimulationPlan::new()
                .send(SessionEvent::SetWeight(FloorType::Bomb, "100".into()))
                .send(SessionEvent::SetWeight(FloorType::Zombie, "abc".into()))
                .send(SessionEvent::SetWeight(FloorType::Normal, "250".into()))
                .send(SessionEvent::RestoreDefaults)
                .with_expectation(restore_defaults_expectation),
        ),
        TestScenario::new(
            "distribution",
            "Outcome frequencies track the default weight table",
            SimulationPlan::new()
                .step(PlanStep::Repeat {
                    keys: "2".into(),
                    count: DISTRIBUTION_JOURNEYS,
                })
                .with_expectation(distribution_expectation),
        ),
        TestScenario::new(
            "stale-timers",
            "Late completions for cancelled timers change nothing",
            SimulationPlan::new()
                .with_weights(ProbabilityConfig::only(FloorType::Cat))
                .journey("6")
                .step(PlanStep::ReplayCancelled)
                .send(SessionEvent::ReturnToElevator)
                .step(PlanStep::Compose("1".into()))
                .send(SessionEvent::Confirm)
                .step(PlanStep::Advance(500))
                .step(PlanStep::Teardown)
                .step(PlanStep::ReplayCancelled)
                .step(PlanStep::Advance(1_000))
                .with_expectation(stale_timers_expectation),
        ),
    ]
}

fn ensure_no_refusals(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.refusals.is_empty(),
        "unexpected refusals: {:?}",
        summary.refusals
    );
    Ok(())
}

fn ensure_revealed(summary: &SimulationSummary) -> Result<()> {
    let status = summary.final_snapshot.status;
    ensure!(
        matches!(status, GameStatus::Arrival | GameStatus::GameOver),
        "journey did not reveal, status {status}"
    );
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    ensure_revealed(summary)?;
    let snapshot = &summary.final_snapshot;
    ensure!(snapshot.floor == 5, "arrived at floor {}", snapshot.floor);
    ensure!(
        summary.stepped_floors == [2, 3, 4, 5],
        "unexpected display sequence {:?}",
        summary.stepped_floors
    );
    ensure!(
        summary.ticker_cancels == 1,
        "ticker cancelled {} times",
        summary.ticker_cancels
    );
    ensure!(summary.pending_timers == 0, "timers left armed");
    ensure!(
        summary.elapsed_ms == 900,
        "reveal took {}ms of simulated time",
        summary.elapsed_ms
    );
    let dings = summary
        .audio
        .iter()
        .filter(|call| **call == AudioCall::Play(AudioCue::Ding))
        .count();
    ensure!(dings == 1, "ding played {dings} times");
    ensure!(
        summary.audio.contains(&AudioCall::Stop(AudioCue::Moving)),
        "moving loop never stopped"
    );
    let reveal = AudioCall::Play(snapshot.floor_type.reveal_cue());
    ensure!(
        summary.audio.last() == Some(&reveal),
        "last cue was {:?}, expected {reveal:?}",
        summary.audio.last()
    );
    Ok(())
}

fn zero_distance_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    ensure_revealed(summary)?;
    ensure!(
        summary.stepped_floors.is_empty(),
        "display moved: {:?}",
        summary.stepped_floors
    );
    ensure!(summary.reveals.len() == 1, "expected a single reveal");
    ensure!(summary.ticker_cancels == 0, "no ticker should have been armed");
    ensure!(
        summary.elapsed_ms == 500,
        "reveal took {}ms of simulated time",
        summary.elapsed_ms
    );
    Ok(())
}

fn keypad_journey_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    ensure_revealed(summary)?;
    let departed = summary
        .events
        .iter()
        .find(|event| matches!(event, JourneyEvent::Departed { .. }));
    ensure!(
        departed == Some(&JourneyEvent::Departed { from: 1, target: 4 }),
        "unexpected departure {departed:?}"
    );
    let steps = summary
        .events
        .iter()
        .filter_map(JourneyEvent::stepped_floor)
        .collect::<Vec<_>>();
    ensure!(steps == [2, 3, 4], "unexpected steps {steps:?}");
    ensure!(
        matches!(
            summary.events.last(),
            Some(JourneyEvent::Revealed { floor: 4, .. })
        ),
        "journey ended on {:?}",
        summary.events.last()
    );
    ensure!(summary.draws > 0, "outcome drawn without randomness");
    ensure!(summary.pending_timers == 0, "timers left armed");
    Ok(())
}

fn floor_range_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.refusals.len() == 2,
        "expected two refusals, got {:?}",
        summary.refusals
    );
    for index in 0..2 {
        let snapshot = summary
            .after(index)
            .with_context(|| format!("missing snapshot {index}"))?;
        ensure!(snapshot.status == GameStatus::Input, "left input on refusal");
        ensure!(snapshot.input.is_empty(), "refused input not cleared");
        ensure!(snapshot.notice.is_some(), "refusal surfaced no notice");
    }
    ensure_revealed(summary)?;
    ensure!(
        summary.final_snapshot.floor == -3,
        "arrived at floor {}",
        summary.final_snapshot.floor
    );
    Ok(())
}

fn input_composition_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    let inputs: Vec<&str> = summary
        .snapshots
        .iter()
        .map(|snapshot| snapshot.input.as_str())
        .collect();
    ensure!(
        inputs == ["123", "", "-12", "", "4"],
        "unexpected composition sequence {inputs:?}"
    );
    Ok(())
}

fn bomb_gameover_expectation(summary: &SimulationSummary) -> Result<()> {
    let over = summary.after(0).context("missing journey snapshot")?;
    ensure!(over.status == GameStatus::GameOver, "status {}", over.status);
    ensure!(over.floor_type == FloorType::Bomb, "revealed {}", over.floor_type);
    ensure!(
        summary.refusals.len() == 2
            && summary.refusals[0].starts_with("1:")
            && summary.refusals[1].starts_with("2:"),
        "gameover accepted more than restart: {:?}",
        summary.refusals
    );
    let snapshot = &summary.final_snapshot;
    ensure!(snapshot.status == GameStatus::Input, "restart left {}", snapshot.status);
    ensure!(snapshot.floor == 1, "restart left floor {}", snapshot.floor);
    ensure!(snapshot.floor_type == FloorType::Normal, "floor type not reset");
    Ok(())
}

fn restart_keeps_weights_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    let over = summary.after(1).context("missing journey snapshot")?;
    ensure!(over.status == GameStatus::GameOver, "status {}", over.status);
    let snapshot = &summary.final_snapshot;
    ensure!(snapshot.status == GameStatus::Input, "restart left {}", snapshot.status);
    ensure!(snapshot.target_floor.is_none(), "target survived restart");
    let mut edited = ProbabilityConfig::only(FloorType::Bomb);
    edited.set_weight(FloorType::Bomb, 60);
    ensure!(
        snapshot.weights == edited,
        "weights changed by restart: {:?}",
        snapshot.weights
    );
    Ok(())
}

fn restore_defaults_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    let edited = summary.after(2).context("missing edit snapshot")?;
    ensure!(edited.weights.bomb == 100, "bomb weight {}", edited.weights.bomb);
    ensure!(edited.weights.zombie == 0, "malformed weight kept");
    ensure!(edited.weights.normal == 100, "weight not capped");
    let snapshot = &summary.final_snapshot;
    ensure!(
        snapshot.weights == ProbabilityConfig::default(),
        "defaults not restored: {:?}",
        snapshot.weights
    );
    let shares: Vec<u32> = snapshot.percentages.iter().map(|(_, pct)| *pct).collect();
    ensure!(shares == [10, 33, 20, 17, 20], "percentages {shares:?}");
    Ok(())
}

fn distribution_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    let samples = summary.reveals.len();
    ensure!(
        samples == DISTRIBUTION_JOURNEYS,
        "completed {samples} of {DISTRIBUTION_JOURNEYS} journeys"
    );
    let journeys = u64::try_from(samples)?;
    ensure!(
        summary.draws >= journeys,
        "{} draws for {journeys} journeys",
        summary.draws
    );
    let weights = ProbabilityConfig::default();
    let total = f64::from(weights.total());
    for (kind, weight) in weights.entries() {
        let expected = f64::from(weight) / total;
        let observed = frequency(summary.reveal_count(kind), samples);
        ensure!(
            (observed - expected).abs() <= DISTRIBUTION_TOLERANCE,
            "{kind} frequency drifted: expected {expected:.3}, observed {observed:.3}"
        );
    }
    Ok(())
}

fn stale_timers_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure_no_refusals(summary)?;
    let arrived = summary.after(0).context("missing arrival snapshot")?;
    let replayed = summary.after(1).context("missing replay snapshot")?;
    ensure!(arrived == replayed, "stale ticker changed the session");

    let settling = summary.after(5).context("missing settle snapshot")?;
    ensure!(settling.settling, "second journey was not settling");
    ensure!(
        summary.reveals == [FloorType::Cat],
        "torn-down journey revealed: {:?}",
        summary.reveals
    );
    ensure!(
        summary.stale_completions == 4,
        "expected 4 stale completions, got {}",
        summary.stale_completions
    );
    ensure!(
        summary.ticker_cancels == 2 && summary.settle_cancels == 1,
        "cancels: ticker {} settle {}",
        summary.ticker_cancels,
        summary.settle_cancels
    );
    ensure!(summary.pending_timers == 0, "timers left armed");
    let snapshot = &summary.final_snapshot;
    ensure!(snapshot.status == GameStatus::Input, "teardown left {}", snapshot.status);
    ensure!(snapshot.floor == 1, "teardown left floor {}", snapshot.floor);
    Ok(())
}
