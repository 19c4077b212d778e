use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};
use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

impl ScenarioResult {
    /// Result for a single run measured outside the simulated tester.
    #[must_use]
    pub fn single(name: &str, seed: u64, duration: Duration, outcome: Result<(), String>) -> Self {
        let passed = outcome.is_ok();
        Self {
            scenario_name: name.to_string(),
            seed,
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: outcome.err().into_iter().collect(),
            average_duration: duration,
            performance_data: vec![duration],
        }
    }
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.name.bright_white(),
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let verbose = self.tester.verbose();
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = self.tester.run_plan(plan, iteration_seed);

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_session(&summary);
                failures.push(format!(
                    "Iteration {} (seed {}): {} | {}",
                    i + 1,
                    summary.seed,
                    err,
                    context
                ));

                if verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ {context}");
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) reveals:{} sim-time:{}ms",
                        i + 1,
                        iterations,
                        summary.reveals.len(),
                        summary.elapsed_ms
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

fn summarize_session(summary: &SimulationSummary) -> String {
    let snapshot = &summary.final_snapshot;
    let reveals = if summary.reveals.is_empty() {
        "no reveals".to_string()
    } else {
        summary
            .reveals
            .iter()
            .rev()
            .take(3)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "status {} floor {} | last reveals: {} | refusals {} | sim-time {}ms",
        snapshot.status,
        snapshot.floor,
        reveals,
        summary.refusals.len(),
        summary.elapsed_ms
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
