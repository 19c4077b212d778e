mod config;
mod logic;
mod scenario;
mod util;

use anyhow::{Context, Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use config::FileConfig;
use elevator_game::{
    AudioCue, ElevatorCfg, ElevatorEngine, GameStatus, JourneySession, RecordingAudio,
    SessionEvent, SessionRuntime,
};
use logic::{GameTester, LogicTester, ScenarioResult, resolve_seed_inputs};
use scenario::{get_scenario, list_scenarios, scenario_names};
use util::split_csv;

const REALTIME_SCENARIO: &str = "realtime-smoke";
const REALTIME_TARGET: &str = "5";
/// Extra wall-clock allowance on top of the expected travel and settle time.
const REALTIME_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Scripted sessions on simulated time (fast, deterministic)
    Logic,
    /// A session on the tokio runtime with real timers
    Realtime,
    /// Run both logic and realtime tests
    Both,
}

#[derive(Debug, Parser)]
#[command(name = "elevator-tester", version = "0.1.0")]
#[command(about = "Automated QA testing for Elevator Roulette journeys and outcome weights")]
struct Args {
    /// Test mode: logic (simulated time), realtime (tokio timers), or both
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, `all` for the full catalog)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or phrase:<words>)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario (logic mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON session configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let cfg = ElevatorEngine::new(FileConfig::new(args.config.as_deref()))
        .config()
        .context("could not load session configuration")?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    if args.verbose {
        let labels: Vec<String> = seed_infos.iter().map(logic::SeedInfo::label).collect();
        println!("🌱 Seeds: {}", labels.join(", "));
    }
    let game_tester = GameTester::new(cfg, args.verbose);

    let mut all_results = run_logic_scenarios(&args, &scenarios, &seeds, &game_tester);
    all_results.extend(run_realtime_scenarios(&args, &seeds, game_tester.config()).await);

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🛗 Elevator Roulette Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for name in scenario_names() {
            if !scenarios.iter().any(|s| s == name) {
                scenarios.push(name.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if !matches!(args.mode, TestMode::Logic | TestMode::Both) {
        return results;
    }

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

async fn run_realtime_scenarios(
    args: &Args,
    seeds: &[u64],
    cfg: &ElevatorCfg,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if !matches!(args.mode, TestMode::Realtime | TestMode::Both) {
        return results;
    }

    println!("{}", "⏱️  Running Realtime Tests".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    for &seed in seeds {
        let scenario_start = Instant::now();
        let outcome = realtime_journey(cfg, seed, REALTIME_TARGET).await;
        let duration = scenario_start.elapsed();
        match &outcome {
            Ok(()) => println!("✅ [seed {seed}] {REALTIME_SCENARIO} - {duration:?}"),
            Err(err) => eprintln!("❌ [seed {seed}] {REALTIME_SCENARIO} - {duration:?}: {err:#}"),
        }
        results.push(ScenarioResult::single(
            REALTIME_SCENARIO,
            seed,
            duration,
            outcome.map_err(|err| format!("{err:#}")),
        ));
    }

    results
}

/// Ride to `keys` on real tokio timers and check the reveal.
async fn realtime_journey(cfg: &ElevatorCfg, seed: u64, keys: &str) -> Result<()> {
    let target: i32 = keys.parse().context("realtime target is not a floor")?;
    let session = JourneySession::with_config(cfg, seed, RecordingAudio::default());
    let runtime = SessionRuntime::spawn(session);

    for key in keys.chars() {
        let event = match key {
            '-' => SessionEvent::Minus,
            digit => {
                let value = digit
                    .to_digit(10)
                    .and_then(|d| u8::try_from(d).ok())
                    .ok_or_else(|| anyhow!("unexpected key {digit:?}"))?;
                SessionEvent::Digit(value)
            }
        };
        runtime.send(event).await?;
    }
    runtime.send(SessionEvent::Confirm).await?;

    let budget = cfg.tick_period() * cfg.start_floor.abs_diff(target)
        + cfg.settle_delay()
        + REALTIME_SLACK;
    let snapshot = tokio::time::timeout(
        budget,
        runtime.wait_for(|s| matches!(s.status, GameStatus::Arrival | GameStatus::GameOver)),
    )
    .await
    .with_context(|| format!("no reveal within {budget:?}"))??;

    ensure!(snapshot.floor == target, "arrived at floor {}", snapshot.floor);
    ensure!(snapshot.target_floor == Some(target), "target lost on arrival");

    let session = runtime.shutdown().await?;
    let audio = session.audio();
    ensure!(audio.played(AudioCue::Ding) == 1, "ding did not play once");
    ensure!(
        audio.played(snapshot.floor_type.reveal_cue()) == 1,
        "reveal cue missing for {}",
        snapshot.floor_type
    );
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Elevator Roulette Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
