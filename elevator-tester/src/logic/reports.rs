use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

fn success_rate(passed: usize, total: usize) -> f64 {
    elevator_game::numbers::frequency(passed, total) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Elevator Roulette Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(
            out,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 3 (seed 1339): boom".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    fn render(f: impl Fn(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures() {
        colored::control::set_override(false);
        let results = [sample_result(true), sample_result(false)];
        let text = render(|out| generate_console_report(out, &results, Duration::from_secs(1)));
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("boom"));
        assert!(text.contains("Fastest: smoke"));
    }

    #[test]
    fn console_report_handles_no_results() {
        let text = render(|out| generate_console_report(out, &[], Duration::ZERO));
        assert!(text.contains("Success rate: 0.0%"));
        assert!(!text.contains("Performance Summary"));
    }

    #[test]
    fn json_report_is_an_array() {
        let results = [sample_result(true)];
        let text = render(|out| generate_json_report(out, &results));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "smoke");
        assert_eq!(parsed[0]["seed"], 1337);
    }

    #[test]
    fn markdown_report_marks_status() {
        let results = [sample_result(false)];
        let text = render(|out| generate_markdown_report(out, &results));
        assert!(text.starts_with("# Elevator Roulette Test Results"));
        assert!(text.contains("### ❌ smoke (seed 1337)"));
        assert!(text.contains("  - Iteration 3"));
    }
}
