use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "elevator-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_elevator-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("bomb-gameover"));
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_elevator-tester");
    let output_path = temp_path("smoke");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,zero-distance",
            "--iterations",
            "2",
            "--seeds",
            "1,phrase:lobby",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Elevator Roulette Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = report.as_array().expect("result array");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["passed"] == true));
    assert_eq!(results[0]["scenario_name"], "smoke");
    assert_eq!(results[0]["iterations_run"], 2);
}

#[test]
fn cli_skips_unknown_scenarios() {
    let exe = env!("CARGO_BIN_EXE_elevator-tester");
    let output_path = temp_path("unknown");
    let output = Command::new(exe)
        .args(["--scenarios", "penthouse", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario"));
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert_eq!(content.trim(), "[]");
}

#[test]
fn cli_rejects_bad_seed_tokens() {
    let exe = env!("CARGO_BIN_EXE_elevator-tester");
    let output = Command::new(exe)
        .args(["--seeds", "elevator", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized seed token"));
}

#[test]
fn cli_rejects_invalid_config_file() {
    let exe = env!("CARGO_BIN_EXE_elevator-tester");
    let config_path = temp_path("config.json");
    std::fs::write(&config_path, r#"{ "tick_ms": 0 }"#).expect("write config");
    let output = Command::new(exe)
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not load session configuration"));
}
