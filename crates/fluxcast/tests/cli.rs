use std::fmt::Write as _;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

const CONFIG: &str = r#"
[smoothing]
frac = 0.05

[features]
rolling_window = 20

[windowing]
input_size = 10
output_size = 1

[split]
boundary = "examples"

[training]
epochs = 5
"#;

fn write_inputs(dir: &Path) -> Result<()> {
    let mut csv = String::from("mjd,flux,band\n");
    for i in 0..300 {
        let t = f64::from(i);
        let flux = 100.0 + 0.01 * t + 10.0 * (t * 0.01).sin();
        writeln!(csv, "{},{flux},g", 58_000.0 + t)?;
    }
    // Duplicate timestamp and a non-positive flux, both dropped by cleaning.
    csv.push_str("58000,5.0,g\n58400,-1.0,g\n");
    std::fs::write(dir.join("curve.csv"), csv)?;
    std::fs::write(dir.join("fluxcast.toml"), CONFIG)?;
    Ok(())
}

fn fluxcast(dir: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_fluxcast"))
        .current_dir(dir)
        .env_remove("FLUXCAST_CONFIG")
        .args(args)
        .output()?)
}

#[test]
fn prepare_exports_features_and_report() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;

    let output = fluxcast(
        dir.path(),
        &[
            "prepare",
            "--input",
            "curve.csv",
            "--config",
            "fluxcast.toml",
            "--export",
            "features.csv",
            "--report",
            "summary.json",
        ],
    )?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("windows"));

    let exported = std::fs::read_to_string(dir.path().join("features.csv"))?;
    let mut lines = exported.lines();
    assert_eq!(lines.next(), Some("time,flux,rolling_mean,rolling_std"));
    assert_eq!(lines.count(), 300 - 19);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json"))?)?;
    assert_eq!(summary["cleaning"]["duplicate_timestamps"], 1);
    assert_eq!(summary["cleaning"]["non_positive_flux"], 1);
    assert_eq!(summary["examples"], 300 - 19 - 10);
    Ok(())
}

#[test]
fn flags_override_config_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;

    let output = fluxcast(
        dir.path(),
        &[
            "prepare",
            "--input",
            "curve.csv",
            "--config",
            "fluxcast.toml",
            "--input-size",
            "5",
            "--report",
            "summary.json",
        ],
    )?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json"))?)?;
    assert_eq!(summary["shape"]["input_size"], 5);
    Ok(())
}

#[test]
fn forecast_reports_scores() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;

    let output = fluxcast(
        dir.path(),
        &[
            "forecast",
            "--input",
            "curve.csv",
            "--config",
            "fluxcast.toml",
            "--model",
            "persistence",
            "--horizon",
            "4",
            "--report",
            "forecast.json",
        ],
    )?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("forecast.json"))?)?;
    let evaluation = &report["evaluation"];
    assert_eq!(evaluation["model"], "persistence");
    assert!(evaluation["test_mse"]["flux"].is_number());
    assert_eq!(evaluation["recursive"]["horizon"], 4);
    Ok(())
}

#[test]
fn malformed_input_fails() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("bad.csv"), "mjd,flux\n1.0,2.0\n2.0,bright\n")?;

    let output = fluxcast(dir.path(), &["prepare", "--input", "bad.csv"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("flux"), "{stderr}");
    Ok(())
}
