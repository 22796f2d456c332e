use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn valid_config_json() -> &'static str {
    r#"
{
  "version": 1,
  "theme": "dark",
  "time_format": "24h",
  "weather_text": "18°C",
  "notification_duration_ms": 3000
}
"#
}

#[test]
fn diagnostics_succeeds_with_valid_config() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("widget.json");
    fs::write(&config, valid_config_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--diagnostics")
        .arg("--config")
        .arg(config)
        .arg("--timing-source")
        .arg("simulated")
        .arg("--start-at")
        .arg("2026-02-07T07:29:58")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected timing source: SIMULATED"));
}

#[test]
fn malformed_json_fails_with_clear_error() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("widget.json");
    fs::write(&config, "{ not-valid-json ").expect("write invalid json");

    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--config")
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn simulated_mode_requires_start_time() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--timing-source")
        .arg("simulated")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "simulated timing source requires --start-at",
        ));
}

#[test]
fn headless_alarm_rings_exactly_once() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--timing-source")
        .arg("simulated")
        .arg("--start-at")
        .arg("2026-02-07T07:29:58")
        .arg("--alarm")
        .arg("07:30")
        .arg("--steps")
        .arg("30")
        .assert()
        .success()
        .stdout(predicate::str::contains("notify [info] 🔔 Alarm is ringing!"))
        .stdout(predicate::function(|out: &str| {
            out.matches("alarm ringing for 07:30").count() == 1
        }))
        .stdout(predicate::str::contains("alarms_fired=1"));
}

#[test]
fn headless_stopwatch_accumulates_across_pauses() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--timing-source")
        .arg("simulated")
        .arg("--start-at")
        .arg("2026-02-07T12:00:00")
        .arg("--steps")
        .arg("10")
        .args(["--action", "1:start", "--action", "6:stop"])
        .args(["--action", "7:start", "--action", "10:stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopwatch=00:00:08"));
}

#[test]
fn unknown_theme_keeps_previous_theme() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--timing-source")
        .arg("simulated")
        .arg("--start-at")
        .arg("2026-02-07T12:00:00")
        .arg("--theme")
        .arg("light")
        .arg("--steps")
        .arg("2")
        .args(["--action", "1:theme=neon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown theme 'neon'"))
        .stdout(predicate::str::contains("theme=light"));
}

#[test]
fn json_output_emits_tagged_updates() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--json")
        .arg("--timing-source")
        .arg("simulated")
        .arg("--start-at")
        .arg("2026-02-07T12:00:00")
        .arg("--steps")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"clock""#))
        .stdout(predicate::str::contains(r#""kind":"summary""#));
}

#[test]
fn invalid_alarm_flag_is_rejected() {
    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--alarm")
        .arg("7:3")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid alarm time '7:3'"));
}

#[test]
fn system_diagnostics_reports_tick_drift() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("widget.json");
    fs::write(&config, r#"{ "version": 1, "tick_period_ms": 20 }"#).expect("write json");

    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--diagnostics")
        .arg("--config")
        .arg(config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected timing source: SYSTEM_CLOCK"))
        .stdout(predicate::str::contains("Worst per-tick drift"));
}

#[test]
fn slow_tick_period_in_config_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("widget.json");
    fs::write(
        &config,
        r#"{ "version": 1, "tick_period_ms": 120000, "alarm": "07:30" }"#,
    )
    .expect("write json");

    let mut cmd = cargo_bin_cmd!("analogwatch");
    cmd.arg("--headless")
        .arg("--config")
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_period_ms must be at most 1000 ms"));
}
