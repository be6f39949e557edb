//! Integration tests for argument handling of the `weather` binary.
//!
//! Only paths that exit before any network or config access are exercised.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_weather"))
        .args(args)
        .output()
        .expect("Failed to execute weather")
}

#[test]
fn test_help_lists_subcommands() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("show"), "Help should mention show");
    assert!(stdout.contains("interactive"), "Help should mention interactive");
    assert!(stdout.contains("configure"), "Help should mention configure");
}

#[test]
fn test_show_requires_city() {
    let output = run_cli(&["show"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<CITY>"), "Should name the missing argument: {stderr}");
}

#[test]
fn test_invalid_units_prints_error_and_exits() {
    let output = run_cli(&["show", "Berlin", "--units", "kelvin"]);
    assert!(!output.status.success(), "Expected invalid units to fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown unit system"),
        "Should explain the invalid unit: {stderr}"
    );
}

#[test]
fn test_version_flag() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("weather"));
}
