//! Integration tests for CLI argument handling
//!
//! Runs the built binary. Only `--lazy` runs against a fresh cache are
//! exercised end to end so no test touches the network.

use std::process::Command;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use usermap::{CacheStore, MappingRecord};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_usermap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute usermap")
}

/// Writes a cache file fetched an hour ago and returns its path
fn fresh_cache(temp_dir: &TempDir) -> String {
    let path = temp_dir.path().join("mapping.json");
    let record = MappingRecord::new(
        vec![
            ("cs1190001".to_string(), "Marie Curie".to_string()),
            ("ee1".to_string(), "Alan Turing".to_string()),
        ],
        Utc::now() - Duration::hours(1),
    );
    CacheStore::new(&path)
        .save(&record)
        .expect("Save should succeed");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("usermap"), "Help should mention usermap");
    assert!(stdout.contains("--lazy"), "Help should mention --lazy flag");
    assert!(stdout.contains("--cache-file"), "Help should mention --cache-file");
}

#[test]
fn test_zero_max_age_prints_error_and_exits() {
    let output = run_cli(&["--max-age-days", "0", "--cache-file", "/tmp/unused.json"]);
    assert_eq!(output.status.code(), Some(2), "Expected zero max age to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid max age"),
        "Should print error message about max age: {}",
        stderr
    );
}

#[test]
fn test_huge_max_age_is_rejected_without_panic() {
    let output = run_cli(&[
        "--max-age-days",
        "9223372036854775807",
        "--cache-file",
        "/tmp/unused.json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid max age"), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"), "stderr: {}", stderr);
}

#[test]
fn test_lazy_with_fresh_cache_prints_rendering() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = fresh_cache(&temp_dir);

    let output = run_cli(&["--lazy", "--cache-file", &cache_file]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "cs1190001 Marie Curie");
    assert_eq!(lines[1], "ee1       Alan Turing");
    assert_eq!(lines[2], "");
    assert!(lines[3].starts_with("Updated on "));
}

#[test]
fn test_lookup_known_id() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = fresh_cache(&temp_dir);

    let output = run_cli(&["--lazy", "--cache-file", &cache_file, "--lookup", "ee1"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Alan Turing\n");
}

#[test]
fn test_lookup_unknown_id_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = fresh_cache(&temp_dir);

    let output = run_cli(&["--lazy", "--cache-file", &cache_file, "--lookup", "nobody"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Unknown user id: nobody"), "stderr: {}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use usermap::cli::{Cli, CliError, RunConfig};

    #[test]
    fn test_cli_no_args_is_unconditional_refresh() {
        let cli = Cli::parse_from(["usermap"]);
        assert!(!cli.lazy);
    }

    #[test]
    fn test_cli_lazy_flag() {
        let cli = Cli::parse_from(["usermap", "--lazy"]);
        assert!(cli.lazy);
    }

    #[test]
    fn test_run_config_from_cli_negative_max_age() {
        let cli = Cli::parse_from(["usermap", "--max-age-days", "-1", "--cache-file", "x.json"]);
        let config = RunConfig::from_cli(&cli);
        assert!(matches!(config, Err(CliError::InvalidMaxAge(-1))));
    }
}
