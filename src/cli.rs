//! Command-line interface parsing for usermap
//!
//! This module handles parsing of CLI arguments using clap and resolves them
//! into a `RunConfig` with every path and duration spelled out, so nothing
//! further down has to look at the environment.

use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::default_cache_path;
use crate::data::DEFAULT_URL;
use crate::refresh::DEFAULT_MAX_AGE_DAYS;

/// Error types for CLI argument resolution
#[derive(Debug, Error)]
pub enum CliError {
    /// No home directory to put the cache under and no --cache-file given
    #[error("Cannot determine the home directory; pass --cache-file")]
    NoHomeDirectory,

    /// The maximum cache age is not a positive number of days, or too large
    #[error("Invalid max age: {0} days. Must be at least 1 and fit a duration")]
    InvalidMaxAge(i64),
}

/// usermap - Keep a local copy of the HPC user directory
#[derive(Parser, Debug)]
#[command(name = "usermap")]
#[command(about = "Fetch and cache the HPC user id to name mapping")]
#[command(version)]
pub struct Cli {
    /// Only fetch when the cached mapping is missing or older than --max-age-days
    ///
    /// Without this flag the mapping is always fetched again.
    #[arg(long)]
    pub lazy: bool,

    /// How many days a cached mapping stays fresh
    #[arg(
        long,
        value_name = "DAYS",
        default_value_t = DEFAULT_MAX_AGE_DAYS,
        allow_negative_numbers = true
    )]
    pub max_age_days: i64,

    /// Where to keep the cached mapping
    ///
    /// Defaults to ~/.local/share/userlib/mapping.json
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Address of the directory page
    #[arg(long, value_name = "URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Print only the name for this user id
    #[arg(long, value_name = "ID")]
    pub lookup: Option<String>,

    /// Log debug details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for one run, resolved from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Whether to honour the cache instead of always fetching
    pub lazy: bool,
    /// Maximum age of a cached mapping
    pub max_age: Duration,
    /// Cache file location
    pub cache_path: PathBuf,
    /// Directory page URL
    pub url: String,
    /// User id to look up, if any
    pub lookup: Option<String>,
    /// Whether debug logging was requested
    pub verbose: bool,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with every setting resolved
    /// * `Err(CliError)` if the max age is not positive or no cache path can be found
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.max_age_days < 1 {
            return Err(CliError::InvalidMaxAge(cli.max_age_days));
        }
        let max_age = Duration::try_days(cli.max_age_days)
            .ok_or(CliError::InvalidMaxAge(cli.max_age_days))?;

        let cache_path = match &cli.cache_file {
            Some(path) => path.clone(),
            None => default_cache_path().ok_or(CliError::NoHomeDirectory)?,
        };

        Ok(RunConfig {
            lazy: cli.lazy,
            max_age,
            cache_path,
            url: cli.url.clone(),
            lookup: cli.lookup.clone(),
            verbose: cli.verbose,
        })
    }

    /// Default `tracing` filter for this run
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "usermap=debug"
        } else {
            "usermap=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["usermap"]);
        assert!(!cli.lazy);
        assert_eq!(cli.max_age_days, 7);
        assert!(cli.cache_file.is_none());
        assert_eq!(cli.url, DEFAULT_URL);
        assert!(cli.lookup.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_all_flags() {
        let cli = Cli::parse_from([
            "usermap",
            "--lazy",
            "--max-age-days",
            "3",
            "--cache-file",
            "/tmp/mapping.json",
            "--url",
            "http://localhost/users.shtml",
            "--lookup",
            "cs1190001",
            "-v",
        ]);
        assert!(cli.lazy);
        assert_eq!(cli.max_age_days, 3);
        assert_eq!(cli.cache_file, Some(PathBuf::from("/tmp/mapping.json")));
        assert_eq!(cli.url, "http://localhost/users.shtml");
        assert_eq!(cli.lookup.as_deref(), Some("cs1190001"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_run_config_uses_explicit_cache_file() {
        let cli = Cli::parse_from([
            "usermap",
            "--cache-file",
            "/tmp/x.json",
            "--max-age-days",
            "2",
        ]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(config.max_age, Duration::days(2));
        assert_eq!(config.log_filter(), "usermap=info");
    }

    #[test]
    fn test_run_config_default_cache_path() {
        let cli = Cli::parse_from(["usermap"]);
        match RunConfig::from_cli(&cli) {
            Ok(config) => assert!(config
                .cache_path
                .ends_with(".local/share/userlib/mapping.json")),
            Err(err) => assert!(matches!(err, CliError::NoHomeDirectory)),
        }
    }

    #[test]
    fn test_run_config_rejects_non_positive_max_age() {
        for days in ["0", "-4"] {
            let cli = Cli::parse_from([
                "usermap",
                "--cache-file",
                "/tmp/x.json",
                "--max-age-days",
                days,
            ]);
            let result = RunConfig::from_cli(&cli);
            assert!(matches!(result, Err(CliError::InvalidMaxAge(_))));
        }
    }

    #[test]
    fn test_run_config_rejects_out_of_range_max_age() {
        let days = i64::MAX.to_string();
        let cli = Cli::parse_from([
            "usermap",
            "--cache-file",
            "/tmp/x.json",
            "--max-age-days",
            days.as_str(),
        ]);
        let result = RunConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidMaxAge(i64::MAX))));
    }

    #[test]
    fn test_verbose_raises_log_filter() {
        let cli = Cli::parse_from(["usermap", "--cache-file", "/tmp/x.json", "--verbose"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.log_filter(), "usermap=debug");
    }
}
