//! usermap - Keep a local copy of the HPC user directory
//!
//! Fetches the directory page, saves the parsed mapping and prints it. With
//! `--lazy` the cached mapping is used until it is older than the max age.

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use usermap::cli::{Cli, RunConfig};
use usermap::{CacheStore, HttpSource, RefreshError, RefreshPolicy};

/// Installs the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn setup_tracing(config: &RunConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(2);
        }
    };
    setup_tracing(&config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Produces the mapping and prints it, or the looked up name
fn run(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = CacheStore::new(&config.cache_path);
    let mut policy = RefreshPolicy::new(HttpSource::new(&config.url), store);

    let result = if config.lazy {
        policy.get_current(config.max_age)
    } else {
        policy.refresh()
    };

    let record = match result {
        Ok(record) => record,
        // The fetched mapping is still good to print.
        Err(RefreshError::Persist { record, source }) => {
            warn!("Fetched mapping could not be saved: {}", source);
            *record
        }
        Err(err) => return Err(err.into()),
    };

    match &config.lookup {
        Some(id) => match record.name_for(id) {
            Some(name) => println!("{}", name),
            None => return Err(format!("Unknown user id: {}", id).into()),
        },
        None => print!("{}", record),
    }

    Ok(())
}
