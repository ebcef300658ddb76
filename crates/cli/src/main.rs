//! `dbmigrate`: loads a migration configuration file, builds the
//! environment-backed connection registry, runs the Orchestrator, and
//! prints the resulting report as JSON (spec §6).

mod error_presentation;
mod registry;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dbmigrate_core::MigrationConfig;

use crate::error_presentation::{CliError, CliResult, render_runtime_error};
use crate::registry::EnvConnectionRegistry;

/// Cross-RDBMS schema-and-data migration engine.
#[derive(Parser)]
#[command(name = "dbmigrate", version, about)]
struct Cli {
    /// Path to a migration configuration file (`.json`, `.yaml`, or `.yml`).
    #[arg(long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let registry = EnvConnectionRegistry::new();

    let (report, errors) = dbmigrate_core::migrate(&config, &registry);
    if !errors.is_empty() {
        return Err(CliError::Migration(errors));
    }

    let json = serde_json::to_string_pretty(&report).expect("a MigrationReport always serializes");
    println!("{json}");
    Ok(())
}

fn load_config(path: &Path) -> CliResult<MigrationConfig> {
    let contents = fs::read_to_string(path).map_err(|source| CliError::ReadFile { path: path.to_path_buf(), source })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&contents).map_err(|source| CliError::ParseYaml { path: path.to_path_buf(), source }),
        _ => serde_json::from_str(&contents).map_err(|source| CliError::ParseJson { path: path.to_path_buf(), source }),
    }
}
