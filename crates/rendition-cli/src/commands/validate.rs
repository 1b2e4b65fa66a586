//! Validate command implementation
//!
//! Loads a configuration and the tables it names without rendering anything.

use anyhow::{Context, Result};
use colored::Colorize;
use rendition_backend_midi::Engine;
use rendition_spec::{ArticulationTable, PercussionTable, RenditionConfig, RenditionError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

/// Run the validate command
///
/// # Arguments
/// * `config_path` - Optional JSON configuration file (default configuration otherwise)
/// * `articulations` - Articulation table to check instead of the configured one
/// * `percussion` - Percussion pitch table to check instead of the configured one
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(
    config_path: Option<&str>,
    articulations: Option<&str>,
    percussion: Option<&str>,
) -> Result<ExitCode> {
    let start = Instant::now();

    println!(
        "{} {}",
        "Validating:".cyan().bold(),
        config_path.unwrap_or("default configuration")
    );

    let mut config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration: {}", path))?;
            let mut config = RenditionConfig::from_json_str(&text)
                .with_context(|| format!("Failed to parse configuration: {}", path))?;
            if let Some(base) = Path::new(path).parent() {
                config.resolve_paths(base);
            }
            config
        }
        None => RenditionConfig::default(),
    };
    if let Some(path) = articulations {
        config.articulation.table = Some(PathBuf::from(path));
    }
    if let Some(path) = percussion {
        config.percussion_table = Some(PathBuf::from(path));
    }

    let warnings = match config.validated() {
        Ok(warnings) => warnings,
        Err(e) => return Ok(report_failure(&e, start)),
    };
    for warning in &warnings {
        println!("  {} {}", "WARNING".yellow().bold(), warning);
    }

    if let Some(path) = &config.articulation.table {
        println!("{} {}", "Articulation table:".dimmed(), path.display());
        if let Err(e) = ArticulationTable::load(path) {
            return Ok(report_failure(&e, start));
        }
    }
    if let Some(path) = &config.percussion_table {
        println!("{} {}", "Percussion table:".dimmed(), path.display());
        if let Err(e) = PercussionTable::load(path) {
            return Ok(report_failure(&e, start));
        }
    }

    let engine = match Engine::from_config(config) {
        Ok(engine) => engine,
        Err(e) => return Ok(report_failure(&e, start)),
    };

    println!(
        "{} {} instruments with articulation distributions",
        "INFO".blue().bold(),
        engine.articulations().len()
    );
    println!(
        "{} {} dynamic levels, intervals {}s..{}s",
        "INFO".blue().bold(),
        engine.config().dynamics.levels.len(),
        engine.config().intervals.min_len,
        engine.config().intervals.max_len
    );
    println!(
        "{} ({} warnings, {}ms)",
        "VALID".green().bold(),
        warnings.len(),
        start.elapsed().as_millis()
    );
    Ok(ExitCode::SUCCESS)
}

fn report_failure(error: &RenditionError, start: Instant) -> ExitCode {
    match error {
        RenditionError::InvalidConfigurationRange(errors) => {
            for e in errors {
                println!("  {} {}", "ERROR".red().bold(), e);
            }
        }
        other => println!("  {} [{}] {}", "ERROR".red().bold(), other.code(), other),
    }
    println!(
        "{} ({}ms)",
        "INVALID".red().bold(),
        start.elapsed().as_millis()
    );
    ExitCode::from(1)
}
