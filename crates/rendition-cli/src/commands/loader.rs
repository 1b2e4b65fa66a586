//! Shared configuration and engine loading for commands.

use anyhow::{Context, Result};
use colored::Colorize;
use rendition_backend_midi::Engine;
use rendition_spec::{RenditionConfig, ValidationWarning};
use std::path::Path;

/// Loads the configuration at `config_path` (or the defaults) and builds an engine.
///
/// Any error here is fatal for the whole run: a bad configuration or table
/// would corrupt every output.
pub(crate) fn load_engine(config_path: Option<&str>) -> Result<(Engine, Vec<ValidationWarning>)> {
    let (config, warnings) = match config_path {
        Some(path) => RenditionConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load configuration: {}", path))?,
        None => {
            let config = RenditionConfig::default();
            let warnings = config.validated()?;
            (config, warnings)
        }
    };
    let engine = Engine::from_config(config).context("Failed to load rendition tables")?;
    Ok((engine, warnings))
}

pub(crate) fn print_warnings(warnings: &[ValidationWarning]) {
    for warning in warnings {
        println!("  {} {}", "WARNING".yellow().bold(), warning);
    }
}
