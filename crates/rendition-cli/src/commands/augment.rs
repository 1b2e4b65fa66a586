//! Augment command implementation
//!
//! Renders a single MIDI file and optionally writes its render report.

use anyhow::{Context, Result};
use colored::Colorize;
use rendition_backend_midi::{RenderReport, TrackStatus};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use super::loader::{load_engine, print_warnings};

/// Run the augment command
///
/// # Arguments
/// * `input` - Path to the source MIDI file
/// * `output` - Output path (default: `<stem>.rendition.mid` next to the input)
/// * `config_path` - Optional JSON configuration file
/// * `seed` - Seed override for this file
/// * `report` - Whether to write `<stem>.rendition.json` next to the output
///
/// # Returns
/// Exit code: 0 success
pub fn run(
    input: &str,
    output: Option<&str>,
    config_path: Option<&str>,
    seed: Option<u32>,
    report: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let input_path = Path::new(input);
    let output_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(input_path));

    println!("{} {}", "Augmenting:".cyan().bold(), input);

    let (engine, warnings) = load_engine(config_path)?;
    print_warnings(&warnings);

    let render_report = engine
        .render_file(input_path, &output_path, seed)
        .with_context(|| format!("Failed to render {}", input))?;

    print_track_lines(&render_report);

    if report {
        let report_path = report_path_for(&output_path);
        let json = render_report
            .to_json_pretty()
            .context("Failed to serialize render report")?;
        fs::write(&report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        println!("{} {}", "Report:".dimmed(), report_path.display());
    }

    println!(
        "{} {} (seed {}, {}ms)",
        "SUCCESS".green().bold(),
        output_path.display(),
        render_report.seed,
        start.elapsed().as_millis()
    );
    Ok(ExitCode::SUCCESS)
}

/// `<dir>/<stem>.rendition.mid` for an input `<dir>/<stem>.mid`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}.rendition.mid", stem))
}

/// `<dir>/<stem>.rendition.json` next to an output `<dir>/<stem>.mid`.
pub(crate) fn report_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(RenderReport::filename(&stem))
}

fn print_track_lines(report: &RenderReport) {
    for track in &report.tracks {
        let name = if track.name.is_empty() {
            format!("track {}", track.index)
        } else {
            track.name.clone()
        };
        match track.status {
            TrackStatus::Rendered => {
                let instrument = track
                    .resolution
                    .instrument()
                    .map(|i| i.canonical_name())
                    .unwrap_or("unknown");
                println!(
                    "  {} {} -> {} ({} intervals, {} articulations)",
                    "RENDERED".green(),
                    name,
                    instrument,
                    track.dynamics.len(),
                    track.articulations.len()
                );
            }
            TrackStatus::Unresolved => {
                println!("  {} {} (passed through)", "UNRESOLVED".yellow(), name);
            }
            TrackStatus::Empty => {
                println!("  {} {}", "EMPTY".dimmed(), name);
            }
        }
    }
}
