//! Batch command implementation
//!
//! Renders every MIDI file under a source directory into a destination
//! directory on a worker pool. A failing file is recorded and skipped; the
//! rest of the batch continues. Writes `rendition_summary.json` at the end.

use anyhow::{Context, Result};
use colored::Colorize;
use rayon::prelude::*;
use rendition_backend_midi::{Engine, TrackStatus};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::warn;
use walkdir::WalkDir;

use super::augment::report_path_for;
use super::loader::{load_engine, print_warnings};

/// Summary file written into the destination directory.
pub const SUMMARY_FILENAME: &str = "rendition_summary.json";

const MIDI_EXTENSIONS: &[&str] = &["mid", "midi"];

/// Result of rendering a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Path to the source file
    pub input: String,
    /// Path to the rendered file
    pub output: String,
    /// Whether the render succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Stable error code if failed
    pub error_code: Option<String>,
    /// Base seed of the render
    pub seed: Option<u32>,
    /// BLAKE3 hash of the rendered bytes
    pub output_hash: Option<String>,
    /// Tracks rendered / passed through unresolved
    pub rendered_tracks: usize,
    pub unresolved_tracks: usize,
    /// Render time in milliseconds
    pub duration_ms: u64,
}

/// Summary report for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub source_dir: String,
    pub dest_dir: String,
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    /// Worker threads used
    pub jobs: usize,
    /// Total runtime in seconds
    pub runtime_seconds: f64,
    pub files: Vec<FileResult>,
}

/// Run the batch command
///
/// # Arguments
/// * `source_dir` - Directory scanned recursively for MIDI files
/// * `dest_dir` - Directory receiving rendered files (same relative paths)
/// * `config_path` - Optional JSON configuration file
/// * `jobs` - Worker threads (0 = available parallelism)
/// * `reports` - Whether to write a render report next to each output
/// * `seed` - Seed override applied to every file
/// * `verbose` - Whether to print one line per file
///
/// # Returns
/// Exit code: 0 success, 1 if any file failed
pub fn run(
    source_dir: &str,
    dest_dir: &str,
    config_path: Option<&str>,
    jobs: usize,
    reports: bool,
    seed: Option<u32>,
    verbose: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let source = Path::new(source_dir);
    let dest = Path::new(dest_dir);

    if !source.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", source_dir);
    }

    println!("{}", "======================================".cyan());
    println!("{}", "  Rendition Batch".cyan());
    println!("{}", "======================================".cyan());
    println!();
    println!("{} {}", "Source directory:".blue().bold(), source_dir);
    println!("{} {}", "Output directory:".blue().bold(), dest_dir);
    if let Some(path) = config_path {
        println!("{} {}", "Configuration:".blue().bold(), path);
    }
    println!();

    let (engine, warnings) = load_engine(config_path)?;
    print_warnings(&warnings);

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create output directory: {}", dest_dir))?;

    let files = collect_midi_files(source);
    println!(
        "{} Found {} MIDI files to process",
        "INFO".blue().bold(),
        files.len()
    );
    println!();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start worker pool")?;
    let threads = pool.current_num_threads();

    let results: Vec<FileResult> = pool.install(|| {
        files
            .par_iter()
            .map(|input| process_file(&engine, source, dest, input, seed, reports))
            .collect()
    });

    let mut success_count = 0;
    let mut failure_count = 0;
    for result in &results {
        if result.success {
            success_count += 1;
            if verbose {
                println!(
                    "  {} {} ({}ms)",
                    "SUCCESS".green(),
                    result.input,
                    result.duration_ms
                );
            } else {
                print!("{}", ".".green());
            }
        } else {
            failure_count += 1;
            if verbose {
                println!(
                    "  {} {} - {}",
                    "FAILED".red(),
                    result.input,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            } else {
                print!("{}", "x".red());
            }
        }
    }
    if !verbose && !results.is_empty() {
        println!();
    }

    let summary = BatchSummary {
        source_dir: source_dir.to_string(),
        dest_dir: dest_dir.to_string(),
        total_files: results.len(),
        successful: success_count,
        failed: failure_count,
        jobs: threads,
        runtime_seconds: start.elapsed().as_secs_f64(),
        files: results,
    };

    print_summary(&summary);

    let summary_path = dest.join(SUMMARY_FILENAME);
    let summary_json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    fs::write(&summary_path, summary_json)
        .with_context(|| format!("Failed to write summary: {}", summary_path.display()))?;

    println!(
        "{} {}",
        "Summary report:".blue().bold(),
        summary_path.display()
    );

    if failure_count > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// MIDI files under `source`, sorted for a stable processing order.
pub fn collect_midi_files(source: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_midi_file(path))
        .collect();
    files.sort();
    files
}

fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| MIDI_EXTENSIONS.contains(&ext.as_str()))
}

/// Identity of a file in a batch: its path relative to the source
/// directory, without extension, with `/` separators (`act2/finale`).
pub fn file_identity(relative: &Path) -> String {
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Renders one file, turning any failure into a failed [`FileResult`].
fn process_file(
    engine: &Engine,
    source: &Path,
    dest: &Path,
    input: &Path,
    seed: Option<u32>,
    write_report: bool,
) -> FileResult {
    let start = Instant::now();
    let relative = input.strip_prefix(source).unwrap_or(input);
    let output = dest.join(relative);
    let identity = file_identity(relative);

    let mut result = FileResult {
        input: input.display().to_string(),
        output: output.display().to_string(),
        success: false,
        error: None,
        error_code: None,
        seed: None,
        output_hash: None,
        rendered_tracks: 0,
        unresolved_tracks: 0,
        duration_ms: 0,
    };

    match engine.render_file_with_identity(input, &output, &identity, seed) {
        Ok(report) => {
            result.seed = Some(report.seed);
            result.output_hash = report.output_hash.clone();
            result.rendered_tracks = report.count(TrackStatus::Rendered);
            result.unresolved_tracks = report.count(TrackStatus::Unresolved);
            result.success = true;

            if write_report {
                let report_path = report_path_for(&output);
                let written = report
                    .to_json_pretty()
                    .map_err(|e| e.to_string())
                    .and_then(|json| fs::write(&report_path, json).map_err(|e| e.to_string()));
                if let Err(e) = written {
                    result.success = false;
                    result.error = Some(format!("Failed to write report: {}", e));
                }
            }
        }
        Err(e) => {
            warn!(file = %input.display(), code = e.code(), "skipping file: {}", e);
            result.error_code = Some(e.code().to_string());
            result.error = Some(e.to_string());
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "======================================".cyan());
    println!("{}", "  Batch Summary".cyan());
    println!("{}", "======================================".cyan());
    println!();
    println!(
        "{} {}",
        "Total files processed:".blue().bold(),
        summary.total_files
    );
    println!("{} {}", "Successful:".green().bold(), summary.successful);
    println!("{} {}", "Failed:".red().bold(), summary.failed);
    println!("{} {}", "Worker threads:".blue().bold(), summary.jobs);
    println!(
        "{} {:.2}s",
        "Total runtime:".blue().bold(),
        summary.runtime_seconds
    );
    println!();

    let unresolved: usize = summary.files.iter().map(|f| f.unresolved_tracks).sum();
    if unresolved > 0 {
        println!(
            "{} {} tracks passed through with unresolved instruments",
            "INFO".yellow().bold(),
            unresolved
        );
        println!();
    }

    let failed: Vec<_> = summary.files.iter().filter(|f| !f.success).collect();
    if !failed.is_empty() {
        println!("{}", "Failed files:".red().bold());
        for result in failed {
            println!(
                "  - {}: {}",
                result.input,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }
}
