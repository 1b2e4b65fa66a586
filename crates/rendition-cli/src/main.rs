//! Rendition CLI - Command-line interface for MIDI performance augmentation
//!
//! This binary renders flat MIDI scores into performed renditions, one file
//! at a time or a whole directory in parallel, and validates configurations.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use rendition_cli::commands;

/// Rendition - Deterministic MIDI Performance Augmentation
#[derive(Parser)]
#[command(name = "rendition")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a single MIDI file
    Augment {
        /// Path to the source MIDI file
        input: String,

        /// Output path (default: <stem>.rendition.mid next to the input)
        #[arg(short, long)]
        output: Option<String>,

        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Seed override (default: configured seed, else derived from the file name)
        #[arg(long)]
        seed: Option<u32>,

        /// Write <stem>.rendition.json next to the output
        #[arg(long)]
        report: bool,
    },

    /// Render every MIDI file under a directory
    Batch {
        /// Directory scanned recursively for .mid/.midi files
        source_dir: String,

        /// Destination directory
        dest_dir: String,

        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Worker threads (default: available parallelism)
        #[arg(short, long, default_value_t = 0)]
        jobs: usize,

        /// Write a render report next to each output
        #[arg(long)]
        reports: bool,

        /// Seed override applied to every file
        #[arg(long)]
        seed: Option<u32>,
    },

    /// Validate a configuration and the tables it names
    Validate {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Articulation table to check instead of the configured one
        #[arg(long)]
        articulations: Option<String>,

        /// Percussion pitch table to check instead of the configured one
        #[arg(long)]
        percussion: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Augment {
            input,
            output,
            config,
            seed,
            report,
        } => commands::augment::run(&input, output.as_deref(), config.as_deref(), seed, report),
        Commands::Batch {
            source_dir,
            dest_dir,
            config,
            jobs,
            reports,
            seed,
        } => commands::batch::run(
            &source_dir,
            &dest_dir,
            config.as_deref(),
            jobs,
            reports,
            seed,
            cli.verbose,
        ),
        Commands::Validate {
            config,
            articulations,
            percussion,
        } => commands::validate::run(
            config.as_deref(),
            articulations.as_deref(),
            percussion.as_deref(),
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_augment() {
        let cli = Cli::try_parse_from([
            "rendition",
            "augment",
            "bolero.mid",
            "-o",
            "out/bolero.mid",
            "--seed",
            "42",
            "--report",
        ])
        .unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Augment {
                input,
                output,
                config,
                seed,
                report,
            } => {
                assert_eq!(input, "bolero.mid");
                assert_eq!(output.as_deref(), Some("out/bolero.mid"));
                assert!(config.is_none());
                assert_eq!(seed, Some(42));
                assert!(report);
            }
            _ => panic!("expected augment command"),
        }
    }

    #[test]
    fn test_cli_parses_batch_defaults() {
        let cli = Cli::try_parse_from(["rendition", "batch", "scores", "renditions"]).unwrap();
        match cli.command {
            Commands::Batch {
                source_dir,
                dest_dir,
                config,
                jobs,
                reports,
                seed,
            } => {
                assert_eq!(source_dir, "scores");
                assert_eq!(dest_dir, "renditions");
                assert!(config.is_none());
                assert_eq!(jobs, 0);
                assert!(!reports);
                assert!(seed.is_none());
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_cli_parses_batch_with_options() {
        let cli = Cli::try_parse_from([
            "rendition",
            "-v",
            "batch",
            "scores",
            "renditions",
            "--config",
            "rendition.json",
            "--jobs",
            "4",
            "--reports",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Batch {
                config,
                jobs,
                reports,
                ..
            } => {
                assert_eq!(config.as_deref(), Some("rendition.json"));
                assert_eq!(jobs, 4);
                assert!(reports);
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from([
            "rendition",
            "validate",
            "--config",
            "rendition.json",
            "--articulations",
            "articulations.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate {
                config,
                articulations,
                percussion,
            } => {
                assert_eq!(config.as_deref(), Some("rendition.json"));
                assert_eq!(articulations.as_deref(), Some("articulations.yaml"));
                assert!(percussion.is_none());
            }
            _ => panic!("expected validate command"),
        }
    }

    #[test]
    fn test_cli_rejects_negative_seed() {
        assert!(Cli::try_parse_from(["rendition", "augment", "a.mid", "--seed", "-1"]).is_err());
    }
}
