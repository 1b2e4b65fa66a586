//! Rendition MIDI Backend - Deterministic Performance Augmentation
//!
//! This crate turns a flat MIDI score into a "performed" rendition: it
//! perturbs the tempo map, partitions each track into intervals, assigns
//! dynamic levels with occasional crescendo/diminuendo ramps, redraws note
//! velocities from the matching velocity bands, and encodes sampled
//! articulations as control changes.
//!
//! # Determinism
//!
//! Given the same input bytes, configuration, and seed, the output is
//! byte-identical. Every random stream is a PCG32 seeded through BLAKE3
//! derivation from the file seed, the track index, and a component key, so
//! tracks and components never share RNG state and batch results do not
//! depend on scheduling.
//!
//! # Example
//!
//! ```ignore
//! use rendition_backend_midi::Engine;
//! use rendition_spec::RenditionConfig;
//!
//! let engine = Engine::from_config(RenditionConfig::default())?;
//! let report = engine.render_file("in/bolero.mid".as_ref(), "out/bolero.mid".as_ref(), None)?;
//! println!("seed {} rendered {} tracks", report.seed, report.tracks.len());
//! ```
//!
//! # Module Structure
//!
//! - [`score`]: In-memory score model and tempo map
//! - [`midi`]: SMF reader and writer
//! - [`normalize`]: Instrument name resolution
//! - [`partition`]: Interval partitioning
//! - [`dynamics`]: Dynamic level assignment
//! - [`velocity`]: Velocity synthesis
//! - [`tempo`]: Tempo perturbation
//! - [`articulation`]: Articulation sampling
//! - [`engine`]: Orchestration
//! - [`report`]: Render reports

pub mod articulation;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod midi;
pub mod normalize;
pub mod partition;
pub mod report;
pub mod rng;
pub mod score;
pub mod tempo;
pub mod velocity;

// Re-export main types
pub use articulation::{ArticulationLabel, ArticulationSampler};
pub use dynamics::{DynamicAssignment, RampState};
pub use engine::{Engine, Rendition};
pub use error::{MidiError, MidiResult};
pub use midi::{parse_score, write_score};
pub use normalize::{Normalizer, Resolution};
pub use partition::Interval;
pub use report::{RenderReport, TrackReport, TrackStatus};
pub use score::{Note, Score, TempoEvent, TempoMap, Track};

/// Crate version for backend identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend identifier recorded in reports.
pub const BACKEND_ID: &str = "rendition-backend-midi";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_backend_id() {
        assert_eq!(BACKEND_ID, "rendition-backend-midi");
    }
}
