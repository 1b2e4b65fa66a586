//! Render reports.
//!
//! A report records every decision a render made for one file: the seed,
//! the tempo map before and after perturbation, and per track the resolved
//! instrument, dynamics intervals, and articulation regions.

use serde::Serialize;

use crate::articulation::ArticulationLabel;
use crate::dynamics::DynamicAssignment;
use crate::normalize::Resolution;
use crate::score::TempoMap;

/// Report schema version.
pub const REPORT_VERSION: u32 = 1;

/// What happened to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Dynamics, velocities, and articulations were applied.
    Rendered,
    /// The instrument did not resolve; the track passed through unchanged.
    Unresolved,
    /// The track has no notes; it passed through unchanged.
    Empty,
}

/// An articulation region realized in a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticulationRegion {
    /// Region start in seconds.
    pub start: f64,
    /// Tick of the emitted control change.
    pub tick: u64,
    pub label: ArticulationLabel,
}

/// Per-track section of a [`RenderReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub index: usize,
    /// Raw track name.
    pub name: String,
    pub resolution: Resolution,
    pub status: TrackStatus,
    /// Number of notes in the track.
    pub notes: usize,
    /// Track span in seconds.
    pub duration: f64,
    pub dynamics: Vec<DynamicAssignment>,
    pub articulations: Vec<ArticulationRegion>,
}

impl TrackReport {
    /// A report for a track that was passed through.
    pub fn pass_through(
        index: usize,
        name: &str,
        resolution: Resolution,
        status: TrackStatus,
        notes: usize,
    ) -> Self {
        Self {
            index,
            name: name.to_string(),
            resolution,
            status,
            notes,
            duration: 0.0,
            dynamics: Vec::new(),
            articulations: Vec::new(),
        }
    }
}

/// Report for one rendered score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    /// Report schema version (always 1).
    pub report_version: u32,
    /// File identity, when rendered from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Hex-encoded BLAKE3 hash of the input bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    /// Hex-encoded BLAKE3 hash of the output bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    /// Base seed of the render.
    pub seed: u32,
    pub tempo_before: TempoMap,
    pub tempo_after: TempoMap,
    pub tracks: Vec<TrackReport>,
    /// Backend identifier and version.
    pub backend_version: String,
}

impl RenderReport {
    /// Serializes the report to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Standard report filename for a score stem.
    ///
    /// # Example
    ///
    /// ```
    /// use rendition_backend_midi::report::RenderReport;
    ///
    /// assert_eq!(RenderReport::filename("bolero"), "bolero.rendition.json");
    /// ```
    pub fn filename(stem: &str) -> String {
        format!("{}.rendition.json", stem)
    }

    /// Number of tracks with the given status.
    pub fn count(&self, status: TrackStatus) -> usize {
        self.tracks.iter().filter(|t| t.status == status).count()
    }

    /// Reports of tracks whose instrument did not resolve.
    pub fn unresolved(&self) -> impl Iterator<Item = &TrackReport> {
        self.tracks
            .iter()
            .filter(|t| t.status == TrackStatus::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendition_spec::InstrumentId;

    fn report() -> RenderReport {
        RenderReport {
            report_version: REPORT_VERSION,
            file: Some("etude".to_string()),
            input_hash: None,
            output_hash: None,
            seed: 42,
            tempo_before: TempoMap::default(),
            tempo_after: TempoMap::constant(118.5),
            tracks: vec![
                TrackReport::pass_through(
                    0,
                    "Weird Synth 3",
                    Resolution::Unknown,
                    TrackStatus::Unresolved,
                    12,
                ),
                TrackReport::pass_through(
                    1,
                    "Violin",
                    Resolution::Known(InstrumentId::Program(40)),
                    TrackStatus::Rendered,
                    30,
                ),
            ],
            backend_version: "test".to_string(),
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.count(TrackStatus::Rendered), 1);
        assert_eq!(report.count(TrackStatus::Empty), 0);
        let names: Vec<&str> = report.unresolved().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Weird Synth 3"]);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&report().to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["report_version"], 1);
        assert_eq!(json["seed"], 42);
        assert_eq!(json["tempo_after"][0]["bpm"], 118.5);
        assert_eq!(json["tracks"][0]["resolution"], "unknown");
        assert_eq!(json["tracks"][0]["status"], "unresolved");
        assert_eq!(json["tracks"][1]["resolution"]["known"]["program"], 40);
        assert!(json.get("input_hash").is_none());
    }
}
