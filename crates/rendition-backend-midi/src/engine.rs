//! The condition generation engine.
//!
//! An [`Engine`] holds the validated configuration and the read-only tables
//! for a run. Rendering a score perturbs its tempo map once, then processes
//! every track independently from its own derived seed:
//!
//! 1. resolve the instrument (unresolved tracks pass through unchanged)
//! 2. partition the track span into intervals
//! 3. assign a dynamic level and ramp to each interval
//! 4. synthesize note velocities
//! 5. sample articulations and append their control changes

use std::path::Path;

use rendition_spec::{
    content_hash, derive_file_seed, derive_track_seed, ArticulationMode, ArticulationTable,
    PercussionTable, RenditionConfig, RenditionError,
};
use tracing::{debug, info, warn};

use crate::articulation::{region_starts, ArticulationLabel, ArticulationSampler};
use crate::dynamics::{assign, DynamicAssignment};
use crate::midi::{parse_score, write_score};
use crate::normalize::{Normalizer, Resolution};
use crate::partition::{locate, partition};
use crate::report::{ArticulationRegion, RenderReport, TrackReport, TrackStatus, REPORT_VERSION};
use crate::rng::create_component_rng;
use crate::score::{Score, TempoMap, Track, TrackEvent};
use crate::tempo::{insert_tempo_changes, randomize, TempoBounds};
use crate::velocity::VelocitySynthesizer;
use crate::BACKEND_ID;

/// A rendered score and the decisions behind it.
#[derive(Debug, Clone)]
pub struct Rendition {
    pub score: Score,
    pub report: RenderReport,
}

/// Renders scores under one configuration.
///
/// Holds only read-only state, so one engine can render many files from
/// several threads at once.
#[derive(Debug, Clone)]
pub struct Engine {
    config: RenditionConfig,
    normalizer: Normalizer,
    articulations: ArticulationSampler,
}

impl Engine {
    /// Creates an engine from a configuration and already loaded tables.
    ///
    /// Validates the configuration and resolves every articulation table key
    /// eagerly; any failure here is fatal for the whole run.
    /// Configuration warnings are only logged at debug level; callers that
    /// show them take them from [`RenditionConfig::validated`].
    pub fn new(
        config: RenditionConfig,
        articulation_table: Option<&ArticulationTable>,
        percussion_table: Option<PercussionTable>,
    ) -> Result<Self, RenditionError> {
        for warning in config.validated()? {
            debug!(code = %warning.code, "{}", warning);
        }
        let normalizer = match percussion_table {
            Some(table) => Normalizer::with_percussion(table),
            None => Normalizer::new(),
        };
        let articulations = match articulation_table {
            Some(table) => ArticulationSampler::from_table(table, &normalizer)?,
            None => ArticulationSampler::empty(),
        };
        debug!(
            instruments = articulations.len(),
            "articulation table loaded"
        );
        Ok(Self {
            config,
            normalizer,
            articulations,
        })
    }

    /// Creates an engine, loading the tables named in the configuration.
    pub fn from_config(config: RenditionConfig) -> Result<Self, RenditionError> {
        let articulation_table = config
            .articulation
            .table
            .as_deref()
            .map(ArticulationTable::load)
            .transpose()?;
        let percussion_table = config
            .percussion_table
            .as_deref()
            .map(PercussionTable::load)
            .transpose()?;
        Self::new(config, articulation_table.as_ref(), percussion_table)
    }

    pub fn config(&self) -> &RenditionConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn articulations(&self) -> &ArticulationSampler {
        &self.articulations
    }

    /// Base seed for a file: the override, else the configured seed, else
    /// one derived from the file identity.
    pub fn seed_for(&self, identity: &str, seed_override: Option<u32>) -> u32 {
        seed_override
            .or(self.config.seed)
            .unwrap_or_else(|| derive_file_seed(identity))
    }

    /// Renders a score with the given base seed.
    pub fn render(&self, score: &Score, seed: u32) -> Rendition {
        let tempo_after = self.render_tempo(score, seed);

        let (tracks, reports): (Vec<Track>, Vec<TrackReport>) = score
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| self.render_track(index, track, score, seed))
            .unzip();

        Rendition {
            score: Score {
                ppq: score.ppq,
                format: score.format,
                tempo_map: tempo_after.clone(),
                tracks,
            },
            report: RenderReport {
                report_version: REPORT_VERSION,
                file: None,
                input_hash: None,
                output_hash: None,
                seed,
                tempo_before: score.tempo_map.clone(),
                tempo_after,
                tracks: reports,
                backend_version: BACKEND_ID.to_string(),
            },
        }
    }

    fn render_tempo(&self, score: &Score, seed: u32) -> TempoMap {
        let tempo = &self.config.tempo;
        let mut rng = create_component_rng(seed, "tempo");
        let curve = insert_tempo_changes(
            &score.tempo_map,
            tempo.min_changes,
            tempo.max_changes,
            score.end_tick(),
            &mut rng,
        );
        randomize(
            &curve,
            tempo.mean_offset,
            tempo.std_dev,
            TempoBounds {
                min_bpm: tempo.min_bpm,
                max_bpm: tempo.max_bpm,
            },
            &mut rng,
        )
    }

    fn render_track(
        &self,
        index: usize,
        track: &Track,
        score: &Score,
        seed: u32,
    ) -> (Track, TrackReport) {
        let resolution = self.normalizer.resolve_track(track);
        let note_count = track.notes.len();

        if track.notes.is_empty() {
            debug!(track = index, "track has no notes");
            let report =
                TrackReport::pass_through(index, &track.name, resolution, TrackStatus::Empty, 0);
            return (track.clone(), report);
        }
        if resolution == Resolution::Unknown {
            let unresolved = RenditionError::UnresolvedInstrument {
                track: index,
                name: track.name.clone(),
            };
            warn!(code = unresolved.code(), "{}; passing through", unresolved);
            let report = TrackReport::pass_through(
                index,
                &track.name,
                resolution,
                TrackStatus::Unresolved,
                note_count,
            );
            return (track.clone(), report);
        }

        let track_seed = derive_track_seed(seed, index as u32);
        let intervals_config = &self.config.intervals;
        let dynamics_config = &self.config.dynamics;
        let duration = score.seconds_at(track.notes_end_tick());

        let intervals = partition(
            duration,
            intervals_config.min_len,
            intervals_config.max_len,
            &mut create_component_rng(track_seed, "partition"),
        );
        let dynamics = assign(
            &intervals,
            &dynamics_config.levels,
            dynamics_config.ramp_probability,
            &mut create_component_rng(track_seed, "dynamics"),
        );
        for assignment in &dynamics {
            debug!(
                track = index,
                start = assignment.interval.start,
                end = assignment.interval.end,
                level = %assignment.level,
                ramp = ?assignment.ramp,
                "interval assigned"
            );
        }

        let mut rendered = track.clone();
        let synth =
            VelocitySynthesizer::new(&dynamics_config.velocity_bands, dynamics_config.ramp_spread);
        let mut velocity_rng = create_component_rng(track_seed, "velocity");
        for note in &mut rendered.notes {
            let t = score.seconds_at(note.onset_tick);
            if let Some(assignment) = locate(&intervals, t).map(|i| &dynamics[i]) {
                note.velocity = synth.synthesize(t, note.velocity, assignment, &mut velocity_rng);
            }
        }

        let articulations = self.sample_articulations(
            &mut rendered,
            resolution,
            &dynamics,
            duration,
            score,
            track_seed,
        );

        info!(
            track = index,
            name = %track.name,
            instrument = ?resolution.instrument(),
            intervals = dynamics.len(),
            notes = note_count,
            "track rendered"
        );
        let report = TrackReport {
            index,
            name: track.name.clone(),
            resolution,
            status: TrackStatus::Rendered,
            notes: note_count,
            duration,
            dynamics,
            articulations,
        };
        (rendered, report)
    }

    fn sample_articulations(
        &self,
        track: &mut Track,
        resolution: Resolution,
        dynamics: &[DynamicAssignment],
        duration: f64,
        score: &Score,
        track_seed: u32,
    ) -> Vec<ArticulationRegion> {
        if !self.articulations.covers(resolution) {
            return Vec::new();
        }
        let mut rng = create_component_rng(track_seed, "articulation");
        let starts: Vec<f64> = match self.config.articulation.mode {
            ArticulationMode::PerInterval => dynamics.iter().map(|a| a.interval.start).collect(),
            ArticulationMode::PerRegion {
                default_upper_limit,
                extra_duration,
                ratio,
            } => region_starts(duration, default_upper_limit, extra_duration, ratio, &mut rng),
        };

        let channel = track.channel();
        let controller = self.config.articulation.controller;
        let mut regions = Vec::with_capacity(starts.len());
        for start in starts {
            let label = self.articulations.sample(resolution, &mut rng);
            let tick = score.tempo_map.seconds_to_tick(start, score.ppq);
            if let ArticulationLabel::Label { cc_value, .. } = &label {
                track
                    .events
                    .push(TrackEvent::control_change(tick, channel, controller, *cc_value));
            }
            regions.push(ArticulationRegion { start, tick, label });
        }
        track.events.sort_by_key(|e| e.tick);
        regions
    }

    /// Parses, renders, and serializes SMF bytes.
    ///
    /// `identity` names the file in errors and seeds the render when no
    /// seed is configured or given.
    pub fn render_bytes(
        &self,
        bytes: &[u8],
        identity: &str,
        seed_override: Option<u32>,
    ) -> Result<(Vec<u8>, RenderReport), RenditionError> {
        let score = parse_score(bytes).map_err(|e| e.for_file(identity))?;
        let seed = self.seed_for(identity, seed_override);
        info!(
            file = identity,
            seed,
            tracks = score.tracks.len(),
            notes = score.note_count(),
            "rendering score"
        );

        let Rendition { score, mut report } = self.render(&score, seed);
        let output = write_score(&score).map_err(|e| e.for_file(identity))?;

        report.file = Some(identity.to_string());
        report.input_hash = Some(content_hash(bytes));
        report.output_hash = Some(content_hash(&output));
        Ok((output, report))
    }

    /// Reads `input`, renders it, and writes the result to `output`.
    ///
    /// The file stem is the file identity.
    pub fn render_file(
        &self,
        input: &Path,
        output: &Path,
        seed_override: Option<u32>,
    ) -> Result<RenderReport, RenditionError> {
        let identity = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        self.render_file_with_identity(input, output, &identity, seed_override)
    }

    /// Like [`Engine::render_file`], with an explicit file identity.
    ///
    /// `identity` names the file in errors and reports and seeds the render.
    pub fn render_file_with_identity(
        &self,
        input: &Path,
        output: &Path,
        identity: &str,
        seed_override: Option<u32>,
    ) -> Result<RenderReport, RenditionError> {
        let bytes = std::fs::read(input)?;
        let (rendered, report) = self.render_bytes(&bytes, identity, seed_override)?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(output, rendered)?;
        Ok(report)
    }
}
