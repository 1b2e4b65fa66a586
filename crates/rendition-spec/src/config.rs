//! Render configuration.
//!
//! Configuration is a JSON document; every field has a default so an empty
//! object `{}` is a valid configuration. Relative table paths are resolved
//! against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dynamics::{DynamicLevel, DynamicTable};
use crate::error::{RenditionError, ValidationWarning};
use crate::validation::validate_config;

/// Default articulation controller (CC#32, bank select LSB).
pub const DEFAULT_ARTICULATION_CONTROLLER: u8 = 32;

/// Microseconds per minute, for BPM <-> SMF tempo conversion.
pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Largest microseconds-per-quarter value an SMF tempo event can hold (24 bits).
pub const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Slowest tempo an SMF tempo event can encode (about 3.58 BPM).
pub const MIN_ENCODABLE_BPM: f64 = MICROS_PER_MINUTE / MAX_TEMPO_MICROS as f64;

/// Fastest tempo an SMF tempo event can encode (one microsecond per quarter).
pub const MAX_ENCODABLE_BPM: f64 = MICROS_PER_MINUTE;

/// Complete render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionConfig {
    /// Fixed base seed; when absent the seed is derived from each file's stem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Interval length bounds.
    pub intervals: IntervalConfig,
    /// Dynamics and velocity settings.
    pub dynamics: DynamicsConfig,
    /// Tempo perturbation settings.
    pub tempo: TempoConfig,
    /// Articulation settings.
    pub articulation: ArticulationConfig,
    /// Optional YAML table mapping percussion pitches to instrument names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percussion_table: Option<PathBuf>,
}

impl Default for RenditionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            intervals: IntervalConfig::default(),
            dynamics: DynamicsConfig::default(),
            tempo: TempoConfig::default(),
            articulation: ArticulationConfig::default(),
            percussion_table: None,
        }
    }
}

/// Interval length bounds, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalConfig {
    /// Shortest sampled interval.
    pub min_len: f64,
    /// Longest sampled interval.
    pub max_len: f64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            min_len: 5.0,
            max_len: 20.0,
        }
    }
}

/// Dynamic level and velocity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicsConfig {
    /// Levels the assigner may choose from.
    pub levels: Vec<DynamicLevel>,
    /// Per-level velocity band overrides.
    pub velocity_bands: DynamicTable,
    /// Probability that a transition between intervals is ramped.
    pub ramp_probability: f64,
    /// Half-width of the sampling window around the interpolated ramp centre.
    pub ramp_spread: u8,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            levels: DynamicLevel::ALL.to_vec(),
            velocity_bands: DynamicTable::default(),
            ramp_probability: 0.3,
            ramp_spread: 4,
        }
    }
}

/// Tempo perturbation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TempoConfig {
    /// Mean of the BPM perturbation.
    pub mean_offset: f64,
    /// Standard deviation of the BPM perturbation.
    pub std_dev: f64,
    /// Lowest BPM after perturbation.
    pub min_bpm: f64,
    /// Highest BPM after perturbation.
    pub max_bpm: f64,
    /// Fewest extra tempo events to insert before perturbing.
    pub min_changes: u32,
    /// Most extra tempo events to insert before perturbing.
    pub max_changes: u32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            mean_offset: 0.0,
            std_dev: 8.0,
            min_bpm: 20.0,
            max_bpm: 300.0,
            min_changes: 0,
            max_changes: 0,
        }
    }
}

/// Articulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArticulationConfig {
    /// YAML articulation table; without it every track gets `Default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<PathBuf>,
    /// Controller number used to encode the articulation.
    pub controller: u8,
    /// How articulation regions are laid out.
    pub mode: ArticulationMode,
}

impl Default for ArticulationConfig {
    fn default() -> Self {
        Self {
            table: None,
            controller: DEFAULT_ARTICULATION_CONTROLLER,
            mode: ArticulationMode::default(),
        }
    }
}

/// Placement of articulation regions within a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArticulationMode {
    /// One articulation per dynamics interval.
    #[default]
    PerInterval,
    /// Independent regions whose count grows with the track length.
    PerRegion {
        /// Upper limit on the region count for short tracks.
        #[serde(default = "default_region_upper_limit")]
        default_upper_limit: u32,
        /// Seconds of extra length that raise the upper limit.
        #[serde(default = "default_region_extra_duration")]
        extra_duration: f64,
        /// How much the upper limit grows per `extra_duration`.
        #[serde(default = "default_region_ratio")]
        ratio: u32,
    },
}

fn default_region_upper_limit() -> u32 {
    2
}

fn default_region_extra_duration() -> f64 {
    120.0
}

fn default_region_ratio() -> u32 {
    1
}

impl RenditionConfig {
    /// Parses a configuration from JSON without validating it.
    pub fn from_json_str(json: &str) -> Result<Self, RenditionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, RenditionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads, path-resolves, and validates a configuration file.
    ///
    /// Returns the configuration together with any validation warnings;
    /// validation errors become [`RenditionError::InvalidConfigurationRange`].
    pub fn load(path: &Path) -> Result<(Self, Vec<ValidationWarning>), RenditionError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        let warnings = config.validated()?;
        Ok((config, warnings))
    }

    /// Validates the configuration, converting errors into a [`RenditionError`].
    pub fn validated(&self) -> Result<Vec<ValidationWarning>, RenditionError> {
        validate_config(self)
            .into_result()
            .map_err(RenditionError::InvalidConfigurationRange)
    }

    /// Makes relative table paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(table) = self.articulation.table.as_mut() {
            resolve(table);
        }
        if let Some(table) = self.percussion_table.as_mut() {
            resolve(table);
        }
    }

    /// A configuration that leaves tempo and ramps untouched.
    ///
    /// Velocities are still drawn from their bands; pitch, onset and
    /// duration survive a render unchanged.
    pub fn without_perturbation() -> Self {
        Self {
            dynamics: DynamicsConfig {
                ramp_probability: 0.0,
                ..DynamicsConfig::default()
            },
            tempo: TempoConfig {
                mean_offset: 0.0,
                std_dev: 0.0,
                min_changes: 0,
                max_changes: 0,
                ..TempoConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let config = RenditionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RenditionConfig::default());
        assert!(config.validated().unwrap().is_empty());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = RenditionConfig::from_json_str(
            r#"{"seed": 7, "intervals": {"min_len": 2.0}, "dynamics": {"levels": ["p", "mf", "ff"]}}"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.intervals.min_len, 2.0);
        assert_eq!(config.intervals.max_len, 20.0);
        assert_eq!(
            config.dynamics.levels,
            vec![DynamicLevel::P, DynamicLevel::Mf, DynamicLevel::Ff]
        );
        assert_eq!(config.dynamics.ramp_probability, 0.3);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = RenditionConfig::from_json_str(r#"{"intervals": {"minimum": 1.0}}"#);
        assert!(matches!(result, Err(RenditionError::Json(_))));
    }

    #[test]
    fn test_articulation_mode_parsing() {
        let config = RenditionConfig::from_json_str(
            r#"{"articulation": {"controller": 33, "mode": {"type": "per_region", "extra_duration": 60.0}}}"#,
        )
        .unwrap();
        assert_eq!(config.articulation.controller, 33);
        assert_eq!(
            config.articulation.mode,
            ArticulationMode::PerRegion {
                default_upper_limit: 2,
                extra_duration: 60.0,
                ratio: 1,
            }
        );
    }

    #[test]
    fn test_round_trip_json() {
        let config = RenditionConfig::without_perturbation();
        let json = config.to_json_pretty().unwrap();
        let parsed = RenditionConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_resolves_relative_tables_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rendition.json");
        std::fs::write(
            &path,
            r#"{"articulation": {"table": "articulations.yaml"}, "percussion_table": "/abs/perc.yaml"}"#,
        )
        .unwrap();

        let (config, warnings) = RenditionConfig::load(&path).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            config.articulation.table,
            Some(dir.path().join("articulations.yaml"))
        );
        assert_eq!(config.percussion_table, Some(PathBuf::from("/abs/perc.yaml")));
    }

    #[test]
    fn test_load_rejects_inverted_interval_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"intervals": {"min_len": 8.0, "max_len": 4.0}}"#).unwrap();

        let err = RenditionConfig::load(&path).unwrap_err();
        assert!(matches!(err, RenditionError::InvalidConfigurationRange(_)));
        assert!(err.is_fatal_for_run());
    }
}
