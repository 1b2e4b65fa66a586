//! Configuration validation.
//!
//! Validation collects every problem instead of stopping at the first, so a
//! user fixing a config file sees all of them at once.

use std::collections::BTreeSet;

use crate::config::{ArticulationMode, RenditionConfig, MAX_ENCODABLE_BPM, MIN_ENCODABLE_BPM};
use crate::dynamics::DynamicLevel;
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};

/// Validates a configuration.
///
/// # Example
/// ```
/// use rendition_spec::{validate_config, RenditionConfig};
///
/// let mut config = RenditionConfig::default();
/// assert!(validate_config(&config).is_ok());
///
/// config.intervals.min_len = 30.0;
/// assert!(!validate_config(&config).is_ok());
/// ```
pub fn validate_config(config: &RenditionConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_intervals(config, &mut result);
    validate_dynamics(config, &mut result);
    validate_tempo(config, &mut result);
    validate_articulation(config, &mut result);

    result
}

fn validate_intervals(config: &RenditionConfig, result: &mut ValidationResult) {
    let intervals = &config.intervals;
    if !(intervals.min_len.is_finite() && intervals.min_len > 0.0) {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonPositiveIntervalLength,
            format!("min_len must be a positive number, got {}", intervals.min_len),
            "intervals.min_len",
        ));
    }
    if !intervals.max_len.is_finite() || intervals.min_len > intervals.max_len {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvertedIntervalRange,
            format!(
                "min_len ({}) must not exceed max_len ({})",
                intervals.min_len, intervals.max_len
            ),
            "intervals",
        ));
    }
}

fn validate_dynamics(config: &RenditionConfig, result: &mut ValidationResult) {
    let dynamics = &config.dynamics;

    let distinct: BTreeSet<DynamicLevel> = dynamics.levels.iter().copied().collect();
    if distinct.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyLevelSet,
            "at least one dynamic level is required",
            "dynamics.levels",
        ));
    } else if distinct.len() == 1 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::SingleDynamicLevel,
            "a single dynamic level gives every interval the same level and no ramps",
            "dynamics.levels",
        ));
    }
    if distinct.len() != dynamics.levels.len() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::DuplicateLevels,
            "duplicate dynamic levels are ignored",
            "dynamics.levels",
        ));
    }

    let mut previous: Option<(DynamicLevel, crate::dynamics::VelocityBand)> = None;
    let mut narrowest = u8::MAX;
    for (level, band) in dynamics.velocity_bands.bands() {
        let path = format!("dynamics.velocity_bands.{}", level);
        if band.low == 0 || band.low > band.high || band.high > 127 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidVelocityBand,
                format!(
                    "band [{}, {}] must satisfy 1 <= low <= high <= 127",
                    band.low, band.high
                ),
                path.clone(),
            ));
        }
        if let Some((prev_level, prev_band)) = previous {
            if band.low < prev_band.low || band.high < prev_band.high {
                result.add_error(ValidationError::with_path(
                    ErrorCode::NonMonotonicBands,
                    format!(
                        "band for {} [{}, {}] is softer than band for {} [{}, {}]",
                        level, band.low, band.high, prev_level, prev_band.low, prev_band.high
                    ),
                    path,
                ));
            }
        }
        if distinct.contains(&level) {
            narrowest = narrowest.min(band.width());
        }
        previous = Some((level, band));
    }

    if !(0.0..=1.0).contains(&dynamics.ramp_probability) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidRampProbability,
            format!(
                "ramp_probability must be within [0, 1], got {}",
                dynamics.ramp_probability
            ),
            "dynamics.ramp_probability",
        ));
    }

    if !distinct.is_empty() && u16::from(dynamics.ramp_spread) * 2 > u16::from(narrowest) {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::WideRampSpread,
            format!(
                "ramp_spread {} is wider than the narrowest band ({} values)",
                dynamics.ramp_spread, narrowest
            ),
            "dynamics.ramp_spread",
        ));
    }
}

fn validate_tempo(config: &RenditionConfig, result: &mut ValidationResult) {
    let tempo = &config.tempo;
    if !(tempo.min_bpm >= MIN_ENCODABLE_BPM
        && tempo.max_bpm <= MAX_ENCODABLE_BPM
        && tempo.min_bpm <= tempo.max_bpm)
    {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidTempoBounds,
            format!(
                "tempo bounds must satisfy {} <= min_bpm <= max_bpm <= {}, got [{}, {}]",
                MIN_ENCODABLE_BPM, MAX_ENCODABLE_BPM, tempo.min_bpm, tempo.max_bpm
            ),
            "tempo",
        ));
    }
    if !(tempo.std_dev.is_finite() && tempo.std_dev >= 0.0) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidTempoDeviation,
            format!("std_dev must be a non-negative number, got {}", tempo.std_dev),
            "tempo.std_dev",
        ));
    }
    if !tempo.mean_offset.is_finite() {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidTempoOffset,
            "mean_offset must be finite",
            "tempo.mean_offset",
        ));
    }
    if tempo.min_changes > tempo.max_changes {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvertedTempoChangeRange,
            format!(
                "min_changes ({}) must not exceed max_changes ({})",
                tempo.min_changes, tempo.max_changes
            ),
            "tempo",
        ));
    }
}

fn validate_articulation(config: &RenditionConfig, result: &mut ValidationResult) {
    let articulation = &config.articulation;
    if articulation.controller > 127 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidController,
            format!("controller must be 0-127, got {}", articulation.controller),
            "articulation.controller",
        ));
    }
    if let ArticulationMode::PerRegion {
        default_upper_limit,
        extra_duration,
        ..
    } = articulation.mode
    {
        if default_upper_limit == 0 || !(extra_duration.is_finite() && extra_duration > 0.0) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidRegionParameters,
                "per_region needs default_upper_limit >= 1 and a positive extra_duration",
                "articulation.mode",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{DynamicTable, VelocityBand};
    use std::collections::BTreeMap;

    fn codes(result: &ValidationResult) -> Vec<ErrorCode> {
        result.errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = validate_config(&RenditionConfig::default());
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_interval_errors() {
        let mut config = RenditionConfig::default();
        config.intervals.min_len = 0.0;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::NonPositiveIntervalLength]
        );

        config.intervals.min_len = 10.0;
        config.intervals.max_len = 2.0;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvertedIntervalRange]
        );
    }

    #[test]
    fn test_equal_interval_bounds_are_valid() {
        let mut config = RenditionConfig::default();
        config.intervals.min_len = 4.0;
        config.intervals.max_len = 4.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_and_single_level_sets() {
        let mut config = RenditionConfig::default();
        config.dynamics.levels.clear();
        assert_eq!(codes(&validate_config(&config)), vec![ErrorCode::EmptyLevelSet]);

        config.dynamics.levels = vec![DynamicLevel::Mf];
        let result = validate_config(&config);
        assert!(result.is_ok());
        assert_eq!(result.warnings[0].code, WarningCode::SingleDynamicLevel);
    }

    #[test]
    fn test_non_monotonic_bands() {
        let mut config = RenditionConfig::default();
        let mut overrides = BTreeMap::new();
        overrides.insert(DynamicLevel::F, VelocityBand::new(40, 60));
        config.dynamics.velocity_bands = DynamicTable::with_overrides(overrides);

        let result = validate_config(&config);
        assert!(codes(&result).contains(&ErrorCode::NonMonotonicBands));
    }

    #[test]
    fn test_silent_band_is_rejected() {
        let mut config = RenditionConfig::default();
        let mut overrides = BTreeMap::new();
        overrides.insert(DynamicLevel::Ppp, VelocityBand::new(0, 15));
        config.dynamics.velocity_bands = DynamicTable::with_overrides(overrides);

        assert!(codes(&validate_config(&config)).contains(&ErrorCode::InvalidVelocityBand));
    }

    #[test]
    fn test_ramp_probability_range() {
        let mut config = RenditionConfig::default();
        config.dynamics.ramp_probability = 1.5;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvalidRampProbability]
        );
        config.dynamics.ramp_probability = f64::NAN;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvalidRampProbability]
        );
    }

    #[test]
    fn test_wide_ramp_spread_warns() {
        let mut config = RenditionConfig::default();
        config.dynamics.ramp_spread = 30;
        let result = validate_config(&config);
        assert!(result.is_ok());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::WideRampSpread));
    }

    #[test]
    fn test_tempo_errors() {
        let mut config = RenditionConfig::default();
        config.tempo.min_bpm = 0.0;
        config.tempo.std_dev = -1.0;
        config.tempo.min_changes = 3;
        config.tempo.max_changes = 1;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![
                ErrorCode::InvalidTempoBounds,
                ErrorCode::InvalidTempoDeviation,
                ErrorCode::InvertedTempoChangeRange,
            ]
        );
    }

    #[test]
    fn test_tempo_bounds_must_be_encodable() {
        let mut config = RenditionConfig::default();
        config.tempo.min_bpm = 2.0;
        config.tempo.max_bpm = 2.0;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvalidTempoBounds]
        );

        config.tempo.min_bpm = 120.0;
        config.tempo.max_bpm = MAX_ENCODABLE_BPM * 2.0;
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvalidTempoBounds]
        );

        config.tempo.min_bpm = MIN_ENCODABLE_BPM;
        config.tempo.max_bpm = MAX_ENCODABLE_BPM;
        assert!(validate_config(&config).is_ok());

        config.tempo.min_bpm = f64::NAN;
        assert!(!validate_config(&config).is_ok());
    }

    #[test]
    fn test_articulation_errors() {
        let mut config = RenditionConfig::default();
        config.articulation.controller = 128;
        config.articulation.mode = ArticulationMode::PerRegion {
            default_upper_limit: 0,
            extra_duration: 120.0,
            ratio: 1,
        };
        assert_eq!(
            codes(&validate_config(&config)),
            vec![ErrorCode::InvalidController, ErrorCode::InvalidRegionParameters]
        );
    }
}
