//! Dynamic level assignment.
//!
//! Assignment is a fold over the intervals carrying the previous level: the
//! first interval draws from the whole level set, every later one from the
//! set without the previous level, and may ramp from it.

use rand::Rng;
use rendition_spec::DynamicLevel;
use serde::Serialize;

use crate::partition::Interval;

/// Loudness transition into an interval's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RampState {
    None,
    Crescendo { from: DynamicLevel },
    Diminuendo { from: DynamicLevel },
}

impl RampState {
    /// Level the ramp starts from, if ramped.
    pub fn from_level(&self) -> Option<DynamicLevel> {
        match self {
            RampState::None => None,
            RampState::Crescendo { from } | RampState::Diminuendo { from } => Some(*from),
        }
    }

    fn between(from: DynamicLevel, to: DynamicLevel) -> Self {
        if to > from {
            RampState::Crescendo { from }
        } else {
            RampState::Diminuendo { from }
        }
    }
}

/// An interval with its level and ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DynamicAssignment {
    pub interval: Interval,
    pub level: DynamicLevel,
    pub ramp: RampState,
}

/// Assigns a dynamic level and ramp state to each interval.
///
/// `levels` is deduplicated and sorted first. A single level is degenerate:
/// every interval gets it and nothing ramps. An empty level set assigns
/// nothing.
pub fn assign<R: Rng>(
    intervals: &[Interval],
    levels: &[DynamicLevel],
    ramp_probability: f64,
    rng: &mut R,
) -> Vec<DynamicAssignment> {
    let mut palette = levels.to_vec();
    palette.sort();
    palette.dedup();
    if palette.is_empty() {
        return Vec::new();
    }
    let ramp_probability = if ramp_probability.is_finite() {
        ramp_probability.clamp(0.0, 1.0)
    } else {
        0.0
    };

    intervals
        .iter()
        .scan(None, |previous: &mut Option<DynamicLevel>, interval| {
            let (level, ramp) = next_level(*previous, &palette, ramp_probability, rng);
            *previous = Some(level);
            Some(DynamicAssignment {
                interval: *interval,
                level,
                ramp,
            })
        })
        .collect()
}

fn next_level<R: Rng>(
    previous: Option<DynamicLevel>,
    palette: &[DynamicLevel],
    ramp_probability: f64,
    rng: &mut R,
) -> (DynamicLevel, RampState) {
    match previous {
        None => (palette[rng.gen_range(0..palette.len())], RampState::None),
        Some(previous) if palette.len() == 1 => (previous, RampState::None),
        Some(previous) => {
            // `previous` is always a palette member, so exactly one is excluded.
            let pick = rng.gen_range(0..palette.len() - 1);
            let level = palette
                .iter()
                .copied()
                .filter(|level| *level != previous)
                .nth(pick)
                .unwrap_or(previous);
            let ramp = if rng.gen_bool(ramp_probability) {
                RampState::between(previous, level)
            } else {
                RampState::None
            };
            (level, ramp)
        }
    }
}
