//! Articulation sampling.
//!
//! The articulation table is keyed by free-text instrument names; at load
//! every key goes through the [`Normalizer`] so lookups at render time are by
//! [`InstrumentId`].

use std::collections::HashMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rendition_spec::{ArticulationTable, InstrumentId, RenditionError};
use serde::Serialize;

use crate::normalize::{Normalizer, Resolution};

/// Outcome of sampling an articulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArticulationLabel {
    /// A table entry, realized as a control change.
    Label { name: String, cc_value: u8 },
    /// No table entry; nothing is emitted.
    Default,
}

#[derive(Debug, Clone)]
struct WeightedLabels {
    labels: Vec<(String, u8)>,
    weights: WeightedIndex<f64>,
}

/// Weighted articulation choice per instrument.
#[derive(Debug, Clone, Default)]
pub struct ArticulationSampler {
    distributions: HashMap<InstrumentId, WeightedLabels>,
}

impl ArticulationSampler {
    /// A sampler with no table; every draw is `Default`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds per-instrument distributions from a validated table.
    ///
    /// Fails with [`RenditionError::InvalidProbabilityTable`] when a key does
    /// not resolve to an instrument, when two keys resolve to the same one,
    /// or when the weights are unusable.
    pub fn from_table(
        table: &ArticulationTable,
        normalizer: &Normalizer,
    ) -> Result<Self, RenditionError> {
        table.validate()?;
        let mut distributions = HashMap::new();
        let mut sources: HashMap<InstrumentId, &str> = HashMap::new();

        for (key, entries) in table.iter() {
            let Resolution::Known(id) = normalizer.resolve(key) else {
                return Err(RenditionError::probability_table(
                    key.as_str(),
                    "name does not resolve to a General MIDI instrument",
                ));
            };
            if let Some(previous) = sources.insert(id, key.as_str()) {
                return Err(RenditionError::probability_table(
                    key.as_str(),
                    format!("resolves to '{}', already listed as '{}'", id, previous),
                ));
            }

            let weights = WeightedIndex::new(entries.values().map(|e| e.probability))
                .map_err(|e| RenditionError::probability_table(key.as_str(), e.to_string()))?;
            let labels = entries
                .iter()
                .map(|(label, entry)| (label.clone(), entry.cc_value))
                .collect();
            distributions.insert(id, WeightedLabels { labels, weights });
        }

        Ok(Self { distributions })
    }

    /// Whether `resolution` has a distribution.
    pub fn covers(&self, resolution: Resolution) -> bool {
        resolution
            .instrument()
            .is_some_and(|id| self.distributions.contains_key(&id))
    }

    /// Number of instruments with a distribution.
    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    /// Draws a label for `resolution`. Makes no draw when it returns `Default`.
    pub fn sample<R: Rng>(&self, resolution: Resolution, rng: &mut R) -> ArticulationLabel {
        let Some(distribution) = resolution
            .instrument()
            .and_then(|id| self.distributions.get(&id))
        else {
            return ArticulationLabel::Default;
        };
        let (name, cc_value) = &distribution.labels[distribution.weights.sample(rng)];
        ArticulationLabel::Label {
            name: name.clone(),
            cc_value: *cc_value,
        }
    }
}

/// Start times (seconds) of independently placed articulation regions.
///
/// The region count is uniform in `[1, upper]` with
/// `upper = default_upper_limit + max(0, ceil(duration / extra_duration - 1)) * ratio`.
/// The first region starts at 0; the rest start at distinct whole seconds
/// inside the span, in ascending order.
pub fn region_starts<R: Rng>(
    duration: f64,
    default_upper_limit: u32,
    extra_duration: f64,
    ratio: u32,
    rng: &mut R,
) -> Vec<f64> {
    if !(duration > 0.0) {
        return Vec::new();
    }
    let extra = if extra_duration > 0.0 {
        (duration / extra_duration - 1.0).ceil().max(0.0) as u32
    } else {
        0
    };
    let upper = default_upper_limit
        .saturating_add(extra.saturating_mul(ratio))
        .max(1);
    let count = rng.gen_range(1..=upper) as usize;

    // Whole seconds strictly inside the span.
    let candidates = duration.ceil() as usize - 1;
    let extra_regions = (count - 1).min(candidates);
    let mut starts: Vec<f64> = rand::seq::index::sample(rng, candidates, extra_regions)
        .into_iter()
        .map(|i| (i + 1) as f64)
        .collect();
    starts.sort_by(f64::total_cmp);
    starts.insert(0, 0.0);
    starts
}
