//! Externally edited lookup tables: articulation probabilities and percussion pitches.
//!
//! Both are YAML documents loaded once per run and read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenditionError;

/// Allowed deviation of an instrument's weight sum from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One articulation of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticulationEntry {
    /// Weight in [0, 1].
    #[serde(rename = "Probability", alias = "probability")]
    pub probability: f64,
    /// Controller value that selects the articulation in the synthesizer.
    #[serde(rename = "CC#32", alias = "cc")]
    pub cc_value: u8,
}

/// Instrument name -> articulation label -> entry.
///
/// ```yaml
/// violin:
///   legato: { Probability: 0.6, "CC#32": 0 }
///   staccato: { Probability: 0.4, "CC#32": 10 }
/// ```
///
/// Labels iterate in lexical order, which keeps weighted sampling stable
/// regardless of how the YAML file orders them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticulationTable {
    instruments: BTreeMap<String, BTreeMap<String, ArticulationEntry>>,
}

impl ArticulationTable {
    /// Parses and validates a table.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RenditionError> {
        let table: Self = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    /// Reads, parses, and validates a table file.
    pub fn load(path: &Path) -> Result<Self, RenditionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Checks every instrument's distribution.
    ///
    /// Fails on the first instrument that has no entries, a weight outside
    /// [0, 1], or weights whose sum differs from 1 by more than
    /// [`PROBABILITY_TOLERANCE`].
    pub fn validate(&self) -> Result<(), RenditionError> {
        for (instrument, entries) in &self.instruments {
            if entries.is_empty() {
                return Err(RenditionError::probability_table(
                    instrument,
                    "no articulations listed",
                ));
            }
            for (label, entry) in entries {
                if !entry.probability.is_finite() || !(0.0..=1.0).contains(&entry.probability) {
                    return Err(RenditionError::probability_table(
                        instrument,
                        format!(
                            "weight of '{}' must be within [0, 1], got {}",
                            label, entry.probability
                        ),
                    ));
                }
                if entry.cc_value > 127 {
                    return Err(RenditionError::probability_table(
                        instrument,
                        format!("controller value of '{}' exceeds 127", label),
                    ));
                }
            }
            let sum: f64 = entries.values().map(|e| e.probability).sum();
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(RenditionError::probability_table(
                    instrument,
                    format!("weights sum to {}, expected 1", sum),
                ));
            }
        }
        Ok(())
    }

    /// Iterates instruments and their articulations in key order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<String, ArticulationEntry>)> + '_ {
        self.instruments.iter()
    }

    /// Inserts or replaces an instrument's articulations (unvalidated).
    pub fn insert(
        &mut self,
        instrument: impl Into<String>,
        entries: BTreeMap<String, ArticulationEntry>,
    ) {
        self.instruments.insert(instrument.into(), entries);
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the table lists no instruments.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Percussion pitch -> instrument name, used to resolve drum tracks.
///
/// ```yaml
/// 47: timpani
/// 81: triangle
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercussionTable {
    pitches: BTreeMap<u8, String>,
}

impl PercussionTable {
    /// Parses a table, rejecting pitches outside the MIDI range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RenditionError> {
        let table: Self = serde_yaml::from_str(yaml)?;
        if let Some(pitch) = table.pitches.keys().find(|p| **p > 127) {
            return Err(RenditionError::InvalidPercussionTable {
                pitch: *pitch,
                message: "outside the MIDI range".to_string(),
            });
        }
        Ok(table)
    }

    /// Reads and parses a table file.
    pub fn load(path: &Path) -> Result<Self, RenditionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Instrument name mapped to a pitch.
    pub fn name_for(&self, pitch: u8) -> Option<&str> {
        self.pitches.get(&pitch).map(String::as_str)
    }

    /// Inserts a mapping.
    pub fn insert(&mut self, pitch: u8, name: impl Into<String>) {
        self.pitches.insert(pitch, name.into());
    }
}
