//! Dynamic levels and their velocity bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A discrete loudness category, ordered from softest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicLevel {
    /// Pianississimo.
    Ppp,
    /// Pianissimo.
    Pp,
    /// Piano.
    P,
    /// Mezzo-piano.
    Mp,
    /// Mezzo-forte.
    Mf,
    /// Forte.
    F,
    /// Fortissimo.
    Ff,
    /// Fortississimo.
    Fff,
}

impl DynamicLevel {
    /// All levels in loudness order.
    pub const ALL: [DynamicLevel; 8] = [
        DynamicLevel::Ppp,
        DynamicLevel::Pp,
        DynamicLevel::P,
        DynamicLevel::Mp,
        DynamicLevel::Mf,
        DynamicLevel::F,
        DynamicLevel::Ff,
        DynamicLevel::Fff,
    ];

    /// Returns the score marking ("pp", "mf", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicLevel::Ppp => "ppp",
            DynamicLevel::Pp => "pp",
            DynamicLevel::P => "p",
            DynamicLevel::Mp => "mp",
            DynamicLevel::Mf => "mf",
            DynamicLevel::F => "f",
            DynamicLevel::Ff => "ff",
            DynamicLevel::Fff => "fff",
        }
    }

    /// Default velocity band: 16-wide slices of the MIDI range, `ppp` starting at 1.
    pub fn default_band(&self) -> VelocityBand {
        match self {
            DynamicLevel::Ppp => VelocityBand::new(1, 15),
            DynamicLevel::Pp => VelocityBand::new(16, 31),
            DynamicLevel::P => VelocityBand::new(32, 47),
            DynamicLevel::Mp => VelocityBand::new(48, 63),
            DynamicLevel::Mf => VelocityBand::new(64, 79),
            DynamicLevel::F => VelocityBand::new(80, 95),
            DynamicLevel::Ff => VelocityBand::new(96, 111),
            DynamicLevel::Fff => VelocityBand::new(112, 127),
        }
    }
}

impl std::fmt::Display for DynamicLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive MIDI velocity range `[low, high]`, written as `[low, high]` in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 2]", into = "[u8; 2]")]
pub struct VelocityBand {
    /// Lowest velocity in the band.
    pub low: u8,
    /// Highest velocity in the band.
    pub high: u8,
}

impl VelocityBand {
    /// Creates a band.
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Centre of the band.
    pub fn midpoint(&self) -> f64 {
        (self.low as f64 + self.high as f64) / 2.0
    }

    /// Number of velocity values in the band.
    pub fn width(&self) -> u8 {
        self.high.saturating_sub(self.low).saturating_add(1)
    }

    /// Whether `velocity` lies inside the band.
    pub fn contains(&self, velocity: u8) -> bool {
        (self.low..=self.high).contains(&velocity)
    }
}

impl From<[u8; 2]> for VelocityBand {
    fn from(pair: [u8; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<VelocityBand> for [u8; 2] {
    fn from(band: VelocityBand) -> Self {
        [band.low, band.high]
    }
}

/// Level-to-band mapping.
///
/// Only overridden levels need to be listed; missing levels fall back to
/// [`DynamicLevel::default_band`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicTable {
    overrides: BTreeMap<DynamicLevel, VelocityBand>,
}

impl DynamicTable {
    /// Creates a table with explicit overrides.
    pub fn with_overrides(overrides: BTreeMap<DynamicLevel, VelocityBand>) -> Self {
        Self { overrides }
    }

    /// Effective band for a level.
    pub fn band(&self, level: DynamicLevel) -> VelocityBand {
        self.overrides
            .get(&level)
            .copied()
            .unwrap_or_else(|| level.default_band())
    }

    /// Effective bands for every level, in loudness order.
    pub fn bands(&self) -> impl Iterator<Item = (DynamicLevel, VelocityBand)> + '_ {
        DynamicLevel::ALL
            .into_iter()
            .map(move |level| (level, self.band(level)))
    }
}
