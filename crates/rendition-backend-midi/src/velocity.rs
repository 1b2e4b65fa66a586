//! Note velocity synthesis.

use rand::Rng;
use rendition_spec::DynamicTable;

use crate::dynamics::{DynamicAssignment, RampState};

/// Draws note velocities from the velocity band of each note's interval.
#[derive(Debug, Clone, Copy)]
pub struct VelocitySynthesizer<'a> {
    table: &'a DynamicTable,
    spread: u8,
}

impl<'a> VelocitySynthesizer<'a> {
    /// `spread` is the half-width of the window sampled around a ramp's centre.
    pub fn new(table: &'a DynamicTable, spread: u8) -> Self {
        Self { table, spread }
    }

    /// Interpolated velocity centre of a ramped interval at time `t`.
    ///
    /// Moves linearly from the midpoint of the ramp's starting band to the
    /// midpoint of the target band. `None` for an interval without a ramp.
    pub fn ramp_centre(&self, t: f64, assignment: &DynamicAssignment) -> Option<f64> {
        let from = assignment.ramp.from_level()?;
        let start = self.table.band(from).midpoint();
        let end = self.table.band(assignment.level).midpoint();
        let frac = assignment.interval.fraction(t);
        Some(start + (end - start) * frac)
    }

    /// Velocity for a note at time `t` (seconds) inside `assignment`.
    ///
    /// A source velocity of 0 stays 0. Otherwise the result is in [1, 127]:
    /// uniform in the level's band without a ramp, uniform within `spread`
    /// of the ramp centre with one.
    pub fn synthesize<R: Rng>(
        &self,
        t: f64,
        source_velocity: u8,
        assignment: &DynamicAssignment,
        rng: &mut R,
    ) -> u8 {
        if source_velocity == 0 {
            return 0;
        }
        let velocity = match assignment.ramp {
            RampState::None => {
                let band = self.table.band(assignment.level);
                f64::from(rng.gen_range(band.low.min(band.high)..=band.high))
            }
            RampState::Crescendo { .. } | RampState::Diminuendo { .. } => {
                let centre = self.ramp_centre(t, assignment).unwrap_or(64.0);
                let spread = f64::from(self.spread);
                if spread > 0.0 {
                    rng.gen_range(centre - spread..=centre + spread)
                } else {
                    centre
                }
            }
        };
        velocity.round().clamp(1.0, 127.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Interval;
    use crate::rng::create_rng;
    use rendition_spec::{DynamicLevel, VelocityBand};
    use std::collections::BTreeMap;

    fn flat(level: DynamicLevel) -> DynamicAssignment {
        DynamicAssignment {
            interval: Interval::new(0.0, 10.0),
            level,
            ramp: RampState::None,
        }
    }

    #[test]
    fn test_non_ramped_velocities_stay_in_band() {
        let table = DynamicTable::default();
        let synth = VelocitySynthesizer::new(&table, 4);
        let mut rng = create_rng(42);
        for level in DynamicLevel::ALL {
            let band = table.band(level);
            for i in 0..200 {
                let v = synth.synthesize(i as f64 * 0.05, 100, &flat(level), &mut rng);
                assert!(band.contains(v), "{} outside {:?} for {}", v, band, level);
                assert!((1..=127).contains(&v));
            }
        }
    }

    #[test]
    fn test_zero_source_velocity_is_kept() {
        let table = DynamicTable::default();
        let synth = VelocitySynthesizer::new(&table, 4);
        let v = synth.synthesize(1.0, 0, &flat(DynamicLevel::Ff), &mut create_rng(1));
        assert_eq!(v, 0);
    }

    #[test]
    fn test_crescendo_moves_between_band_midpoints() {
        let table = DynamicTable::default();
        let synth = VelocitySynthesizer::new(&table, 0);
        let ramp = DynamicAssignment {
            interval: Interval::new(10.0, 20.0),
            level: DynamicLevel::Ff,
            ramp: RampState::Crescendo {
                from: DynamicLevel::P,
            },
        };
        let p = table.band(DynamicLevel::P).midpoint();
        let ff = table.band(DynamicLevel::Ff).midpoint();

        assert_eq!(synth.ramp_centre(10.0, &ramp), Some(p));
        assert_eq!(synth.ramp_centre(20.0, &ramp), Some(ff));
        assert_eq!(synth.ramp_centre(15.0, &ramp), Some((p + ff) / 2.0));
        assert_eq!(synth.ramp_centre(15.0, &flat(DynamicLevel::P)), None);

        let mut rng = create_rng(3);
        let start = synth.synthesize(10.0, 80, &ramp, &mut rng);
        let end = synth.synthesize(20.0, 80, &ramp, &mut rng);
        assert_eq!(start, p.round() as u8);
        assert_eq!(end, ff.round() as u8);
    }

    #[test]
    fn test_ramp_spread_bounds_samples() {
        let table = DynamicTable::default();
        let synth = VelocitySynthesizer::new(&table, 4);
        let ramp = DynamicAssignment {
            interval: Interval::new(0.0, 8.0),
            level: DynamicLevel::Pp,
            ramp: RampState::Diminuendo {
                from: DynamicLevel::F,
            },
        };
        let mut rng = create_rng(8);
        for i in 0..=80 {
            let t = i as f64 * 0.1;
            let centre = synth.ramp_centre(t, &ramp).unwrap();
            let v = f64::from(synth.synthesize(t, 64, &ramp, &mut rng));
            assert!((v - centre).abs() <= 4.5, "{} vs {}", v, centre);
        }
    }

    #[test]
    fn test_result_is_clamped_to_midi_range() {
        let mut overrides = BTreeMap::new();
        overrides.insert(DynamicLevel::Fff, VelocityBand::new(127, 127));
        overrides.insert(DynamicLevel::Ppp, VelocityBand::new(1, 1));
        let table = DynamicTable::with_overrides(overrides);
        let synth = VelocitySynthesizer::new(&table, 20);
        let mut rng = create_rng(2);

        let up = DynamicAssignment {
            interval: Interval::new(0.0, 1.0),
            level: DynamicLevel::Fff,
            ramp: RampState::Crescendo {
                from: DynamicLevel::Ff,
            },
        };
        let down = DynamicAssignment {
            interval: Interval::new(0.0, 1.0),
            level: DynamicLevel::Ppp,
            ramp: RampState::Diminuendo {
                from: DynamicLevel::Pp,
            },
        };
        for _ in 0..100 {
            let v = synth.synthesize(1.0, 64, &up, &mut rng);
            assert!((1..=127).contains(&v));
            let v = synth.synthesize(1.0, 64, &down, &mut rng);
            assert!((1..=127).contains(&v));
        }
    }
}
