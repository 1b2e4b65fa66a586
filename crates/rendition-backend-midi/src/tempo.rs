//! Tempo perturbation.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::score::{TempoEvent, TempoMap};

/// Allowed BPM range after perturbation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoBounds {
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for TempoBounds {
    fn default() -> Self {
        Self {
            min_bpm: 20.0,
            max_bpm: 300.0,
        }
    }
}

impl TempoBounds {
    fn clamp(&self, bpm: f64) -> f64 {
        bpm.clamp(self.min_bpm, self.max_bpm)
    }
}

/// Adds an independent `N(mean_offset, std_dev)` draw to every event's BPM
/// and clamps the result to `bounds`.
///
/// Ticks, order, and count are preserved. With both `mean_offset` and
/// `std_dev` zero the map is returned unchanged and no draws are made.
pub fn randomize<R: Rng>(
    tempo_map: &TempoMap,
    mean_offset: f64,
    std_dev: f64,
    bounds: TempoBounds,
    rng: &mut R,
) -> TempoMap {
    if mean_offset == 0.0 && std_dev == 0.0 {
        return tempo_map.clone();
    }
    let normal = Normal::new(mean_offset, std_dev).ok();
    tempo_map.map_bpm(|bpm| {
        let offset = match &normal {
            Some(normal) => normal.sample(rng),
            None => mean_offset,
        };
        let perturbed = bounds.clamp(bpm + offset);
        debug!(from = bpm, to = perturbed, "tempo perturbed");
        perturbed
    })
}

/// Inserts between `min_changes` and `max_changes` new tempo events at
/// random ticks in `[1, end_tick)`, each carrying the BPM already in effect
/// there. Ticks that already hold an event are skipped.
pub fn insert_tempo_changes<R: Rng>(
    tempo_map: &TempoMap,
    min_changes: u32,
    max_changes: u32,
    end_tick: u64,
    rng: &mut R,
) -> TempoMap {
    let mut map = tempo_map.clone();
    if max_changes == 0 || min_changes > max_changes || end_tick <= 1 {
        return map;
    }
    let count = rng.gen_range(min_changes..=max_changes);
    for _ in 0..count {
        let tick = rng.gen_range(1..end_tick);
        if map.has_event_at(tick) {
            continue;
        }
        let bpm = map.bpm_at(tick);
        debug!(tick, bpm, "tempo change inserted");
        map.insert(TempoEvent { tick, bpm });
    }
    map
}
