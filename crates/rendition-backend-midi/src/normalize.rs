//! Instrument name resolution.
//!
//! Resolution runs in passes over the normalized name: exact lookup, exact
//! lookup with trailing part numbers stripped ("Violin II", "Horn 3"), then
//! the longest alias found as a run of whole tokens. Percussion tracks that
//! stay unresolved by name may be resolved through a pitch table.

use rendition_spec::{gm_table, normalize_name, InstrumentId, PercussionTable};
use serde::Serialize;

use crate::score::Track;

/// Roman numerals accepted as part numbers.
const ROMAN_PART_NUMBERS: [&str; 8] = ["i", "ii", "iii", "iv", "v", "vi", "vii", "viii"];

/// Outcome of resolving a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Known(InstrumentId),
    Unknown,
}

impl Resolution {
    /// The resolved instrument, if any.
    pub fn instrument(&self) -> Option<InstrumentId> {
        match self {
            Resolution::Known(id) => Some(*id),
            Resolution::Unknown => None,
        }
    }

    /// Whether the name resolved.
    pub fn is_known(&self) -> bool {
        matches!(self, Resolution::Known(_))
    }
}

fn is_part_number(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit()) || ROMAN_PART_NUMBERS.contains(&token)
}

/// Resolves raw track names to GM instruments.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    percussion: Option<PercussionTable>,
}

impl Normalizer {
    /// A normalizer without a percussion table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A normalizer that refines percussion tracks through `table`.
    pub fn with_percussion(table: PercussionTable) -> Self {
        Self {
            percussion: Some(table),
        }
    }

    /// Resolves a raw name. Never fails; unmatched names are `Unknown`.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let normalized = normalize_name(raw);
        if normalized.is_empty() {
            return Resolution::Unknown;
        }
        let table = gm_table();
        if let Some(id) = table.exact(&normalized) {
            return Resolution::Known(id);
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();
        let mut stem = tokens.as_slice();
        while let [rest @ .., last] = stem {
            if rest.is_empty() || !is_part_number(last) {
                break;
            }
            stem = rest;
        }
        if stem.len() < tokens.len() {
            if let Some(id) = table.exact(&stem.join(" ")) {
                return Resolution::Known(id);
            }
        }

        table
            .longest_token_match(&tokens)
            .map_or(Resolution::Unknown, Resolution::Known)
    }

    /// Resolves a track: by name, then for percussion tracks by pitch table.
    ///
    /// The pitch table is consulted from the most frequent pitch downwards;
    /// the first pitch with an entry decides.
    pub fn resolve_track(&self, track: &Track) -> Resolution {
        let by_name = self.resolve(&track.name);
        if by_name.is_known() || !track.is_percussion() {
            return by_name;
        }
        let Some(table) = &self.percussion else {
            return Resolution::Unknown;
        };
        track
            .pitch_histogram()
            .into_iter()
            .find_map(|(pitch, _)| table.name_for(pitch))
            .map_or(Resolution::Unknown, |name| self.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Note;

    fn known(program: u8) -> Resolution {
        Resolution::Known(InstrumentId::Program(program))
    }

    #[test]
    fn test_exact_and_case_insensitive() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.resolve("Violin"), known(40));
        assert_eq!(normalizer.resolve("VIOLA"), known(41));
        assert_eq!(normalizer.resolve("french_horn"), known(60));
        assert_eq!(normalizer.resolve("Vc."), known(42));
    }

    #[test]
    fn test_part_numbers_are_stripped() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.resolve("Violin II"), known(40));
        assert_eq!(normalizer.resolve("Horn 3"), known(60));
        assert_eq!(normalizer.resolve("Vln_1"), known(40));
        assert_eq!(normalizer.resolve("Flute 1 2"), known(73));
    }

    #[test]
    fn test_fuzzy_whole_token_match() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.resolve("Solo Violin 1 arco"), known(40));
        assert_eq!(normalizer.resolve("Bass Clarinet in Bb"), known(71));
        assert_eq!(normalizer.resolve("Cor Anglais (solo)"), known(69));
    }

    #[test]
    fn test_unknown_names() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.resolve("Weird Synth 3"), Resolution::Unknown);
        assert_eq!(normalizer.resolve(""), Resolution::Unknown);
        assert_eq!(normalizer.resolve("___"), Resolution::Unknown);
        // A lone numeral is not stripped down to nothing.
        assert_eq!(normalizer.resolve("II"), Resolution::Unknown);
    }

    fn drum_track(name: &str, pitches: &[u8]) -> Track {
        Track {
            name: name.to_string(),
            notes: pitches
                .iter()
                .enumerate()
                .map(|(i, &pitch)| Note {
                    onset_tick: i as u64 * 10,
                    duration_ticks: 5,
                    pitch,
                    velocity: 90,
                    channel: 9,
                    release_velocity: 0,
                })
                .collect(),
            ..Track::default()
        }
    }

    #[test]
    fn test_percussion_refinement() {
        let mut table = PercussionTable::default();
        table.insert(47, "timpani");
        table.insert(81, "triangle");
        let normalizer = Normalizer::with_percussion(table);

        let track = drum_track("Track 10", &[47, 47, 81]);
        assert_eq!(normalizer.resolve_track(&track), known(47));

        let track = drum_track("", &[36, 36, 36, 81]);
        assert_eq!(
            normalizer.resolve_track(&track),
            Resolution::Known(InstrumentId::Percussion)
        );

        let track = drum_track("", &[36]);
        assert_eq!(normalizer.resolve_track(&track), Resolution::Unknown);
    }

    #[test]
    fn test_name_wins_over_pitch_table() {
        let mut table = PercussionTable::default();
        table.insert(47, "timpani");
        let normalizer = Normalizer::with_percussion(table);
        let track = drum_track("Snare Drum", &[47]);
        assert_eq!(
            normalizer.resolve_track(&track),
            Resolution::Known(InstrumentId::Percussion)
        );
    }

    #[test]
    fn test_percussion_without_table_stays_unknown() {
        let track = drum_track("Kit", &[36, 38]);
        assert_eq!(Normalizer::new().resolve_track(&track), Resolution::Unknown);
    }
}
