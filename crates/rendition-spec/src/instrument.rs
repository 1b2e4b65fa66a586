//! General MIDI instrument identifiers and the static alias table.
//!
//! The alias table maps normalized free-text names (lowercase, punctuation
//! replaced by spaces, whitespace collapsed) to canonical GM ids. It is built
//! once per process and never mutated.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Canonical General MIDI melodic program names, indexed by program number.
pub const GM_PROGRAM_NAMES: [&str; 128] = [
    "acoustic_grand_piano",
    "bright_acoustic_piano",
    "electric_grand_piano",
    "honky_tonk_piano",
    "electric_piano_1",
    "electric_piano_2",
    "harpsichord",
    "clavinet",
    "celesta",
    "glockenspiel",
    "music_box",
    "vibraphone",
    "marimba",
    "xylophone",
    "tubular_bells",
    "dulcimer",
    "drawbar_organ",
    "percussive_organ",
    "rock_organ",
    "church_organ",
    "reed_organ",
    "accordion",
    "harmonica",
    "tango_accordion",
    "acoustic_guitar_nylon",
    "acoustic_guitar_steel",
    "electric_guitar_jazz",
    "electric_guitar_clean",
    "electric_guitar_muted",
    "overdriven_guitar",
    "distortion_guitar",
    "guitar_harmonics",
    "acoustic_bass",
    "electric_bass_finger",
    "electric_bass_pick",
    "fretless_bass",
    "slap_bass_1",
    "slap_bass_2",
    "synth_bass_1",
    "synth_bass_2",
    "violin",
    "viola",
    "cello",
    "contrabass",
    "tremolo_strings",
    "pizzicato_strings",
    "orchestral_harp",
    "timpani",
    "string_ensemble_1",
    "string_ensemble_2",
    "synth_strings_1",
    "synth_strings_2",
    "choir_aahs",
    "voice_oohs",
    "synth_voice",
    "orchestra_hit",
    "trumpet",
    "trombone",
    "tuba",
    "muted_trumpet",
    "french_horn",
    "brass_section",
    "synth_brass_1",
    "synth_brass_2",
    "soprano_sax",
    "alto_sax",
    "tenor_sax",
    "baritone_sax",
    "oboe",
    "english_horn",
    "bassoon",
    "clarinet",
    "piccolo",
    "flute",
    "recorder",
    "pan_flute",
    "blown_bottle",
    "shakuhachi",
    "whistle",
    "ocarina",
    "lead_1_square",
    "lead_2_sawtooth",
    "lead_3_calliope",
    "lead_4_chiff",
    "lead_5_charang",
    "lead_6_voice",
    "lead_7_fifths",
    "lead_8_bass_lead",
    "pad_1_new_age",
    "pad_2_warm",
    "pad_3_polysynth",
    "pad_4_choir",
    "pad_5_bowed",
    "pad_6_metallic",
    "pad_7_halo",
    "pad_8_sweep",
    "fx_1_rain",
    "fx_2_soundtrack",
    "fx_3_crystal",
    "fx_4_atmosphere",
    "fx_5_brightness",
    "fx_6_goblins",
    "fx_7_echoes",
    "fx_8_sci_fi",
    "sitar",
    "banjo",
    "shamisen",
    "koto",
    "kalimba",
    "bagpipe",
    "fiddle",
    "shanai",
    "tinkle_bell",
    "agogo",
    "steel_drums",
    "woodblock",
    "taiko_drum",
    "melodic_tom",
    "synth_drum",
    "reverse_cymbal",
    "guitar_fret_noise",
    "breath_noise",
    "seashore",
    "bird_tweet",
    "telephone_ring",
    "helicopter",
    "applause",
    "gunshot",
];

/// Canonical General MIDI instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentId {
    /// Melodic program 0-127.
    Program(u8),
    /// The GM drum kit (channel 10).
    Percussion,
}

impl InstrumentId {
    /// Canonical snake_case name ("violin", "percussion", ...).
    pub fn canonical_name(&self) -> &'static str {
        match self {
            InstrumentId::Program(program) => GM_PROGRAM_NAMES[(*program & 0x7F) as usize],
            InstrumentId::Percussion => "percussion",
        }
    }

    /// GM program number, if melodic.
    pub fn program(&self) -> Option<u8> {
        match self {
            InstrumentId::Program(program) => Some(*program),
            InstrumentId::Percussion => None,
        }
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Orchestral and common spellings, eligible for whole-token fuzzy matching.
const ALIASES: &[(&str, InstrumentId)] = &[
    // Strings
    ("violin", InstrumentId::Program(40)),
    ("violins", InstrumentId::Program(40)),
    ("violino", InstrumentId::Program(40)),
    ("violini", InstrumentId::Program(40)),
    ("viola", InstrumentId::Program(41)),
    ("violas", InstrumentId::Program(41)),
    ("viole", InstrumentId::Program(41)),
    ("cello", InstrumentId::Program(42)),
    ("cellos", InstrumentId::Program(42)),
    ("celli", InstrumentId::Program(42)),
    ("violoncello", InstrumentId::Program(42)),
    ("violoncelli", InstrumentId::Program(42)),
    ("contrabass", InstrumentId::Program(43)),
    ("contrabasses", InstrumentId::Program(43)),
    ("double bass", InstrumentId::Program(43)),
    ("double basses", InstrumentId::Program(43)),
    ("kontrabass", InstrumentId::Program(43)),
    ("bass", InstrumentId::Program(43)),
    ("basses", InstrumentId::Program(43)),
    ("strings", InstrumentId::Program(48)),
    ("string ensemble", InstrumentId::Program(48)),
    ("string section", InstrumentId::Program(48)),
    ("tremolo strings", InstrumentId::Program(44)),
    ("pizzicato strings", InstrumentId::Program(45)),
    ("pizz strings", InstrumentId::Program(45)),
    ("harp", InstrumentId::Program(46)),
    ("harps", InstrumentId::Program(46)),
    // Woodwinds
    ("piccolo", InstrumentId::Program(72)),
    ("flute", InstrumentId::Program(73)),
    ("flutes", InstrumentId::Program(73)),
    ("alto flute", InstrumentId::Program(73)),
    ("oboe", InstrumentId::Program(68)),
    ("oboes", InstrumentId::Program(68)),
    ("english horn", InstrumentId::Program(69)),
    ("cor anglais", InstrumentId::Program(69)),
    ("corno inglese", InstrumentId::Program(69)),
    ("clarinet", InstrumentId::Program(71)),
    ("clarinets", InstrumentId::Program(71)),
    ("bass clarinet", InstrumentId::Program(71)),
    ("bassoon", InstrumentId::Program(70)),
    ("bassoons", InstrumentId::Program(70)),
    ("contrabassoon", InstrumentId::Program(70)),
    ("fagotto", InstrumentId::Program(70)),
    ("soprano saxophone", InstrumentId::Program(64)),
    ("alto saxophone", InstrumentId::Program(65)),
    ("tenor saxophone", InstrumentId::Program(66)),
    ("baritone saxophone", InstrumentId::Program(67)),
    // Brass
    ("horn", InstrumentId::Program(60)),
    ("horns", InstrumentId::Program(60)),
    ("corno", InstrumentId::Program(60)),
    ("trumpet", InstrumentId::Program(56)),
    ("trumpets", InstrumentId::Program(56)),
    ("tromba", InstrumentId::Program(56)),
    ("trombone", InstrumentId::Program(57)),
    ("trombones", InstrumentId::Program(57)),
    ("bass trombone", InstrumentId::Program(57)),
    ("tuba", InstrumentId::Program(58)),
    ("tubas", InstrumentId::Program(58)),
    ("brass", InstrumentId::Program(61)),
    // Keyboards and pitched percussion
    ("piano", InstrumentId::Program(0)),
    ("pianoforte", InstrumentId::Program(0)),
    ("grand piano", InstrumentId::Program(0)),
    ("cembalo", InstrumentId::Program(6)),
    ("organ", InstrumentId::Program(19)),
    ("celeste", InstrumentId::Program(8)),
    ("vibes", InstrumentId::Program(11)),
    ("chimes", InstrumentId::Program(14)),
    ("timpano", InstrumentId::Program(47)),
    ("kettle drums", InstrumentId::Program(47)),
    ("guitar", InstrumentId::Program(24)),
    // Voices
    ("choir", InstrumentId::Program(52)),
    ("chorus", InstrumentId::Program(52)),
    // Unpitched percussion
    ("percussion", InstrumentId::Percussion),
    ("drums", InstrumentId::Percussion),
    ("drum kit", InstrumentId::Percussion),
    ("drum set", InstrumentId::Percussion),
    ("snare drum", InstrumentId::Percussion),
    ("bass drum", InstrumentId::Percussion),
    ("cymbals", InstrumentId::Percussion),
    ("crash cymbal", InstrumentId::Percussion),
    ("suspended cymbal", InstrumentId::Percussion),
    ("triangle", InstrumentId::Percussion),
    ("tambourine", InstrumentId::Percussion),
    ("tam tam", InstrumentId::Percussion),
    ("gong", InstrumentId::Percussion),
    ("castanets", InstrumentId::Percussion),
];

/// Score abbreviations; only matched against the whole normalized name.
const ABBREVIATIONS: &[(&str, InstrumentId)] = &[
    ("vln", InstrumentId::Program(40)),
    ("vn", InstrumentId::Program(40)),
    ("vl", InstrumentId::Program(40)),
    ("vla", InstrumentId::Program(41)),
    ("va", InstrumentId::Program(41)),
    ("vc", InstrumentId::Program(42)),
    ("vlc", InstrumentId::Program(42)),
    ("cb", InstrumentId::Program(43)),
    ("db", InstrumentId::Program(43)),
    ("picc", InstrumentId::Program(72)),
    ("fl", InstrumentId::Program(73)),
    ("ob", InstrumentId::Program(68)),
    ("eh", InstrumentId::Program(69)),
    ("cl", InstrumentId::Program(71)),
    ("cl b", InstrumentId::Program(71)),
    ("bcl", InstrumentId::Program(71)),
    ("bsn", InstrumentId::Program(70)),
    ("fg", InstrumentId::Program(70)),
    ("hn", InstrumentId::Program(60)),
    ("hrn", InstrumentId::Program(60)),
    ("tpt", InstrumentId::Program(56)),
    ("trp", InstrumentId::Program(56)),
    ("tbn", InstrumentId::Program(57)),
    ("trb", InstrumentId::Program(57)),
    ("tba", InstrumentId::Program(58)),
    ("timp", InstrumentId::Program(47)),
    ("timps", InstrumentId::Program(47)),
    ("glock", InstrumentId::Program(9)),
    ("xylo", InstrumentId::Program(13)),
    ("pno", InstrumentId::Program(0)),
    ("perc", InstrumentId::Percussion),
];

/// Normalizes a free-text name: lowercase, non-alphanumerics to spaces, whitespace collapsed.
///
/// # Example
/// ```
/// use rendition_spec::instrument::normalize_name;
///
/// assert_eq!(normalize_name("  Violin_I (solo) "), "violin i solo");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Process-wide alias table.
#[derive(Debug)]
pub struct GmTable {
    /// Fuzzy-eligible aliases, including canonical GM names.
    aliases: HashMap<String, InstrumentId>,
    /// Exact-only abbreviations.
    abbreviations: HashMap<String, InstrumentId>,
    /// Longest alias length in tokens.
    max_alias_tokens: usize,
}

static GM_TABLE: OnceLock<GmTable> = OnceLock::new();

/// Returns the process-wide GM table, building it on first use.
pub fn gm_table() -> &'static GmTable {
    GM_TABLE.get_or_init(GmTable::build)
}

impl GmTable {
    fn build() -> Self {
        let mut aliases = HashMap::new();
        for (program, name) in GM_PROGRAM_NAMES.iter().enumerate() {
            aliases.insert(normalize_name(name), InstrumentId::Program(program as u8));
        }
        for (alias, id) in ALIASES {
            aliases.insert(normalize_name(alias), *id);
        }

        let abbreviations = ABBREVIATIONS
            .iter()
            .map(|(alias, id)| (normalize_name(alias), *id))
            .collect();

        let max_alias_tokens = aliases
            .keys()
            .map(|alias| alias.split(' ').count())
            .max()
            .unwrap_or(1);

        Self {
            aliases,
            abbreviations,
            max_alias_tokens,
        }
    }

    /// Exact lookup of an already-normalized name.
    pub fn exact(&self, normalized: &str) -> Option<InstrumentId> {
        self.aliases
            .get(normalized)
            .or_else(|| self.abbreviations.get(normalized))
            .copied()
    }

    /// Longest alias appearing as a contiguous run of whole tokens.
    ///
    /// Ties between equally long aliases go to the leftmost occurrence.
    pub fn longest_token_match(&self, tokens: &[&str]) -> Option<InstrumentId> {
        let longest = self.max_alias_tokens.min(tokens.len());
        for width in (1..=longest).rev() {
            for window in tokens.windows(width) {
                if let Some(id) = self.aliases.get(&window.join(" ")) {
                    return Some(*id);
                }
            }
        }
        None
    }

    /// Number of fuzzy-eligible aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
