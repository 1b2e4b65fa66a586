//! In-memory score model.
//!
//! A [`Score`] is what the reader produces and the writer consumes. Notes
//! are paired note-on/note-off events; everything else a track carries is
//! kept as a pass-through [`TrackEvent`] and written back verbatim.

use midly::MidiMessage;
use serde::Serialize;

/// The SMF default tempo, used when a file has no tempo events.
pub const DEFAULT_BPM: f64 = 120.0;

/// MIDI channel index of the GM percussion channel (channel 10).
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Standard MIDI File layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFormat {
    /// Format 0: one track.
    SingleTrack,
    /// Format 1: simultaneous tracks.
    Parallel,
}

/// A tempo change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoEvent {
    /// Absolute tick.
    pub tick: u64,
    /// Beats per minute from this tick on.
    pub bpm: f64,
}

/// Ordered, non-empty list of tempo events.
///
/// Ticks before the first event play at [`DEFAULT_BPM`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TempoMap {
    events: Vec<TempoEvent>,
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::constant(DEFAULT_BPM)
    }
}

impl TempoMap {
    /// Builds a map from events in any order.
    ///
    /// Events are sorted by tick (stable, so the last of several events on
    /// one tick wins at lookup time). An empty list yields the default map.
    pub fn new(mut events: Vec<TempoEvent>) -> Self {
        if events.is_empty() {
            return Self::default();
        }
        events.sort_by_key(|e| e.tick);
        Self { events }
    }

    /// A single tempo from tick 0.
    pub fn constant(bpm: f64) -> Self {
        Self {
            events: vec![TempoEvent { tick: 0, bpm }],
        }
    }

    /// Events in tick order.
    pub fn events(&self) -> &[TempoEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether an event sits exactly on `tick`.
    pub fn has_event_at(&self, tick: u64) -> bool {
        self.events.iter().any(|e| e.tick == tick)
    }

    /// Prevailing BPM at `tick`.
    pub fn bpm_at(&self, tick: u64) -> f64 {
        self.events
            .iter()
            .take_while(|e| e.tick <= tick)
            .last()
            .map_or(DEFAULT_BPM, |e| e.bpm)
    }

    /// Inserts an event, keeping tick order.
    pub fn insert(&mut self, event: TempoEvent) {
        let at = self.events.partition_point(|e| e.tick <= event.tick);
        self.events.insert(at, event);
    }

    /// Applies `f` to every BPM, keeping ticks and order.
    pub fn map_bpm(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            events: self
                .events
                .iter()
                .map(|e| TempoEvent {
                    tick: e.tick,
                    bpm: f(e.bpm),
                })
                .collect(),
        }
    }

    /// Segments `(start_tick, bpm)` including the implicit default before the first event.
    fn segments(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        let leading = match self.events.first() {
            Some(first) if first.tick > 0 => Some((0, DEFAULT_BPM)),
            _ => None,
        };
        leading
            .into_iter()
            .chain(self.events.iter().map(|e| (e.tick, e.bpm)))
    }

    /// Converts an absolute tick to seconds.
    pub fn tick_to_seconds(&self, tick: u64, ppq: u16) -> f64 {
        let ppq = f64::from(ppq.max(1));
        let mut seconds = 0.0;
        let mut segments = self.segments().peekable();
        while let Some((start, bpm)) = segments.next() {
            if start >= tick {
                break;
            }
            let end = match segments.peek() {
                Some(&(next, _)) => next.min(tick),
                None => tick,
            };
            seconds += (end - start) as f64 * 60.0 / (bpm * ppq);
        }
        seconds
    }

    /// Converts seconds to the nearest absolute tick.
    pub fn seconds_to_tick(&self, seconds: f64, ppq: u16) -> u64 {
        if !(seconds > 0.0) {
            return 0;
        }
        let ppq = f64::from(ppq.max(1));
        let mut elapsed = 0.0;
        let mut segments = self.segments().peekable();
        while let Some((start, bpm)) = segments.next() {
            let ticks_per_second = bpm * ppq / 60.0;
            match segments.peek() {
                Some(&(next, _)) => {
                    let span = (next - start) as f64 / ticks_per_second;
                    if elapsed + span > seconds {
                        return start + ((seconds - elapsed) * ticks_per_second).round() as u64;
                    }
                    elapsed += span;
                }
                None => {
                    return start + ((seconds - elapsed) * ticks_per_second).round() as u64;
                }
            }
        }
        0
    }
}

/// A sounding note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Absolute onset tick.
    pub onset_tick: u64,
    /// Length in ticks.
    pub duration_ticks: u64,
    /// MIDI key.
    pub pitch: u8,
    /// MIDI velocity.
    pub velocity: u8,
    /// MIDI channel index (0-15).
    pub channel: u8,
    /// Note-off velocity; 0 when the note was closed by a velocity-0 note-on.
    pub release_velocity: u8,
}

impl Note {
    /// Tick of the note-off.
    pub fn end_tick(&self) -> u64 {
        self.onset_tick + self.duration_ticks
    }
}

/// Meta events other than tempo and end-of-track, owned.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    TrackNumber(Option<u16>),
    Text(Vec<u8>),
    Copyright(Vec<u8>),
    TrackName(Vec<u8>),
    InstrumentName(Vec<u8>),
    Lyric(Vec<u8>),
    Marker(Vec<u8>),
    CuePoint(Vec<u8>),
    ProgramName(Vec<u8>),
    DeviceName(Vec<u8>),
    MidiChannel(u8),
    MidiPort(u8),
    SmpteOffset(midly::SmpteTime),
    /// Numerator, denominator exponent, clocks per click, 32nds per quarter.
    TimeSignature(u8, u8, u8, u8),
    /// Sharps (negative for flats) and minor flag.
    KeySignature(i8, bool),
    SequencerSpecific(Vec<u8>),
    Unknown(u8, Vec<u8>),
}

/// Pass-through event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Channel message other than note on/off.
    Midi { channel: u8, message: MidiMessage },
    SysEx(Vec<u8>),
    Escape(Vec<u8>),
    Meta(MetaEvent),
}

/// A pass-through event at an absolute tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    pub tick: u64,
    pub kind: EventKind,
}

impl TrackEvent {
    /// A control change on `channel`.
    pub fn control_change(tick: u64, channel: u8, controller: u8, value: u8) -> Self {
        Self {
            tick,
            kind: EventKind::Midi {
                channel: channel & 0x0F,
                message: MidiMessage::Controller {
                    controller: (controller & 0x7F).into(),
                    value: (value & 0x7F).into(),
                },
            },
        }
    }
}

/// One track of a score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    /// Raw name from the track-name meta event, else the instrument-name one.
    pub name: String,
    /// GM program from the first program change.
    pub program: Option<u8>,
    /// Notes ordered by onset.
    pub notes: Vec<Note>,
    /// Pass-through events ordered by tick.
    pub events: Vec<TrackEvent>,
}

impl Track {
    /// Whether every note plays on the GM percussion channel.
    pub fn is_percussion(&self) -> bool {
        !self.notes.is_empty() && self.notes.iter().all(|n| n.channel == PERCUSSION_CHANNEL)
    }

    /// Channel the track plays on: first note's, else first channel event's, else 0.
    pub fn channel(&self) -> u8 {
        self.notes
            .first()
            .map(|n| n.channel)
            .or_else(|| {
                self.events.iter().find_map(|e| match e.kind {
                    EventKind::Midi { channel, .. } => Some(channel),
                    _ => None,
                })
            })
            .unwrap_or(0)
    }

    /// Tick of the last note-off, or 0 for a track without notes.
    pub fn notes_end_tick(&self) -> u64 {
        self.notes.iter().map(Note::end_tick).max().unwrap_or(0)
    }

    /// Last tick holding anything.
    pub fn end_tick(&self) -> u64 {
        let events = self.events.iter().map(|e| e.tick).max().unwrap_or(0);
        self.notes_end_tick().max(events)
    }

    /// Most frequent pitch, lowest pitch first on ties.
    pub fn pitch_histogram(&self) -> Vec<(u8, usize)> {
        let mut counts = [0usize; 128];
        for note in &self.notes {
            counts[(note.pitch & 0x7F) as usize] += 1;
        }
        let mut histogram: Vec<(u8, usize)> = counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(pitch, count)| (pitch as u8, *count))
            .collect();
        histogram.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        histogram
    }
}

/// A parsed score.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Ticks per quarter note.
    pub ppq: u16,
    pub format: ScoreFormat,
    /// Global tempo map.
    pub tempo_map: TempoMap,
    pub tracks: Vec<Track>,
}

impl Score {
    /// An empty score with no tracks.
    pub fn new(ppq: u16) -> Self {
        Self {
            ppq,
            format: ScoreFormat::Parallel,
            tempo_map: TempoMap::default(),
            tracks: Vec::new(),
        }
    }

    /// Last tick of any track.
    pub fn end_tick(&self) -> u64 {
        self.tracks.iter().map(Track::end_tick).max().unwrap_or(0)
    }

    /// Seconds at `tick` under this score's tempo map.
    pub fn seconds_at(&self, tick: u64) -> f64 {
        self.tempo_map.tick_to_seconds(tick, self.ppq)
    }

    /// Total number of notes.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(onset: u64, duration: u64, pitch: u8, channel: u8) -> Note {
        Note {
            onset_tick: onset,
            duration_ticks: duration,
            pitch,
            velocity: 64,
            channel,
            release_velocity: 0,
        }
    }

    #[test]
    fn test_constant_tempo_conversion() {
        let map = TempoMap::constant(120.0);
        // 480 ticks at 120 BPM and 480 PPQ is half a second.
        assert!((map.tick_to_seconds(480, 480) - 0.5).abs() < 1e-12);
        assert_eq!(map.seconds_to_tick(0.5, 480), 480);
        assert_eq!(map.seconds_to_tick(-1.0, 480), 0);
    }

    #[test]
    fn test_tempo_change_conversion() {
        let map = TempoMap::new(vec![
            TempoEvent {
                tick: 960,
                bpm: 60.0,
            },
            TempoEvent { tick: 0, bpm: 120.0 },
        ]);
        assert_eq!(map.events()[0].tick, 0);
        // 960 ticks at 120 = 1s, then 480 ticks at 60 = 1s.
        assert!((map.tick_to_seconds(1440, 480) - 2.0).abs() < 1e-12);
        assert_eq!(map.seconds_to_tick(2.0, 480), 1440);
        assert_eq!(map.seconds_to_tick(0.5, 480), 480);
        assert_eq!(map.bpm_at(959), 120.0);
        assert_eq!(map.bpm_at(960), 60.0);
    }

    #[test]
    fn test_implicit_default_before_first_event() {
        let map = TempoMap::new(vec![TempoEvent {
            tick: 480,
            bpm: 60.0,
        }]);
        assert_eq!(map.bpm_at(0), DEFAULT_BPM);
        assert!((map.tick_to_seconds(960, 480) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut map = TempoMap::default();
        map.insert(TempoEvent {
            tick: 100,
            bpm: 90.0,
        });
        map.insert(TempoEvent { tick: 50, bpm: 80.0 });
        let ticks: Vec<u64> = map.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 50, 100]);
        assert!(map.has_event_at(50));
        assert!(!map.has_event_at(51));
    }

    #[test]
    fn test_track_queries() {
        let track = Track {
            name: "Timpani".to_string(),
            program: None,
            notes: vec![note(0, 10, 47, 9), note(20, 30, 47, 9), note(40, 5, 45, 9)],
            events: vec![TrackEvent::control_change(100, 9, 7, 100)],
        };
        assert!(track.is_percussion());
        assert_eq!(track.channel(), 9);
        assert_eq!(track.notes_end_tick(), 50);
        assert_eq!(track.end_tick(), 100);
        assert_eq!(track.pitch_histogram(), vec![(47, 2), (45, 1)]);
    }

    #[test]
    fn test_empty_track_is_not_percussion() {
        let track = Track::default();
        assert!(!track.is_percussion());
        assert_eq!(track.channel(), 0);
        assert_eq!(track.end_tick(), 0);
    }
}
