//! Standard MIDI File reading and writing.
//!
//! The reader pairs note-on/note-off events into [`Note`]s (first-in,
//! first-out per channel and key), collects tempo events from every track
//! into one global [`TempoMap`], and keeps all other events as pass-through.
//! Format 2 files, whose tracks each carry their own tempo, are rejected.
//! The writer reverses this; tempo events land in the first track. Every
//! note ends in a note-off carrying its release velocity, so a note closed
//! by a velocity-0 note-on is written back as a note-off with velocity 0.

use std::collections::{HashMap, VecDeque};

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use rendition_spec::MICROS_PER_MINUTE;

use crate::error::{MidiError, MidiResult};
use crate::score::{
    EventKind, MetaEvent, Note, Score, ScoreFormat, TempoEvent, TempoMap, Track, TrackEvent,
};

/// Parses SMF bytes into a [`Score`].
pub fn parse_score(bytes: &[u8]) -> MidiResult<Score> {
    let smf = Smf::parse(bytes)?;

    let ppq = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, subframes) => {
            return Err(MidiError::UnsupportedTiming(format!(
                "SMPTE timecode ({:?}, {} subframes)",
                fps,
                subframes
            )))
        }
    };
    let format = match smf.header.format {
        Format::SingleTrack => ScoreFormat::SingleTrack,
        Format::Parallel => ScoreFormat::Parallel,
        Format::Sequential => {
            return Err(MidiError::UnsupportedTiming(
                "format 2 (independent sequences with per-track tempo)".to_string(),
            ))
        }
    };

    let mut tempo_events = Vec::new();
    let tracks = smf
        .tracks
        .iter()
        .map(|events| read_track(events, &mut tempo_events))
        .collect();

    Ok(Score {
        ppq,
        format,
        tempo_map: TempoMap::new(tempo_events),
        tracks,
    })
}

fn read_track(events: &[midly::TrackEvent<'_>], tempo: &mut Vec<TempoEvent>) -> Track {
    let mut track = Track::default();
    let mut instrument_name: Option<String> = None;
    let mut pending: HashMap<(u8, u8), VecDeque<(u64, u8)>> = HashMap::new();
    let mut tick = 0u64;

    for event in events {
        tick += u64::from(event.delta.as_int());
        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        pending
                            .entry((channel, key.as_int()))
                            .or_default()
                            .push_back((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let release = match message {
                            MidiMessage::NoteOff { vel, .. } => vel.as_int(),
                            _ => 0,
                        };
                        let opened = pending
                            .get_mut(&(channel, key.as_int()))
                            .and_then(VecDeque::pop_front);
                        if let Some((onset, velocity)) = opened {
                            track.notes.push(Note {
                                onset_tick: onset,
                                duration_ticks: tick - onset,
                                pitch: key.as_int(),
                                velocity,
                                channel,
                                release_velocity: release,
                            });
                        }
                    }
                    other => {
                        if let MidiMessage::ProgramChange { program } = other {
                            track.program.get_or_insert(program.as_int());
                        }
                        track.events.push(TrackEvent {
                            tick,
                            kind: EventKind::Midi {
                                channel,
                                message: other,
                            },
                        });
                    }
                }
            }
            TrackEventKind::SysEx(data) => track.events.push(TrackEvent {
                tick,
                kind: EventKind::SysEx(data.to_vec()),
            }),
            TrackEventKind::Escape(data) => track.events.push(TrackEvent {
                tick,
                kind: EventKind::Escape(data.to_vec()),
            }),
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                let micros = micros.as_int().max(1);
                tempo.push(TempoEvent {
                    tick,
                    bpm: MICROS_PER_MINUTE / f64::from(micros),
                });
            }
            TrackEventKind::Meta(meta) => {
                let Some(meta) = own_meta(meta) else {
                    continue;
                };
                match &meta {
                    MetaEvent::TrackName(name) if track.name.is_empty() => {
                        track.name = String::from_utf8_lossy(name).trim().to_string();
                    }
                    MetaEvent::InstrumentName(name) if instrument_name.is_none() => {
                        instrument_name = Some(String::from_utf8_lossy(name).trim().to_string());
                    }
                    _ => {}
                }
                track.events.push(TrackEvent {
                    tick,
                    kind: EventKind::Meta(meta),
                });
            }
        }
    }

    // Notes still sounding at the end of the track are closed there.
    let mut unterminated: Vec<Note> = pending
        .into_iter()
        .flat_map(|((channel, pitch), opened)| {
            opened.into_iter().map(move |(onset, velocity)| Note {
                onset_tick: onset,
                duration_ticks: tick - onset,
                pitch,
                velocity,
                channel,
                release_velocity: 0,
            })
        })
        .collect();
    track.notes.append(&mut unterminated);
    track
        .notes
        .sort_by_key(|n| (n.onset_tick, n.channel, n.pitch, n.duration_ticks, n.velocity));

    if track.name.is_empty() {
        if let Some(name) = instrument_name {
            track.name = name;
        }
    }
    track
}

/// Owned copy of a pass-through meta message; `None` for tempo and end-of-track.
fn own_meta(meta: MetaMessage<'_>) -> Option<MetaEvent> {
    let owned = match meta {
        MetaMessage::TrackNumber(n) => MetaEvent::TrackNumber(n),
        MetaMessage::Text(t) => MetaEvent::Text(t.to_vec()),
        MetaMessage::Copyright(t) => MetaEvent::Copyright(t.to_vec()),
        MetaMessage::TrackName(t) => MetaEvent::TrackName(t.to_vec()),
        MetaMessage::InstrumentName(t) => MetaEvent::InstrumentName(t.to_vec()),
        MetaMessage::Lyric(t) => MetaEvent::Lyric(t.to_vec()),
        MetaMessage::Marker(t) => MetaEvent::Marker(t.to_vec()),
        MetaMessage::CuePoint(t) => MetaEvent::CuePoint(t.to_vec()),
        MetaMessage::ProgramName(t) => MetaEvent::ProgramName(t.to_vec()),
        MetaMessage::DeviceName(t) => MetaEvent::DeviceName(t.to_vec()),
        MetaMessage::MidiChannel(c) => MetaEvent::MidiChannel(c.as_int()),
        MetaMessage::MidiPort(p) => MetaEvent::MidiPort(p.as_int()),
        MetaMessage::SmpteOffset(time) => MetaEvent::SmpteOffset(time),
        MetaMessage::TimeSignature(n, d, c, b) => MetaEvent::TimeSignature(n, d, c, b),
        MetaMessage::KeySignature(sharps, minor) => MetaEvent::KeySignature(sharps, minor),
        MetaMessage::SequencerSpecific(data) => MetaEvent::SequencerSpecific(data.to_vec()),
        MetaMessage::Unknown(kind, data) => MetaEvent::Unknown(kind, data.to_vec()),
        MetaMessage::Tempo(_) | MetaMessage::EndOfTrack => return None,
    };
    Some(owned)
}

fn borrow_meta(meta: &MetaEvent) -> MetaMessage<'_> {
    match meta {
        MetaEvent::TrackNumber(n) => MetaMessage::TrackNumber(*n),
        MetaEvent::Text(t) => MetaMessage::Text(t),
        MetaEvent::Copyright(t) => MetaMessage::Copyright(t),
        MetaEvent::TrackName(t) => MetaMessage::TrackName(t),
        MetaEvent::InstrumentName(t) => MetaMessage::InstrumentName(t),
        MetaEvent::Lyric(t) => MetaMessage::Lyric(t),
        MetaEvent::Marker(t) => MetaMessage::Marker(t),
        MetaEvent::CuePoint(t) => MetaMessage::CuePoint(t),
        MetaEvent::ProgramName(t) => MetaMessage::ProgramName(t),
        MetaEvent::DeviceName(t) => MetaMessage::DeviceName(t),
        MetaEvent::MidiChannel(c) => MetaMessage::MidiChannel(u4::new(*c)),
        MetaEvent::MidiPort(p) => MetaMessage::MidiPort(u7::new(*p)),
        MetaEvent::SmpteOffset(time) => MetaMessage::SmpteOffset(*time),
        MetaEvent::TimeSignature(n, d, c, b) => MetaMessage::TimeSignature(*n, *d, *c, *b),
        MetaEvent::KeySignature(sharps, minor) => MetaMessage::KeySignature(*sharps, *minor),
        MetaEvent::SequencerSpecific(data) => MetaMessage::SequencerSpecific(data),
        MetaEvent::Unknown(kind, data) => MetaMessage::Unknown(*kind, data),
    }
}

/// Ordering of simultaneous events on write.
///
/// Meta and system events come first, then note-offs, then controller and
/// program messages, then note-ons. A zero-length note's off goes last so it
/// still follows its own on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Meta,
    NoteOff,
    Channel,
    NoteOn,
    ZeroLengthOff,
}

/// Serializes a [`Score`] to SMF bytes.
pub fn write_score(score: &Score) -> MidiResult<Vec<u8>> {
    let ppq = u15::try_from(score.ppq)
        .ok_or_else(|| MidiError::out_of_range("ppq", u64::from(score.ppq)))?;
    let format = match score.format {
        ScoreFormat::SingleTrack if score.tracks.len() <= 1 => Format::SingleTrack,
        ScoreFormat::SingleTrack | ScoreFormat::Parallel => Format::Parallel,
    };
    let mut smf = Smf::new(Header::new(format, Timing::Metrical(ppq)));

    let tempo = tempo_events(&score.tempo_map)?;
    let empty = Track::default();
    let track_count = score.tracks.len().max(1);
    for index in 0..track_count {
        let track = score.tracks.get(index).unwrap_or(&empty);
        let tempo = if index == 0 { tempo.as_slice() } else { &[] };
        smf.tracks.push(write_track(track, tempo)?);
    }

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn tempo_events(map: &TempoMap) -> MidiResult<Vec<(u64, u24)>> {
    map.events()
        .iter()
        .map(|e| {
            let micros = (MICROS_PER_MINUTE / e.bpm).round().max(1.0) as u32;
            u24::try_from(micros)
                .map(|m| (e.tick, m))
                .ok_or_else(|| MidiError::out_of_range("tempo", u64::from(micros)))
        })
        .collect()
}

fn write_track<'a>(
    track: &'a Track,
    tempo: &[(u64, u24)],
) -> MidiResult<Vec<midly::TrackEvent<'a>>> {
    let mut timed: Vec<(u64, Slot, TrackEventKind<'a>)> =
        Vec::with_capacity(track.events.len() + tempo.len() + track.notes.len() * 2);

    for event in &track.events {
        let (slot, kind) = match &event.kind {
            EventKind::Midi { channel, message } => (
                Slot::Channel,
                TrackEventKind::Midi {
                    channel: u4::new(*channel),
                    message: *message,
                },
            ),
            EventKind::SysEx(data) => (Slot::Meta, TrackEventKind::SysEx(data)),
            EventKind::Escape(data) => (Slot::Meta, TrackEventKind::Escape(data)),
            EventKind::Meta(meta) => (Slot::Meta, TrackEventKind::Meta(borrow_meta(meta))),
        };
        timed.push((event.tick, slot, kind));
    }

    for &(tick, micros) in tempo {
        timed.push((tick, Slot::Meta, TrackEventKind::Meta(MetaMessage::Tempo(micros))));
    }

    for note in &track.notes {
        let channel = u4::new(note.channel);
        let key = u7::new(note.pitch);
        timed.push((
            note.onset_tick,
            Slot::NoteOn,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity),
                },
            },
        ));
        let off_slot = if note.duration_ticks == 0 {
            Slot::ZeroLengthOff
        } else {
            Slot::NoteOff
        };
        timed.push((
            note.end_tick(),
            off_slot,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(note.release_velocity),
                },
            },
        ));
    }

    timed.sort_by_key(|(tick, slot, _)| (*tick, *slot));

    let mut events = Vec::with_capacity(timed.len() + 1);
    let mut last = 0u64;
    for (tick, _, kind) in timed {
        events.push(midly::TrackEvent {
            delta: delta_ticks(tick - last)?,
            kind,
        });
        last = tick;
    }
    events.push(midly::TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(events)
}

fn delta_ticks(delta: u64) -> MidiResult<u28> {
    u32::try_from(delta)
        .ok()
        .and_then(u28::try_from)
        .ok_or_else(|| MidiError::out_of_range("delta", delta))
}
