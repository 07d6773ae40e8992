//! Standard MIDI File reading and writing.
//!
//! Reading flattens every track and channel into one list of notes with times in seconds.
//! Times follow the full tempo map, while [`Performance::tempo_bpm`] keeps only the tempo the
//! first track sets at tick 0, so the tokenizer quantizes the whole file on a single grid.

use std::collections::BTreeMap;
use std::path::Path;

use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use tracing::debug;

use crate::error::{Result, TokenizerError};
use crate::performance::{DEFAULT_BPM, Note, Performance};

/// Resolution of files written by [`Performance::to_smf_bytes`].
pub const TICKS_PER_BEAT: u16 = 480;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
const MAX_DELTA: u64 = (1 << 28) - 1;

/// Piecewise-constant tempo, used to turn absolute ticks into seconds.
struct TempoMap {
    ticks_per_beat: f64,
    /// `(tick, seconds at tick, microseconds per beat from tick on)`, sorted by tick.
    segments: Vec<(u64, f64, f64)>,
}

impl TempoMap {
    /// `changes` must be sorted by tick.
    fn new(ticks_per_beat: u16, changes: Vec<(u64, u32)>) -> Self {
        let ticks_per_beat = ticks_per_beat as f64;

        let mut segments = vec![(0, 0.0, MICROS_PER_MINUTE / DEFAULT_BPM)];
        for (tick, micros) in changes {
            let (last_tick, last_sec, last_micros) = segments[segments.len() - 1];
            let sec = last_sec + (tick - last_tick) as f64 * last_micros / 1e6 / ticks_per_beat;
            if tick == last_tick {
                segments.pop();
            }
            segments.push((tick, sec, micros as f64));
        }
        TempoMap {
            ticks_per_beat,
            segments,
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        let idx = self.segments.partition_point(|&(t, _, _)| t <= tick);
        let (seg_tick, seg_sec, micros) = self.segments[idx.saturating_sub(1)];
        seg_sec + (tick - seg_tick) as f64 * micros / 1e6 / self.ticks_per_beat
    }
}

fn tempo_changes(smf: &Smf) -> Vec<(u64, u32)> {
    let mut changes = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                changes.push((tick, tempo.as_int()));
            }
        }
    }
    changes.sort_by_key(|&(tick, _)| tick);
    changes
}

/// The tempo the file opens with: a tempo event at tick 0 of the first track, the last one
/// winning if there are several. Tempo events later in the file, or in other tracks, do not
/// count as declared.
fn declared_tempo(smf: &Smf) -> Option<u32> {
    let track = smf.tracks.first()?;
    let mut declared = None;
    for event in track {
        if event.delta.as_int() > 0 {
            break;
        }
        if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
            declared = Some(tempo.as_int());
        }
    }
    declared
}

/// Pair note-ons with note-offs per `(channel, key)`.
///
/// A note-off closes every open note of its key that started on an earlier tick; notes started
/// on the same tick stay open. Notes never closed by the end of the track are dropped.
fn collect_notes(track: &Track, tempo: &TempoMap, notes: &mut Vec<Note>) {
    let mut open: BTreeMap<(u8, u8), Vec<(u64, u8)>> = BTreeMap::new();
    let mut tick = 0u64;

    for event in track {
        tick += event.delta.as_int() as u64;
        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let (key, on_velocity) = match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                (key.as_int(), Some(vel.as_int()))
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                (key.as_int(), None)
            }
            _ => continue,
        };
        let held = open.entry((channel.as_int(), key)).or_default();
        match on_velocity {
            Some(velocity) => held.push((tick, velocity)),
            None => {
                let end = tempo.seconds(tick);
                held.retain(|&(start, velocity)| {
                    if start == tick {
                        return true;
                    }
                    notes.push(Note::new(key, velocity, tempo.seconds(start), end));
                    false
                });
            }
        }
    }

    let dropped: usize = open.values().map(Vec::len).sum();
    if dropped > 0 {
        debug!("dropped {} notes with no note-off", dropped);
    }
}

impl Performance {
    /// Load and parse a MIDI file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Parse a MIDI file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => return Err(TokenizerError::UnsupportedTiming),
        };

        let tempo_bpm = declared_tempo(&smf).map(|micros| MICROS_PER_MINUTE / micros as f64);
        let tempo = TempoMap::new(ticks_per_beat, tempo_changes(&smf));

        let mut notes = Vec::new();
        for track in &smf.tracks {
            collect_notes(track, &tempo, &mut notes);
        }
        notes.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));

        debug!(
            "parsed MIDI file: {} tracks, {} ticks per beat, {} notes, tempo {:?}",
            smf.tracks.len(),
            ticks_per_beat,
            notes.len(),
            tempo_bpm
        );
        Ok(Performance::new(notes, tempo_bpm))
    }

    /// Serialize as a single-track MIDI file on channel 0, piano program.
    pub fn to_smf_bytes(&self) -> Result<Vec<u8>> {
        let micros_per_beat = (MICROS_PER_MINUTE / self.effective_bpm()).round() as u32;
        let secs_per_tick = micros_per_beat as f64 / 1e6 / TICKS_PER_BEAT as f64;
        let to_tick = |secs: f64| (secs.max(0.0) / secs_per_tick).round() as u64;

        // (tick, is_on, key, velocity); offs sort before ons on the same tick
        let mut points: Vec<(u64, bool, u8, u8)> = Vec::with_capacity(self.notes.len() * 2);
        for note in &self.notes {
            let key = note.pitch.min(127);
            let start = to_tick(note.start);
            let end = to_tick(note.end).max(start + 1);
            points.push((start, true, key, note.velocity.clamp(1, 127)));
            points.push((end, false, key, 0));
        }
        points.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

        let channel = u4::new(0);
        let mut track: Track = Vec::with_capacity(points.len() + 3);
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_beat))),
        });
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange { program: u7::new(0) },
            },
        });

        let mut last_tick = 0u64;
        for (tick, is_on, key, velocity) in points {
            let message = if is_on {
                MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(velocity),
                }
            } else {
                MidiMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                }
            };
            track.push(TrackEvent {
                delta: u28::new((tick - last_tick).min(MAX_DELTA) as u32),
                kind: TrackEventKind::Midi { channel, message },
            });
            last_tick = tick;
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_BEAT)),
        ));
        smf.tracks.push(track);

        let mut bytes = Vec::new();
        smf.write_std(&mut bytes)?;
        Ok(bytes)
    }

    /// Write as a MIDI file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_smf_bytes()?)?;
        Ok(())
    }
}
