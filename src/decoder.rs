//! Token sequence to performance.
//!
//! Decoding is tolerant: IDs outside the vocabulary and note-offs with nothing to release are
//! skipped, and notes still sounding when the stream ends are closed one step after the cursor.
//! The output is always rebuilt at [`RECONSTRUCT_BPM`].

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::base::Token;
use crate::event::{Event, PITCHES, VELOCITY_BINS};
use crate::performance::{Note, Performance, RECONSTRUCT_BPM, bin_to_velocity, seconds_per_step};
use crate::vocab::Vocabulary;

/// Bin used for note-ons that appear before any velocity token.
pub const DEFAULT_VELOCITY_BIN: u8 = 16;

/// A note-on waiting for its note-off.
#[derive(Debug, Clone, Copy)]
struct Pending {
    start_step: u64,
    bin: u8,
}

/// Incremental decoder. Feed it tokens in order, then call [`Decoder::finish`].
pub struct Decoder<'a> {
    vocab: &'a Vocabulary,
    current_step: u64,
    velocity_bin: u8,
    active: [VecDeque<Pending>; PITCHES as usize],
    notes: Vec<Note>,
    seconds_per_step: f64,
}

impl<'a> Decoder<'a> {
    pub fn new(vocab: &'a Vocabulary) -> Self {
        Decoder {
            vocab,
            current_step: 0,
            velocity_bin: DEFAULT_VELOCITY_BIN,
            active: std::array::from_fn(|_| VecDeque::new()),
            notes: Vec::new(),
            seconds_per_step: seconds_per_step(RECONSTRUCT_BPM),
        }
    }

    pub fn push_token(&mut self, id: Token) {
        match self.vocab.decode(id) {
            Ok(event) => self.push_event(event),
            Err(_) => trace!("skipping unknown token {}", id),
        }
    }

    pub fn push_event(&mut self, event: Event) {
        match event {
            Event::TimeShift { steps } => self.current_step += steps as u64,
            Event::Velocity { bin } => self.velocity_bin = bin.min(VELOCITY_BINS - 1),
            Event::NoteOn { pitch } => {
                let pitch = pitch.min(PITCHES - 1);
                self.active[pitch as usize].push_back(Pending {
                    start_step: self.current_step,
                    bin: self.velocity_bin,
                });
            }
            Event::NoteOff { pitch } => {
                let pitch = pitch.min(PITCHES - 1);
                match self.active[pitch as usize].pop_front() {
                    Some(pending) => {
                        let end_step = self.current_step.max(pending.start_step + 1);
                        self.emit(pitch, pending, end_step);
                    }
                    None => trace!(
                        "ignoring Note-Off_{} at step {} with no pending note",
                        pitch,
                        self.current_step
                    ),
                }
            }
        }
    }

    /// Current position of the time cursor, in steps.
    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    fn emit(&mut self, pitch: u8, pending: Pending, end_step: u64) {
        self.notes.push(Note {
            pitch,
            velocity: bin_to_velocity(pending.bin),
            start: pending.start_step as f64 * self.seconds_per_step,
            end: end_step as f64 * self.seconds_per_step,
        });
    }

    /// Close whatever is still sounding and return the notes sorted by `(start, pitch)`.
    pub fn finish(mut self) -> Performance {
        let mut forced = 0;
        for pitch in 0..PITCHES {
            while let Some(pending) = self.active[pitch as usize].pop_front() {
                let end_step = self.current_step.max(pending.start_step) + 1;
                self.emit(pitch, pending, end_step);
                forced += 1;
            }
        }
        if forced > 0 {
            debug!("closed {} unterminated notes at end of stream", forced);
        }

        let mut notes = self.notes;
        notes.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
        Performance::new(notes, Some(RECONSTRUCT_BPM))
    }
}

pub fn decode(vocab: &Vocabulary, ids: &[Token]) -> Performance {
    let mut decoder = Decoder::new(vocab);
    for &id in ids {
        decoder.push_token(id);
    }
    let performance = decoder.finish();
    debug!(
        "decoded {} tokens into {} notes",
        ids.len(),
        performance.notes.len()
    );
    performance
}
