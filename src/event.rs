//! Symbolic events that make up a token stream.
//!
//! There are four families: note-on and note-off per pitch, a coarse velocity bin that colors
//! the next note-on, and a time shift that moves the cursor forward by a number of steps.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TokenizerError};

/// Number of MIDI pitches.
pub const PITCHES: u8 = 128;
/// Number of velocity bins.
pub const VELOCITY_BINS: u8 = 32;
/// Largest gap a single time-shift token can express.
pub const MAX_TIME_SHIFT_STEPS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    NoteOn { pitch: u8 },
    NoteOff { pitch: u8 },
    Velocity { bin: u8 },
    TimeShift { steps: u8 },
}

impl Event {
    pub fn note_on(pitch: u8) -> Result<Self> {
        Event::NoteOn { pitch }.checked()
    }

    pub fn note_off(pitch: u8) -> Result<Self> {
        Event::NoteOff { pitch }.checked()
    }

    pub fn velocity(bin: u8) -> Result<Self> {
        Event::Velocity { bin }.checked()
    }

    pub fn time_shift(steps: u8) -> Result<Self> {
        Event::TimeShift { steps }.checked()
    }

    /// Whether the payload lies inside the range its family declares.
    pub fn is_valid(&self) -> bool {
        match *self {
            Event::NoteOn { pitch } | Event::NoteOff { pitch } => pitch < PITCHES,
            Event::Velocity { bin } => bin < VELOCITY_BINS,
            Event::TimeShift { steps } => (1..=MAX_TIME_SHIFT_STEPS).contains(&steps),
        }
    }

    fn checked(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(TokenizerError::UnknownEvent(self.to_string()))
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::NoteOn { pitch } => write!(f, "Note-On_{}", pitch),
            Event::NoteOff { pitch } => write!(f, "Note-Off_{}", pitch),
            Event::Velocity { bin } => write!(f, "Velocity_{}", bin),
            Event::TimeShift { steps } => write!(f, "Time-Shift_{}", steps),
        }
    }
}

impl FromStr for Event {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || TokenizerError::UnknownEvent(s.to_string());
        let (kind, value) = s.split_once('_').ok_or_else(unknown)?;
        let value: u8 = value.parse().map_err(|_| unknown())?;
        let event = match kind {
            "Note-On" => Event::NoteOn { pitch: value },
            "Note-Off" => Event::NoteOff { pitch: value },
            "Velocity" => Event::Velocity { bin: value },
            "Time-Shift" => Event::TimeShift { steps: value },
            _ => return Err(unknown()),
        };
        event.checked()
    }
}
