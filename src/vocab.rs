use lazy_static::lazy_static;

use crate::base::Token;
use crate::error::{Result, TokenizerError};
use crate::event::{Event, MAX_TIME_SHIFT_STEPS, PITCHES, VELOCITY_BINS};

pub const NOTE_ON_OFFSET: Token = 0;
pub const NOTE_OFF_OFFSET: Token = NOTE_ON_OFFSET + PITCHES as Token;
pub const VELOCITY_OFFSET: Token = NOTE_OFF_OFFSET + PITCHES as Token;
pub const TIME_SHIFT_OFFSET: Token = VELOCITY_OFFSET + VELOCITY_BINS as Token;
pub const VOCAB_SIZE: usize = TIME_SHIFT_OFFSET as usize + MAX_TIME_SHIFT_STEPS as usize;

lazy_static! {
    /// Shared table, built on first use and never mutated afterwards.
    pub static ref VOCAB: Vocabulary = Vocabulary::new();
}

/// Fixed bijection between events and token IDs.
///
/// IDs are handed out block by block: note-on for every pitch, then note-off, then the
/// velocity bins, then time shifts of 1..=100 steps.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    events: Vec<Event>,
}

impl Vocabulary {
    pub fn new() -> Self {
        let mut events = Vec::with_capacity(VOCAB_SIZE);
        events.extend((0..PITCHES).map(|pitch| Event::NoteOn { pitch }));
        events.extend((0..PITCHES).map(|pitch| Event::NoteOff { pitch }));
        events.extend((0..VELOCITY_BINS).map(|bin| Event::Velocity { bin }));
        events.extend((1..=MAX_TIME_SHIFT_STEPS).map(|steps| Event::TimeShift { steps }));
        Vocabulary { events }
    }

    pub fn encode(&self, event: Event) -> Result<Token> {
        if !event.is_valid() {
            return Err(TokenizerError::UnknownEvent(event.to_string()));
        }
        let id = match event {
            Event::NoteOn { pitch } => NOTE_ON_OFFSET + pitch as Token,
            Event::NoteOff { pitch } => NOTE_OFF_OFFSET + pitch as Token,
            Event::Velocity { bin } => VELOCITY_OFFSET + bin as Token,
            Event::TimeShift { steps } => TIME_SHIFT_OFFSET + (steps - 1) as Token,
        };
        debug_assert_eq!(self.events[id as usize], event);
        Ok(id)
    }

    pub fn decode(&self, id: Token) -> Result<Event> {
        self.events
            .get(id as usize)
            .copied()
            .ok_or(TokenizerError::UnknownToken(id))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// `(id, event)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, Event)> + '_ {
        self.events
            .iter()
            .enumerate()
            .map(|(id, &event)| (id as Token, event))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_size_and_blocks() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), 388);
        assert_eq!(vocab.decode(0).unwrap(), Event::NoteOn { pitch: 0 });
        assert_eq!(vocab.decode(127).unwrap(), Event::NoteOn { pitch: 127 });
        assert_eq!(vocab.decode(128).unwrap(), Event::NoteOff { pitch: 0 });
        assert_eq!(vocab.decode(256).unwrap(), Event::Velocity { bin: 0 });
        assert_eq!(vocab.decode(288).unwrap(), Event::TimeShift { steps: 1 });
        assert_eq!(vocab.decode(387).unwrap(), Event::TimeShift { steps: 100 });
    }

    #[test]
    fn test_ids_are_contiguous() {
        let ids: Vec<Token> = VOCAB.iter().map(|(id, _)| id).collect();
        let expected: Vec<Token> = (0..388).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_lookup_misses() {
        assert!(matches!(
            VOCAB.decode(388),
            Err(TokenizerError::UnknownToken(388))
        ));
        assert!(matches!(
            VOCAB.decode(Token::MAX),
            Err(TokenizerError::UnknownToken(Token::MAX))
        ));
        assert!(matches!(
            VOCAB.encode(Event::TimeShift { steps: 0 }),
            Err(TokenizerError::UnknownEvent(_))
        ));
        assert!(matches!(
            VOCAB.encode(Event::NoteOn { pitch: 128 }),
            Err(TokenizerError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_every_entry_maps_back() {
        for (id, event) in VOCAB.iter() {
            assert_eq!(VOCAB.encode(event).unwrap(), id);
        }
    }

    fn valid_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            (0u8..128).prop_map(|pitch| Event::NoteOn { pitch }),
            (0u8..128).prop_map(|pitch| Event::NoteOff { pitch }),
            (0u8..32).prop_map(|bin| Event::Velocity { bin }),
            (1u8..=100).prop_map(|steps| Event::TimeShift { steps }),
        ]
    }

    proptest! {
        #[test]
        fn prop_bijection(event in valid_event()) {
            let id = VOCAB.encode(event).unwrap();
            prop_assert!((id as usize) < VOCAB_SIZE);
            prop_assert_eq!(VOCAB.decode(id).unwrap(), event);
        }
    }
}
