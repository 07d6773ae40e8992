use std::path::Path;

use crate::base::{Token, Tokenizer};
use crate::decoder;
use crate::encoder;
use crate::error::Result;
use crate::event::Event;
use crate::performance::Performance;
use crate::vocab::{VOCAB, Vocabulary};

/// Event-based MIDI tokenizer: note-on/note-off per pitch, 32 velocity bins and time shifts
/// on a grid of 24 steps per beat.
#[derive(Debug, Clone, Copy)]
pub struct MidiTokenizer {
    vocab: &'static Vocabulary,
}

impl MidiTokenizer {
    pub fn new() -> Self {
        MidiTokenizer { vocab: &VOCAB }
    }

    pub fn vocab(&self) -> &Vocabulary {
        self.vocab
    }

    /// Read a MIDI file and encode it.
    pub fn midi_to_tokens(&self, path: impl AsRef<Path>) -> Result<Vec<Token>> {
        let performance = Performance::load(path)?;
        self.encode(&performance)
    }

    /// Decode tokens into a performance at 120 BPM, ready for [`Performance::save`].
    pub fn tokens_to_midi(&self, ids: &[Token]) -> Performance {
        self.decode(ids)
    }

    /// Symbolic view of a token sequence. Fails on the first unknown ID.
    pub fn events(&self, ids: &[Token]) -> Result<Vec<Event>> {
        ids.iter().map(|&id| self.vocab.decode(id)).collect()
    }
}

impl Default for MidiTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for MidiTokenizer {
    fn encode(&self, performance: &Performance) -> Result<Vec<Token>> {
        encoder::encode(self.vocab, performance)
    }

    fn decode(&self, ids: &[Token]) -> Performance {
        decoder::decode(self.vocab, ids)
    }
}
