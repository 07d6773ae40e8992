//! Event-based tokenization of MIDI performances for sequence models.
//!
//! A performance is quantized to 24 steps per beat and flattened into a stream of
//! note-on, note-off, velocity and time-shift events, each mapped to one of 388 token IDs.
//! Decoding reverses the process at a fixed 120 BPM.

pub mod base;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod event;
pub mod midi;
pub mod performance;
pub mod store;
pub mod tokenizer;
pub mod vocab;

pub use base::{Token, Tokenizer};
pub use error::{Result, TokenizerError};
pub use event::Event;
pub use performance::{Note, Performance};
pub use tokenizer::MidiTokenizer;
pub use vocab::{VOCAB, Vocabulary};
