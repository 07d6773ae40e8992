//! Error types for the tokenizer.

use thiserror::Error;

use crate::base::Token;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("unknown token id {0}")]
    UnknownToken(Token),

    #[error("encountered unknown token while encoding: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("unsupported MIDI timing format (SMPTE timecode)")]
    UnsupportedTiming,

    #[error("token file has a dangling byte after {0} bytes")]
    TruncatedTokenFile(usize),
}

impl From<midly::Error> for TokenizerError {
    fn from(e: midly::Error) -> Self {
        TokenizerError::MidiParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TokenizerError>;
