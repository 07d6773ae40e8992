use crate::error::Result;
use crate::performance::Performance;

/// Integer ID of one event in the fixed vocabulary. 388 IDs fit comfortably in 16 bits,
/// which is also the on-disk width of a token file.
pub type Token = u16;

pub trait Tokenizer {
    /// Turn a performance into a flat token sequence.
    fn encode(&self, performance: &Performance) -> Result<Vec<Token>>;

    /// Rebuild a performance from tokens. Never fails: unknown IDs and unmatched
    /// note-offs are skipped.
    fn decode(&self, ids: &[Token]) -> Performance;
}
