//! Token files: a bare array of little-endian `u16`, no header and no length prefix.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::base::Token;
use crate::error::{Result, TokenizerError};

pub fn write_tokens<W: Write>(mut writer: W, tokens: &[Token]) -> Result<()> {
    for &token in tokens {
        writer.write_all(&token.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_tokens<R: Read>(mut reader: R) -> Result<Vec<Token>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % 2 != 0 {
        return Err(TokenizerError::TruncatedTokenFile(bytes.len() - 1));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| Token::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn save_tokens(path: impl AsRef<Path>, tokens: &[Token]) -> Result<()> {
    write_tokens(BufWriter::new(File::create(path)?), tokens)
}

pub fn load_tokens(path: impl AsRef<Path>) -> Result<Vec<Token>> {
    read_tokens(BufReader::new(File::open(path)?))
}
