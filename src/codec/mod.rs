//! Chunk codecs
//!
//! A codec turns one raw buffer into a self-contained token stream and back.
//! It knows nothing about files, chunks or threads.
//!
//! Token wire format:
//! - Literal: `[0x00][byte]`
//! - Match:   `[0x01][offset_hi][offset_lo][length]` (offset big-endian)

pub mod lz77;

use crate::error::{MtcError, Result};

pub use lz77::Lz77;

pub const LITERAL_FLAG: u8 = 0x00;
pub const MATCH_FLAG: u8 = 0x01;

/// Matches shorter than this are emitted as literals.
pub const MIN_MATCH_LENGTH: usize = 3;

/// Trait for chunk codec implementations
pub trait Codec: Send + Sync {
    /// Encode a raw buffer into a token stream
    fn compress(&self, input: &[u8]) -> Vec<u8>;

    /// Decode a token stream back into the raw buffer
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Get the codec name
    fn name(&self) -> &'static str;
}

/// Atomic unit of the compressed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Match { offset: u16, length: u8 },
}

impl Token {
    /// Number of bytes this token occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Token::Literal(_) => 2,
            Token::Match { .. } => 4,
        }
    }

    /// Number of output bytes this token produces when decoded
    pub fn decoded_len(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } => *length as usize,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match *self {
            Token::Literal(byte) => {
                out.push(LITERAL_FLAG);
                out.push(byte);
            }
            Token::Match { offset, length } => {
                out.push(MATCH_FLAG);
                out.extend_from_slice(&offset.to_be_bytes());
                out.push(length);
            }
        }
    }
}

/// Serialize a token sequence into its wire form
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let size = tokens.iter().map(Token::encoded_len).sum();
    let mut out = Vec::with_capacity(size);
    for token in tokens {
        token.write_to(&mut out);
    }
    out
}

/// Iterator over the tokens of a wire-format stream.
///
/// Yields an error and stops on the first malformed token.
pub struct TokenReader<'a> {
    input: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> TokenReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0, failed: false }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.input.len() - self.pos;
        if available < n {
            return Err(MtcError::TruncatedStream {
                position: self.input.len(),
                needed: n - available,
            });
        }
        let input = self.input;
        let bytes = &input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_token(&mut self) -> Result<Token> {
        let start = self.pos;
        let flag = self.take(1)?[0];
        match flag {
            LITERAL_FLAG => Ok(Token::Literal(self.take(1)?[0])),
            MATCH_FLAG => {
                let body = self.take(3)?;
                Ok(Token::Match {
                    offset: u16::from_be_bytes([body[0], body[1]]),
                    length: body[2],
                })
            }
            flag => Err(MtcError::UnknownToken { flag, position: start }),
        }
    }
}

impl<'a> Iterator for TokenReader<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.input.len() {
            return None;
        }
        let token = self.read_token();
        if token.is_err() {
            self.failed = true;
        }
        Some(token)
    }
}
