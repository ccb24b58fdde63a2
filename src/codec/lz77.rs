//! Brute-force LZ77 codec
//!
//! Every position searches the whole window for the longest earlier run.
//! The window is scanned from its oldest byte forward and the best candidate
//! is only replaced by a strictly longer run, so among equal-length matches
//! the oldest one wins. The output is therefore fully determined by the
//! input and the two limits.

use super::{encode_tokens, Codec, Token, TokenReader, MIN_MATCH_LENGTH};
use crate::config::{validate_codec_params, MtcConfig, DEFAULT_MAX_MATCH_LENGTH, DEFAULT_WINDOW_SIZE};
use crate::error::{MtcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77 {
    window_size: usize,
    max_match_length: usize,
}

impl Default for Lz77 {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_match_length: DEFAULT_MAX_MATCH_LENGTH,
        }
    }
}

impl Lz77 {
    pub fn new(window_size: usize, max_match_length: usize) -> Result<Self> {
        validate_codec_params(window_size, max_match_length)?;
        Ok(Self { window_size, max_match_length })
    }

    pub fn from_config(config: &MtcConfig) -> Result<Self> {
        Self::new(config.window_size, config.max_match_length)
    }

    /// Split the input into literal and match tokens
    pub fn tokenize(&self, input: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < input.len() {
            let (offset, length) = self.longest_match(input, pos);
            if length >= MIN_MATCH_LENGTH {
                tokens.push(Token::Match {
                    offset: offset as u16,
                    length: length as u8,
                });
                pos += length;
            } else {
                tokens.push(Token::Literal(input[pos]));
                pos += 1;
            }
        }

        tokens
    }

    /// Returns `(offset, length)` of the best match for `pos`, or a zero length.
    fn longest_match(&self, input: &[u8], pos: usize) -> (usize, usize) {
        let start = pos.saturating_sub(self.window_size);
        let limit = self.max_match_length.min(input.len() - pos);
        let lookahead = &input[pos..pos + limit];

        let mut best_offset = 0;
        let mut best_len = 0;

        for candidate in start..pos {
            // Runs may overlap `pos`; the candidate side still ends before input end.
            let len = input[candidate..]
                .iter()
                .zip(lookahead)
                .take_while(|(a, b)| a == b)
                .count();

            if len > best_len {
                best_len = len;
                best_offset = pos - candidate;
            }
            if best_len == limit {
                break;
            }
        }

        (best_offset, best_len)
    }
}

impl Codec for Lz77 {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        encode_tokens(&self.tokenize(input))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 2);

        for token in TokenReader::new(input) {
            match token? {
                Token::Literal(byte) => output.push(byte),
                Token::Match { offset, length } => {
                    let offset = offset as usize;
                    if offset == 0 || offset > output.len() {
                        return Err(MtcError::InvalidBackReference {
                            offset,
                            produced: output.len(),
                        });
                    }
                    // Byte-by-byte so that overlapping copies repeat the pattern.
                    let start = output.len() - offset;
                    for i in 0..length as usize {
                        let byte = output[start + i];
                        output.push(byte);
                    }
                }
            }
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "lz77"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(len: usize) -> Vec<u8> {
        // Small alphabet with an LCG so that repeats are frequent but irregular.
        let mut state: u32 = 0x2545_f491;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                b"abcdefgh"[(state >> 16) as usize % 8]
            })
            .collect()
    }

    #[test]
    fn test_run_of_identical_bytes() {
        let codec = Lz77::default();
        let input = vec![b'A'; 10];

        let tokens = codec.tokenize(&input);
        assert_eq!(
            tokens,
            vec![Token::Literal(b'A'), Token::Match { offset: 1, length: 9 }]
        );

        let compressed = codec.compress(&input);
        assert_eq!(compressed, vec![0x00, b'A', 0x01, 0x00, 0x01, 9]);
        assert_eq!(codec.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_empty_and_single_byte() {
        let codec = Lz77::default();
        assert!(codec.compress(&[]).is_empty());
        assert!(codec.decompress(&[]).unwrap().is_empty());

        let compressed = codec.compress(b"z");
        assert_eq!(compressed, vec![0x00, b'z']);
        assert_eq!(codec.decompress(&compressed).unwrap(), b"z");
    }

    #[test]
    fn test_short_runs_stay_literal() {
        let codec = Lz77::default();
        let tokens = codec.tokenize(b"abXab");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
    }

    #[test]
    fn test_equal_length_matches_prefer_oldest() {
        let codec = Lz77::default();
        let tokens = codec.tokenize(b"abcXabcYabc");
        assert_eq!(
            tokens,
            vec![
                Token::Literal(b'a'),
                Token::Literal(b'b'),
                Token::Literal(b'c'),
                Token::Literal(b'X'),
                Token::Match { offset: 4, length: 3 },
                Token::Literal(b'Y'),
                Token::Match { offset: 8, length: 3 },
            ]
        );
    }

    #[test]
    fn test_match_length_is_capped() {
        let codec = Lz77::default();
        let input = vec![b'A'; 600];
        let tokens = codec.tokenize(&input);
        assert_eq!(
            tokens,
            vec![
                Token::Literal(b'A'),
                Token::Match { offset: 1, length: 255 },
                Token::Match { offset: 256, length: 255 },
                Token::Match { offset: 511, length: 89 },
            ]
        );
        assert_eq!(codec.decompress(&codec.compress(&input)).unwrap(), input);
    }

    #[test]
    fn test_custom_max_match_length() {
        let codec = Lz77::new(4096, 4).unwrap();
        let input = vec![7u8; 13];
        for token in codec.tokenize(&input) {
            assert!(token.decoded_len() <= 4);
        }
        assert_eq!(codec.decompress(&codec.compress(&input)).unwrap(), input);
    }

    #[test]
    fn test_offsets_stay_within_window_and_output() {
        let codec = Lz77::new(64, 255).unwrap();
        let input = sample_text(5000);

        let mut produced = 0usize;
        for token in codec.tokenize(&input) {
            if let Token::Match { offset, length } = token {
                assert!(offset >= 1);
                assert!(offset as usize <= produced);
                assert!(offset as usize <= 64);
                assert!(length as usize >= MIN_MATCH_LENGTH);
            }
            produced += token.decoded_len();
        }
        assert_eq!(produced, input.len());
        assert_eq!(codec.decompress(&codec.compress(&input)).unwrap(), input);
    }

    #[test]
    fn test_roundtrip_longer_than_window() {
        let codec = Lz77::default();
        let mut input = sample_text(9000);
        let head = input[..3000].to_vec();
        input.extend_from_slice(&head);

        let compressed = codec.compress(&input);
        assert!(compressed.len() < input.len() * 2);
        assert_eq!(codec.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        assert!(Lz77::new(0, 255).is_err());
        assert!(Lz77::new(65536, 255).is_err());
        assert!(Lz77::new(4096, 256).is_err());
        assert!(Lz77::new(65535, 255).is_ok());
    }

    #[test]
    fn test_decompress_truncated_literal() {
        let codec = Lz77::default();
        let err = codec.decompress(&[0x00, b'A', 0x00]).unwrap_err();
        assert!(matches!(err, MtcError::TruncatedStream { needed: 1, .. }));
    }

    #[test]
    fn test_decompress_truncated_match() {
        let codec = Lz77::default();
        let err = codec.decompress(&[0x00, b'A', 0x01, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, MtcError::TruncatedStream { needed: 1, .. }));
    }

    #[test]
    fn test_decompress_rejects_zero_offset() {
        let codec = Lz77::default();
        let err = codec.decompress(&[0x00, b'A', 0x01, 0x00, 0x00, 3]).unwrap_err();
        assert!(matches!(err, MtcError::InvalidBackReference { offset: 0, produced: 1 }));
    }

    #[test]
    fn test_decompress_rejects_offset_past_output() {
        let codec = Lz77::default();
        let err = codec.decompress(&[0x00, b'A', 0x01, 0x00, 0x02, 3]).unwrap_err();
        assert!(matches!(err, MtcError::InvalidBackReference { offset: 2, produced: 1 }));
    }

    #[test]
    fn test_decompress_rejects_unknown_flag() {
        let codec = Lz77::default();
        let err = codec.decompress(&[0x02, 0x00]).unwrap_err();
        assert!(matches!(err, MtcError::UnknownToken { flag: 0x02, position: 0 }));
    }

    #[test]
    fn test_overlapping_copy_repeats_pattern() {
        let codec = Lz77::default();
        let stream = [0x00, b'a', 0x00, b'b', 0x01, 0x00, 0x02, 7];
        assert_eq!(codec.decompress(&stream).unwrap(), b"ababababa");
    }
}
