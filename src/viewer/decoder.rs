//! Incremental UTF-8 decoding across chunk boundaries.
//!
//! Feed bytes arrive as binary chunks whose boundaries are arbitrary: a
//! multi-byte sequence may be split between two messages. Decoding each
//! chunk independently (e.g. with [`String::from_utf8_lossy`]) would turn
//! every split character into replacement characters, so the decoder
//! carries the incomplete trailing sequence over to the next chunk.
//!
//! Invalid sequences decode to U+FFFD, one replacement character per
//! rejected sequence, matching lossy whole-buffer decoding.

// ============================================================================
// Imports
// ============================================================================

use std::mem;
use std::str;

// ============================================================================
// StreamDecoder
// ============================================================================

/// Streaming UTF-8 decoder tolerant of frame boundaries splitting a
/// multi-byte sequence.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Incomplete trailing sequence from the previous chunk (< 4 bytes).
    pending: Vec<u8>,
}

impl StreamDecoder {
    /// Creates a decoder with no pending bytes.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk, returning all text that is complete so far.
    ///
    /// An incomplete multi-byte sequence at the end of the chunk is held
    /// back and prepended to the next chunk.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        if self.pending.is_empty() {
            return self.decode_buf(chunk);
        }
        let mut buf = mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);
        self.decode_buf(&buf)
    }

    /// Flushes the decoder at end of stream.
    ///
    /// A dangling incomplete sequence decodes to a single replacement
    /// character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }

    fn decode_buf(&mut self, buf: &[u8]) -> String {
        let mut out = String::with_capacity(buf.len());
        let mut rest = buf;
        loop {
            match str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Invalid sequence: emit U+FFFD and resume after it.
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete trailing sequence: carry into next chunk.
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"$ ls\n"), "$ ls\n");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_euro_sign_split_across_chunks() {
        // U+20AC is 0xE2 0x82 0xAC; the last byte arrives in a later chunk.
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(&[0xE2, 0x82]), "");
        assert_eq!(decoder.decode(&[0xAC]), "\u{20AC}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_sequence_with_surrounding_text() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"price: \xE2\x82"), "price: ");
        assert_eq!(decoder.decode(b"\xAC 5\n"), "\u{20AC} 5\n");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_dangling_sequence_flushes_to_replacement() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(&[0xE2]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        // The decoder is reusable after a flush.
        assert_eq!(decoder.decode(b"ok"), "ok");
    }

    #[test]
    fn test_four_byte_scalar_split_byte_by_byte() {
        // U+1F600 is 0xF0 0x9F 0x98 0x80.
        let mut decoder = StreamDecoder::new();
        let mut out = String::new();
        for b in [0xF0u8, 0x9F, 0x98, 0x80] {
            out.push_str(&decoder.decode(&[b]));
        }
        assert_eq!(out, "\u{1F600}");
    }

    proptest! {
        /// Splitting valid UTF-8 at an arbitrary point never changes the
        /// decoded text.
        #[test]
        fn prop_split_point_is_transparent(text in "\\PC*", split in 0usize..64) {
            let bytes = text.as_bytes();
            let split = split.min(bytes.len());

            let mut decoder = StreamDecoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());

            prop_assert_eq!(out, text);
        }

        /// Chunked decoding of arbitrary bytes agrees with lossy
        /// whole-buffer decoding.
        #[test]
        fn prop_matches_lossy_decoding(
            bytes in proptest::collection::vec(any::<u8>(), 0..256),
            splits in proptest::collection::vec(0usize..256, 0..8),
        ) {
            let mut cuts: Vec<usize> = splits
                .into_iter()
                .map(|s| s.min(bytes.len()))
                .collect();
            cuts.push(0);
            cuts.push(bytes.len());
            cuts.sort_unstable();

            let mut decoder = StreamDecoder::new();
            let mut out = String::new();
            for pair in cuts.windows(2) {
                out.push_str(&decoder.decode(&bytes[pair[0]..pair[1]]));
            }
            out.push_str(&decoder.finish());

            prop_assert_eq!(out, String::from_utf8_lossy(&bytes).into_owned());
        }
    }
}
