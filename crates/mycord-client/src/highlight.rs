//! Mention highlighting for inbound chat bodies.

use crate::theme::{Tone, BELL};

/// A body with every mention of the local user painted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// Rendered bytes, including the bell when there was at least one mention.
    pub bytes: Vec<u8>,
    /// Number of non-overlapping mentions found.
    pub mentions: usize,
}

/// Paints each occurrence of `pattern` in `body`.
///
/// The scan runs left to right, byte for byte and case-sensitive. A hit
/// advances past the whole pattern, so matches never overlap; a miss copies
/// one byte through unchanged. The bell is inserted once, just before the
/// first highlighted mention.
pub fn highlight_mentions(body: &[u8], pattern: &[u8]) -> Highlighted {
    let mut bytes = Vec::with_capacity(body.len() + 16);
    let mut mentions = 0usize;
    let mut rest = body;

    while let Some((&first, tail)) = rest.split_first() {
        if !pattern.is_empty() && rest.starts_with(pattern) {
            if mentions == 0 {
                bytes.push(BELL);
            }
            mentions += 1;
            Tone::Mention.paint_into(&mut bytes, pattern);
            rest = rest.get(pattern.len()..).unwrap_or_default();
        } else {
            bytes.push(first);
            rest = tail;
        }
    }

    Highlighted { bytes, mentions }
}
