//! Boundary-aware chunking and token counting.
//!
//! Chunks are bounded in characters (Unicode scalar values), never bytes, so multi-byte
//! Polish text is never split inside a code point. While the remainder is too long, the split
//! point is chosen inside the first `max_chunk_chars` characters, preferring:
//!
//! 1. the last paragraph break (`"\n\n"`), keeping the first newline,
//! 2. the last sentence end (`". "`), keeping the period,
//! 3. a forced cut at exactly `max_chunk_chars`.
//!
//! The pipeline only chunks sanitized text, whose whitespace is already collapsed to single
//! spaces, so paragraph breaks apply only when `chunk_text` is called on raw text directly.
//!
//! Token counting prefers `tiktoken-rs` and falls back to a whitespace counter when the
//! tokenizer cannot be loaded. Counts only feed per-chunk generation budgets, so an
//! approximate tokenizer for local models is acceptable.

use anyhow::Error as TokenizerError;
use std::iter::FusedIterator;
use std::sync::Arc;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, r50k_base};

use super::types::ChunkingError;

/// Shared token counting function.
pub type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const PARAGRAPH_BREAK: &str = "\n\n";
const SENTENCE_END: &str = ". ";

/// A bounded slice of sanitized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position of the chunk in document order, starting at zero.
    pub index: usize,
    /// Trimmed chunk text borrowed from the sanitized document.
    pub text: &'a str,
}

/// Lazy iterator over the chunks of a document.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    remaining: &'a str,
    max_chars: usize,
    next_index: usize,
}

/// Split `text` into chunks of at most `max_chunk_chars` characters.
pub fn chunk_text(text: &str, max_chunk_chars: usize) -> Result<Chunks<'_>, ChunkingError> {
    if max_chunk_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    Ok(Chunks {
        remaining: text.trim(),
        max_chars: max_chunk_chars,
        next_index: 0,
    })
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.remaining.is_empty() {
            let (piece, rest) = match byte_offset_of_char(self.remaining, self.max_chars) {
                None => (self.remaining, ""),
                Some(limit) => self.remaining.split_at(split_point(self.remaining, limit)),
            };
            self.remaining = rest.trim_start();

            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let chunk = Chunk {
                index: self.next_index,
                text: piece,
            };
            self.next_index += 1;
            return Some(chunk);
        }
        None
    }
}

impl FusedIterator for Chunks<'_> {}

/// Byte offset of the `n`th character, or `None` when the text has `n` characters or fewer.
fn byte_offset_of_char(text: &str, n: usize) -> Option<usize> {
    text.char_indices().nth(n).map(|(offset, _)| offset)
}

/// Where to end the next chunk, given the byte offset of the character limit.
fn split_point(text: &str, limit: usize) -> usize {
    let window = &text[..limit];
    window
        .rfind(PARAGRAPH_BREAK)
        .filter(|&position| position > 0)
        .or_else(|| window.rfind(SENTENCE_END).filter(|&position| position > 0))
        .map(|position| position + 1)
        .unwrap_or(limit)
}

/// Build a token counter for `model`.
///
/// Uses a tiktoken encoding when one can be resolved and falls back to whitespace counting
/// otherwise. The fallback is logged at `warn` level.
pub fn build_token_counter(model: &str) -> TokenCounter {
    match build_tiktoken_counter(model) {
        Ok(counter) => counter,
        Err(error) => {
            tracing::warn!(
                model,
                error = %error,
                "Tokenizer unavailable; falling back to whitespace counter"
            );
            default_token_counter()
        }
    }
}

fn build_tiktoken_counter(model: &str) -> Result<TokenCounter, ChunkingError> {
    let target = model.trim();
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    if let Ok(encoding) = get_bpe_from_model(model) {
        return Ok(encoding);
    }
    match model {
        "o200k_base" => o200k_base(),
        "p50k_base" => p50k_base(),
        "r50k_base" | "gpt2" => r50k_base(),
        _ => {
            // Local models rarely map to a published encoding.
            tracing::debug!(model, "Using 'cl100k_base' encoding for token counting");
            cl100k_base()
        }
    }
}

/// Whitespace token counter; a non-empty segment always counts as at least one token.
pub(crate) fn default_token_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}
