//! Length budgets.
//!
//! Callers always speak in characters. Generation backends speak in tokens, so the pipeline
//! converts once per run with a fixed divisor and then derives a smaller budget per chunk
//! from the chunk's own token count.

use serde::Serialize;
use thiserror::Error;

/// Fixed characters-per-token ratio used to convert character budgets.
pub const CHARS_PER_TOKEN: usize = 4;

const MIN_MAX_TOKENS: usize = 50;
const MIN_MIN_TOKENS: usize = 10;
const CLAMPED_MIN_TOKENS: usize = 5;
const CHUNK_MAX_RATIO: f64 = 0.6;
const CHUNK_MIN_RATIO: f64 = 0.4;

/// Rejected request input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The value was not an integer.
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber {
        /// Name of the offending field.
        field: &'static str,
        /// Raw input as received.
        value: String,
    },
    /// The value was zero or negative.
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Parsed value.
        value: i64,
    },
    /// The minimum is larger than the maximum.
    #[error("min_length ({min}) must not exceed max_length ({max})")]
    MinExceedsMax {
        /// Requested minimum length.
        min: usize,
        /// Requested maximum length.
        max: usize,
    },
    /// Both raw text and a URL were supplied.
    #[error("provide either text or url, not both")]
    AmbiguousSource,
    /// The request body did not decode into a summarize request.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Validated output length bounds in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Budget {
    max_length: usize,
    min_length: usize,
}

impl Budget {
    /// Validate a pair of lengths.
    pub fn new(max_length: i64, min_length: i64) -> Result<Self, ValidationError> {
        let max = positive("max_length", max_length)?;
        let min = positive("min_length", min_length)?;
        if min > max {
            return Err(ValidationError::MinExceedsMax { min, max });
        }
        Ok(Self {
            max_length: max,
            min_length: min,
        })
    }

    /// Parse and validate lengths given as text, e.g. from a form or command line.
    pub fn parse(max_length: &str, min_length: &str) -> Result<Self, ValidationError> {
        let max = parse_length("max_length", max_length)?;
        let min = parse_length("min_length", min_length)?;
        Self::new(max, min)
    }

    /// Resolve optional caller lengths against `defaults`.
    ///
    /// A missing minimum falls back to the default minimum, capped at the requested maximum.
    pub fn resolve(
        max_length: Option<i64>,
        min_length: Option<i64>,
        defaults: Budget,
    ) -> Result<Self, ValidationError> {
        let max = max_length.unwrap_or(defaults.max_length as i64);
        let min = match min_length {
            Some(min) => min,
            None if max > 0 => (defaults.min_length as i64).min(max),
            None => defaults.min_length as i64,
        };
        Self::new(max, min)
    }

    /// Maximum output length in characters.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Minimum output length in characters.
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

fn positive(field: &'static str, value: i64) -> Result<usize, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositive { field, value });
    }
    usize::try_from(value).map_err(|_| ValidationError::NotANumber {
        field,
        value: value.to_string(),
    })
}

/// Parse one length given as text, reporting `field` on failure.
pub fn parse_length(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

/// Generation bounds in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenBudget {
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
    /// Lower bound on generated tokens.
    pub min_tokens: usize,
}

impl TokenBudget {
    /// Convert a character budget, flooring both bounds so short budgets stay usable.
    pub fn from_budget(budget: &Budget) -> Self {
        let max_tokens = (budget.max_length / CHARS_PER_TOKEN).max(MIN_MAX_TOKENS);
        let mut min_tokens = (budget.min_length / CHARS_PER_TOKEN).max(MIN_MIN_TOKENS);
        if min_tokens >= max_tokens {
            min_tokens = CLAMPED_MIN_TOKENS.max(max_tokens - 1);
        }
        Self {
            max_tokens,
            min_tokens,
        }
    }

    /// Budget for a single chunk of `chunk_tokens` tokens, never exceeding `self`.
    pub fn for_chunk(&self, chunk_tokens: usize) -> Self {
        let scaled = |ratio: f64| (chunk_tokens as f64 * ratio).round() as usize;
        let max_tokens = scaled(CHUNK_MAX_RATIO).clamp(2, self.max_tokens.max(2));
        let mut min_tokens = scaled(CHUNK_MIN_RATIO).clamp(1, self.min_tokens.max(1));
        if min_tokens >= max_tokens {
            min_tokens = max_tokens - 1;
        }
        Self {
            max_tokens,
            min_tokens,
        }
    }
}
