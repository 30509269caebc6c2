//! Patch IR: line/column spans and the edits addressed by them.
//!
//! This module implements the edit infrastructure for steptool:
//! - [`Span`]: a rectangular text region in line/column coordinates
//! - [`Edit`]: a `(Span, replacement)` pair addressed against *original* text
//! - [`apply_edits`]: applies a batch of non-overlapping edits to a string
//! - [`ContentHash`]: identifies the exact text a batch of edits addresses
//!
//! ## Span coordinates
//!
//! Lines are 1-indexed; columns are 0-indexed; the end position is
//! exclusive. `(0, 0, 0, 0)` is the unknown-position sentinel ([`Span::UNKNOWN`]),
//! distinguishable from every real position because real positions always
//! have `start_line >= 1`.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::text::span_to_byte_range;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Span
// ============================================================================

/// A rectangular region of source text.
///
/// Spans are immutable values and are copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First line of the region (1-indexed; 0 only in the sentinel).
    pub start_line: u32,
    /// Column of the first character (0-indexed).
    pub start_col: u32,
    /// Last line of the region.
    pub end_line: u32,
    /// Column just past the last character (0-indexed, exclusive).
    pub end_col: u32,
}

impl Span {
    /// The "position unknown" sentinel. Never use it for text addressing.
    pub const UNKNOWN: Span = Span {
        start_line: 0,
        start_col: 0,
        end_line: 0,
        end_col: 0,
    };

    /// Create a new span.
    pub const fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Span {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// True for the sentinel and for anything else without a real start line.
    pub fn is_unknown(&self) -> bool {
        self.start_line == 0
    }

    /// True when start and end coincide.
    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line && self.start_col == self.end_col
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start() <= other.start() && other.end() <= self.end()
    }

    fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_col)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

// ============================================================================
// Edit
// ============================================================================

/// A localized text change: replace the text at `span` with `new_text`.
///
/// Spans address the text as it was *before* any edit in the same batch was
/// applied, so a batch can be applied to an independently held copy of the
/// original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Region of the original text being replaced.
    pub span: Span,
    /// Replacement text.
    pub new_text: String,
}

impl Edit {
    /// Create a new edit.
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        Edit {
            span,
            new_text: new_text.into(),
        }
    }
}

impl From<(Span, String)> for Edit {
    fn from((span, new_text): (Span, String)) -> Self {
        Edit { span, new_text }
    }
}

/// Errors raised while applying edits to text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The edit carries the unknown-position sentinel.
    #[error("edit span is the unknown-position sentinel")]
    UnknownPosition,

    /// The span does not address a region of the content.
    #[error("span {span} is out of bounds")]
    SpanOutOfBounds { span: Span },

    /// Two edits touch the same text.
    #[error("overlapping edits: {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },
}

/// Apply a batch of edits to `content`.
///
/// Edits may be given in any order. They are resolved to byte ranges against
/// the unmodified `content`, checked for overlap, and applied back to front so
/// earlier ranges stay valid.
///
/// # Errors
///
/// Returns a [`PatchError`] if any span is the sentinel, does not resolve
/// against `content`, or overlaps another edit. Nothing is applied on error.
pub fn apply_edits(content: &str, edits: &[Edit]) -> Result<String, PatchError> {
    let mut resolved = Vec::with_capacity(edits.len());
    for edit in edits {
        if edit.span.is_unknown() {
            return Err(PatchError::UnknownPosition);
        }
        let range = span_to_byte_range(content, &edit.span)
            .ok_or(PatchError::SpanOutOfBounds { span: edit.span })?;
        resolved.push((range, edit));
    }

    resolved.sort_by_key(|(range, _)| (range.start, range.end));
    for pair in resolved.windows(2) {
        let (a, first) = &pair[0];
        let (b, second) = &pair[1];
        // Two insertions at the same point would apply in an arbitrary order.
        if b.start < a.end || (a.is_empty() && b.is_empty() && a.start == b.start) {
            return Err(PatchError::OverlappingEdits {
                first: first.span,
                second: second.span,
            });
        }
    }

    let mut result = content.to_string();
    for (range, edit) in resolved.iter().rev() {
        result.replace_range(range.clone(), &edit.new_text);
    }
    Ok(result)
}

// ============================================================================
// Tests
// ============================================================================
