//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines are **1-indexed** (matching editor conventions)
//! - Columns passed to [`checked_position_to_byte_offset_str`] are **1-indexed**
//! - [`Span`] columns are **0-indexed**; [`span_to_byte_range`] does the shift
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values (chars), not bytes
//!
//! Positions that do not exist in the content yield `None`.

use std::ops::Range;

use crate::patch::Span;

// ============================================================================
// Position Conversions
// ============================================================================

/// Convert 1-indexed line and column to byte offset, rejecting positions that
/// do not exist in `content`.
///
/// A column one past the last character of a line addresses the end of that
/// line (just before its newline). The line following a trailing newline
/// exists and is empty, so `(last_line + 1, 1)` addresses the end of content.
pub fn checked_position_to_byte_offset_str(content: &str, line: u32, col: u32) -> Option<usize> {
    if line == 0 || col == 0 {
        return None;
    }
    let start = line_start_offset_str(content, line)?;
    let mut current_col = 1u32;
    for (j, c) in content[start..].char_indices() {
        if current_col == col {
            return Some(start + j);
        }
        if c == '\n' {
            return None;
        }
        current_col += 1;
    }
    (current_col == col).then_some(content.len())
}

// ============================================================================
// Span Utilities
// ============================================================================

/// Convert a [`Span`] (1-indexed lines, 0-indexed columns, exclusive end) to a
/// byte range into `content`.
///
/// Returns `None` for the unknown-position sentinel, for positions that do not
/// exist in `content`, and for spans whose end precedes their start.
pub fn span_to_byte_range(content: &str, span: &Span) -> Option<Range<usize>> {
    if span.is_unknown() {
        return None;
    }
    let start =
        checked_position_to_byte_offset_str(content, span.start_line, span.start_col + 1)?;
    let end = checked_position_to_byte_offset_str(content, span.end_line, span.end_col + 1)?;
    (start <= end).then_some(start..end)
}

/// Extract the text covered by a [`Span`].
///
/// Returns `None` when the span cannot be resolved against `content`.
pub fn extract_span_str<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    span_to_byte_range(content, span).and_then(|range| content.get(range))
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Get the byte offset of the start of a 1-indexed line.
///
/// The empty line following a trailing newline counts as a line, so for
/// `"a\n"` line 2 starts at offset 2. Returns `None` for line 0 and for lines
/// past that.
pub fn line_start_offset_str(content: &str, line: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }
    if line == 1 {
        return Some(0);
    }
    content
        .match_indices('\n')
        .nth((line - 2) as usize)
        .map(|(index, _)| index + 1)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod checked_tests {
        use super::*;

        #[test]
        fn end_of_line_is_addressable() {
            let content = "short\nline\n";
            assert_eq!(checked_position_to_byte_offset_str(content, 1, 6), Some(5));
            assert_eq!(checked_position_to_byte_offset_str(content, 1, 7), None);
        }

        #[test]
        fn line_after_trailing_newline_is_end_of_content() {
            let content = "a\n";
            assert_eq!(checked_position_to_byte_offset_str(content, 2, 1), Some(2));
            assert_eq!(checked_position_to_byte_offset_str(content, 3, 1), None);
        }

        #[test]
        fn zero_line_or_col_rejected() {
            assert_eq!(checked_position_to_byte_offset_str("x", 0, 1), None);
            assert_eq!(checked_position_to_byte_offset_str("x", 1, 0), None);
        }

        #[test]
        fn multibyte_columns_count_chars() {
            let content = "s = 'héllo'\n";
            // 'l' after the two-byte 'é' is the 8th char but byte offset 8
            assert_eq!(checked_position_to_byte_offset_str(content, 1, 8), Some(8));
            let span = Span::new(1, 4, 1, 11);
            assert_eq!(extract_span_str(content, &span), Some("'héllo'"));
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn span_to_range_single_line() {
            let content = "@step('hello')\ndef f(): pass\n";
            let span = Span::new(1, 6, 1, 13);
            assert_eq!(span_to_byte_range(content, &span), Some(6..13));
            assert_eq!(extract_span_str(content, &span), Some("'hello'"));
        }

        #[test]
        fn span_to_range_multi_line() {
            let content = "def f(\n    a,\n    b,\n): pass\n";
            let span = Span::new(2, 4, 3, 6);
            assert_eq!(extract_span_str(content, &span), Some("a,\n    b,"));
        }

        #[test]
        fn sentinel_span_has_no_range() {
            assert_eq!(span_to_byte_range("abc", &Span::UNKNOWN), None);
        }

        #[test]
        fn inverted_span_has_no_range() {
            let span = Span::new(1, 3, 1, 1);
            assert_eq!(span_to_byte_range("abcdef", &span), None);
        }

        #[test]
        fn zero_width_span() {
            let content = "def f(): pass\n";
            let span = Span::new(1, 6, 1, 6);
            assert_eq!(span_to_byte_range(content, &span), Some(6..6));
        }
    }

    mod line_utilities {
        use super::*;

        #[test]
        fn line_start() {
            let content = "line1\nline2\nline3\n";
            assert_eq!(line_start_offset_str(content, 1), Some(0));
            assert_eq!(line_start_offset_str(content, 2), Some(6));
            assert_eq!(line_start_offset_str(content, 3), Some(12));
            assert_eq!(line_start_offset_str(content, 4), Some(18));
            assert_eq!(line_start_offset_str(content, 5), None);
            assert_eq!(line_start_offset_str(content, 0), None);
        }
    }
}
