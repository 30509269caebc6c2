// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::tokenizer::{LocatedTokError, TextPosition, TokError};

/// Marker placed right after the offending column in an error's context.
pub const HERE_MARKER: &str = "<---- here\n";

/// Number of source lines shown before the offending line.
const CONTEXT_LINES: usize = 3;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("tokenizer error: {error} at {position}\n\n{context}")]
    TokenizerError {
        error: TokError,
        position: TextPosition,
        context: String,
    },
    #[error("parser error: expected {expected} at {position}\n\n{context}")]
    ParserError {
        expected: String,
        position: TextPosition,
        context: String,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl ParserError {
    pub(crate) fn tokenizer(err: LocatedTokError, source: &str) -> Self {
        ParserError::TokenizerError {
            error: err.error,
            position: err.position,
            context: error_context(source, err.position),
        }
    }

    pub(crate) fn expected(expected: impl Into<String>, position: TextPosition, source: &str) -> Self {
        ParserError::ParserError {
            expected: expected.into(),
            position,
            context: error_context(source, position),
        }
    }

    /// Where the error was detected.
    pub fn position(&self) -> TextPosition {
        match self {
            ParserError::TokenizerError { position, .. } => *position,
            ParserError::ParserError { position, .. } => *position,
        }
    }

    /// The source excerpt around the error, with [`HERE_MARKER`] after the
    /// offending column.
    pub fn context(&self) -> &str {
        match self {
            ParserError::TokenizerError { context, .. } => context,
            ParserError::ParserError { context, .. } => context,
        }
    }
}

/// Render the lines around `position`: a few lines before, the offending line
/// cut at the error column followed by [`HERE_MARKER`], then the rest of the
/// source.
pub fn error_context(source: &str, position: TextPosition) -> String {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let index = position.line.saturating_sub(1);
    let mut out = String::new();

    for line in &lines[index.saturating_sub(CONTEXT_LINES).min(lines.len())..index.min(lines.len())]
    {
        out.push_str(line);
    }
    let current = lines.get(index).copied().unwrap_or("");
    let cut: String = current
        .trim_end_matches(['\n', '\r'])
        .chars()
        .take(position.column.saturating_sub(1))
        .collect();
    out.push_str(&cut);
    out.push_str(HERE_MARKER);
    let rest_start = cut.len();
    if let Some(line) = lines.get(index) {
        let tail = line.get(rest_start..).unwrap_or("");
        let tail = tail.trim_end_matches(['\n', '\r']);
        if !tail.is_empty() {
            out.push_str(tail);
            out.push('\n');
        }
    }
    for line in lines.iter().skip(index + 1) {
        out.push_str(line);
    }
    out
}
