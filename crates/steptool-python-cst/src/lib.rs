// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lossless Python parser and Concrete Syntax Tree (CST) library.
//!
//! # Overview
//!
//! - **Parsing**: [`parse_module`] turns source text into a [`Module`]. The
//!   tree keeps every byte of the input, so [`Module::code`] of an unedited
//!   tree returns the original text.
//! - **Editing**: nodes are plain owned data. Mutate them in place; nodes you
//!   create take fresh ids from [`Module::next_id`].
//! - **Positions**: [`Module::bounding_box`] locates any node by [`NodeId`]
//!   in the tree as it is now.
//! - **Literals**: [`evaluate`] safely evaluates literal expressions such as
//!   decorator arguments.
//!
//! # Quick Start
//!
//! ```
//! use steptool_python_cst::parse_module;
//!
//! let source = "@step('hello')\ndef hello():\n    pass\n";
//! let module = parse_module(source).expect("parse error");
//! assert_eq!(module.code(), source);
//!
//! let def = module.functions().next().unwrap();
//! assert_eq!(def.decorators[0].name().as_deref(), Some("step"));
//! ```

use std::cmp::min;

// ============================================================================
// Public modules and re-exports
// ============================================================================

/// Tokenizer for Python source code.
pub mod tokenizer;
pub use tokenizer::{TextPosition, TokType, Token};

mod nodes;
pub use nodes::*;

mod parser;
pub use parser::{error_context, ParserError, Result, HERE_MARKER};

pub mod literal;
pub use literal::{evaluate, Literal, LiteralError};

pub mod position;
pub use position::{BoundingBox, Position};

// ============================================================================
// Parsing functions
// ============================================================================

/// Tokenizes Python source code into a lossless token stream.
///
/// This is a low-level function. Most users should use [`parse_module`] instead.
///
/// # Errors
///
/// Returns a [`ParserError::TokenizerError`] if the source contains invalid tokens.
///
/// # Example
///
/// ```
/// use steptool_python_cst::tokenize;
///
/// let tokens = tokenize("x = 1").expect("tokenize error");
/// assert!(!tokens.is_empty());
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    tokenizer::tokenize(text).map_err(|err| ParserError::tokenizer(err, text))
}

/// Parses a Python module.
///
/// # Example
///
/// ```
/// use steptool_python_cst::parse_module;
///
/// let module = parse_module("x = 1").expect("parse error");
/// assert_eq!(module.code(), "x = 1");
/// ```
pub fn parse_module(module_text: &str) -> Result<Module> {
    let tokens = tokenize(module_text)?;
    parser::parse_tokens(module_text, tokens)
}

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth(n - 2)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Formats a parser error into a human-readable snippet with the error
/// location highlighted.
///
/// # Example
///
/// ```
/// use steptool_python_cst::{parse_module, prettify_error};
///
/// let source = "def (x):\n    pass\n";
/// let err = parse_module(source).unwrap_err();
/// let formatted = prettify_error(&err, source, "example.py");
/// assert!(formatted.contains("example.py"));
/// ```
pub fn prettify_error(err: &ParserError, module_text: &str, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let position = err.position();
    let context = 1;
    let line_start = position.line.saturating_sub(context).max(1);
    let start_offset = bol_offset(module_text, line_start);
    let end_offset = bol_offset(module_text, position.line + context + 1);
    let source = &module_text[start_offset..end_offset];
    let start = min(
        position.byte_offset.saturating_sub(start_offset),
        source.len(),
    );
    let end = min(start + 1, source.len() + 1);
    let message = match err {
        ParserError::TokenizerError { error, .. } => format!("{} at {}", error, position),
        ParserError::ParserError { expected, .. } => format!("expected {} at {}", expected, position),
    };
    let rendered = Renderer::plain()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(source)
                    .line_start(line_start)
                    .fold(false)
                    .annotations(vec![Level::Error.span(start..end).label(&message)]),
            ),
        )
        .to_string();
    rendered
}

// ============================================================================
// Tests
// ============================================================================
