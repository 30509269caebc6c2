// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lossless tokenizer for Python source.
//!
//! Every byte of the input ends up either in a token's `text` or in the
//! `prefix` of the token that follows it. Prefixes hold horizontal whitespace,
//! comments, explicit `\` continuations, newlines inside brackets, and whole
//! blank or comment-only lines (including the indentation of the next line).
//! Concatenating `prefix + text` over the token stream reproduces the input.
//!
//! Structural tokens follow CPython: `Newline` ends a logical line, `Indent`
//! and `Dedent` bracket blocks, `EndMarker` closes the stream and carries any
//! trailing trivia. `Indent`/`Dedent` have empty text and prefix. A file
//! whose last logical line has no terminating newline gets a `Newline` with
//! empty text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;


/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokType {
    Name,
    Number,
    String,
    Op,
    Newline,
    Indent,
    Dedent,
    EndMarker,
}

impl TokType {
    /// Structural tokens carry no source characters of their own
    /// (`Newline` text is only line-ending characters).
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokType::Newline | TokType::Indent | TokType::Dedent | TokType::EndMarker
        )
    }
}

/// A location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    /// 1-indexed line.
    pub line: usize,
    /// 1-indexed column, counting chars.
    pub column: usize,
    /// 0-indexed byte offset.
    pub byte_offset: usize,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// One token with the trivia that precedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokType,
    pub prefix: String,
    pub text: String,
    /// Where `text` starts in the parsed source. Synthetic tokens use the default.
    pub start: TextPosition,
}

impl Token {
    /// Create a token that did not come from source text.
    pub fn synthetic(kind: TokType, prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Token {
            kind,
            prefix: prefix.into(),
            text: text.into(),
            start: TextPosition::default(),
        }
    }

    /// True for an operator token with exactly this text.
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokType::Op && self.text == op
    }

    /// True for a name token with exactly this text.
    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokType::Name && self.text == name
    }
}

/// Lexical errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleQuotedString,
    #[error("unmatched '{0}'")]
    UnmatchedClosingParen(char),
    #[error("closing parenthesis '{close}' does not match opening parenthesis '{open}'")]
    MismatchedClosingParen { open: char, close: char },
    #[error("unexpected EOF in multi-line statement")]
    UnexpectedEofInParens,
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid decimal literal")]
    BadDecimal,
    #[error("invalid number literal")]
    BadNumber,
    #[error("unexpected character after line continuation character")]
    BadLineContinuation,
    #[error("unexpected EOF after line continuation character")]
    EofAfterLineContinuation,
}

/// A tokenizer error together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTokError {
    pub error: TokError,
    pub position: TextPosition,
}

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:0[xX](?:_?[0-9a-fA-F])+|0[bB](?:_?[01])+|0[oO](?:_?[0-7])+|(?:(?:[0-9](?:_?[0-9])*)?\.[0-9](?:_?[0-9])*|[0-9](?:_?[0-9])*\.?)(?:[eE][+-]?[0-9](?:_?[0-9])*)?[jJ]?)",
    )
    .expect("number pattern is valid")
});

const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "**", "//", "<<", ">>",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "(", ")", "[", "]", "{", "}", ":", ",",
    ";", ".", "+", "-", "*", "/", "%", "&", "|", "^", "~", "<", ">", "=", "@",
];

const STRING_PREFIXES: &[&str] = &[
    "r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt",
];

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Tokenize `text` into a lossless token stream ending with `EndMarker`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LocatedTokError> {
    let mut state = TokState::new(text);
    state.run()?;
    Ok(state.tokens)
}

struct TokState<'t> {
    text: &'t str,
    pos: usize,
    line: usize,
    column: usize,
    prefix: String,
    tokens: Vec<Token>,
    parens: Vec<(char, TextPosition)>,
    indents: Vec<usize>,
    at_line_start: bool,
}

impl<'t> TokState<'t> {
    fn new(text: &'t str) -> Self {
        TokState {
            text,
            pos: 0,
            line: 1,
            column: 1,
            prefix: String::new(),
            tokens: Vec::new(),
            parens: Vec::new(),
            indents: vec![0],
            at_line_start: true,
        }
    }

    fn position(&self) -> TextPosition {
        TextPosition {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn error(&self, error: TokError) -> LocatedTokError {
        LocatedTokError {
            error,
            position: self.position(),
        }
    }

    /// Advance over one char, keeping line/column current.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' if self.peek() != Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Move the bytes consumed since `start` into the pending prefix.
    fn take_into_prefix(&mut self, start: usize) {
        self.prefix.push_str(&self.text[start..self.pos]);
    }

    fn newline_len(&self) -> usize {
        let rest = self.rest();
        if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') || rest.starts_with('\r') {
            1
        } else {
            0
        }
    }

    fn bump_newline(&mut self) {
        for _ in 0..self.newline_len() {
            self.bump();
        }
    }

    fn push(&mut self, kind: TokType, start: usize, start_pos: TextPosition) {
        let prefix = std::mem::take(&mut self.prefix);
        self.tokens.push(Token {
            kind,
            prefix,
            text: self.text[start..self.pos].to_string(),
            start: start_pos,
        });
    }

    fn push_empty(&mut self, kind: TokType) {
        self.tokens.push(Token {
            kind,
            prefix: String::new(),
            text: String::new(),
            start: self.position(),
        });
    }

    /// True when the current logical line already produced a token.
    fn line_has_content(&self) -> bool {
        match self.tokens.last() {
            None => false,
            Some(tok) => !matches!(
                tok.kind,
                TokType::Newline | TokType::Indent | TokType::Dedent
            ),
        }
    }

    fn run(&mut self) -> Result<(), LocatedTokError> {
        if self.rest().starts_with('\u{feff}') {
            let start = self.pos;
            self.pos += '\u{feff}'.len_utf8();
            self.take_into_prefix(start);
        }

        loop {
            if self.at_line_start && self.parens.is_empty() {
                if !self.handle_line_start()? {
                    break;
                }
            }

            let start = self.pos;
            while matches!(self.peek(), Some(' ' | '\t' | '\x0c')) {
                self.bump();
            }
            self.take_into_prefix(start);

            let Some(c) = self.peek() else {
                break;
            };
            let start = self.pos;
            let start_pos = self.position();

            match c {
                '#' => {
                    self.skip_comment();
                    self.take_into_prefix(start);
                }
                '\\' => {
                    self.bump();
                    if self.newline_len() == 0 {
                        return Err(if self.peek().is_none() {
                            self.error(TokError::EofAfterLineContinuation)
                        } else {
                            self.error(TokError::BadLineContinuation)
                        });
                    }
                    self.bump_newline();
                    if self.peek().is_none() {
                        return Err(self.error(TokError::EofAfterLineContinuation));
                    }
                    self.take_into_prefix(start);
                }
                '\n' | '\r' => {
                    self.bump_newline();
                    if !self.parens.is_empty() || !self.line_has_content() {
                        self.take_into_prefix(start);
                    } else {
                        self.push(TokType::Newline, start, start_pos);
                        self.at_line_start = true;
                    }
                }
                c if is_name_start(c) || (!c.is_ascii() && c.is_alphanumeric()) => {
                    self.name_or_string(start, start_pos)?;
                }
                '0'..='9' => self.number(start, start_pos)?,
                '.' if matches!(self.peek_nth(1), Some('0'..='9')) => {
                    self.number(start, start_pos)?
                }
                '"' | '\'' => {
                    self.string_body(false)?;
                    self.push(TokType::String, start, start_pos);
                }
                _ => self.operator(c, start, start_pos)?,
            }
        }

        if self.line_has_content() {
            self.push_empty(TokType::Newline);
        }
        if let Some(&(_, open_pos)) = self.parens.first() {
            return Err(LocatedTokError {
                error: TokError::UnexpectedEofInParens,
                position: open_pos,
            });
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_empty(TokType::Dedent);
        }
        let end = self.pos;
        let end_pos = self.position();
        self.push(TokType::EndMarker, end, end_pos);
        Ok(())
    }

    /// Absorb blank and comment-only lines, then emit Indent/Dedent for the
    /// next significant line. Returns false at end of input.
    fn handle_line_start(&mut self) -> Result<bool, LocatedTokError> {
        loop {
            let start = self.pos;
            let mut width = 0usize;
            loop {
                match self.peek() {
                    Some(' ') => width += 1,
                    Some('\t') => width = (width / 8 + 1) * 8,
                    Some('\x0c') => width = 0,
                    _ => break,
                }
                self.bump();
            }
            match self.peek() {
                None => {
                    self.take_into_prefix(start);
                    return Ok(false);
                }
                Some('#') => {
                    self.skip_comment();
                    self.bump_newline();
                    self.take_into_prefix(start);
                }
                Some('\n' | '\r') => {
                    self.bump_newline();
                    self.take_into_prefix(start);
                }
                Some(_) => {
                    self.take_into_prefix(start);
                    self.at_line_start = false;
                    let current = *self.indents.last().unwrap_or(&0);
                    if width > current {
                        self.indents.push(width);
                        self.push_empty(TokType::Indent);
                    } else if width < current {
                        while width < *self.indents.last().unwrap_or(&0) {
                            self.indents.pop();
                            self.push_empty(TokType::Dedent);
                        }
                        if width != *self.indents.last().unwrap_or(&0) {
                            return Err(self.error(TokError::InconsistentDedent));
                        }
                    }
                    return Ok(true);
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.bump();
        }
    }

    fn name_or_string(
        &mut self,
        start: usize,
        start_pos: TextPosition,
    ) -> Result<(), LocatedTokError> {
        while self.peek().is_some_and(is_name_continue) {
            self.bump();
        }
        let word = &self.text[start..self.pos];
        let lowered = word.to_ascii_lowercase();
        if matches!(self.peek(), Some('"' | '\'')) && STRING_PREFIXES.contains(&lowered.as_str()) {
            let is_format = lowered.contains('f') || lowered.contains('t');
            self.string_body(is_format)?;
            self.push(TokType::String, start, start_pos);
        } else {
            self.push(TokType::Name, start, start_pos);
        }
        Ok(())
    }

    /// Consume a string starting at the opening quote.
    fn string_body(&mut self, is_format: bool) -> Result<(), LocatedTokError> {
        let open_pos = self.position();
        let Some(quote) = self.bump() else {
            return Err(self.error(TokError::UnterminatedString));
        };
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }
        let unterminated = |triple: bool| LocatedTokError {
            error: if triple {
                TokError::UnterminatedTripleQuotedString
            } else {
                TokError::UnterminatedString
            },
            position: open_pos,
        };

        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(unterminated(triple));
            };
            match c {
                '\\' => {
                    self.bump();
                    if self.peek().is_none() {
                        return Err(unterminated(triple));
                    }
                    if self.newline_len() > 0 {
                        self.bump_newline();
                    } else {
                        self.bump();
                    }
                }
                '{' if is_format => {
                    self.bump();
                    if depth == 0 && self.peek() == Some('{') {
                        self.bump();
                    } else {
                        depth += 1;
                    }
                }
                '}' if is_format => {
                    self.bump();
                    if depth > 0 {
                        depth -= 1;
                    } else if self.peek() == Some('}') {
                        self.bump();
                    }
                }
                '"' | '\'' if depth > 0 => {
                    let nested_format = self.text[..self.pos]
                        .chars()
                        .rev()
                        .take_while(|c| c.is_ascii_alphabetic())
                        .any(|c| matches!(c, 'f' | 'F' | 't' | 'T'));
                    self.string_body(nested_format)?;
                }
                '\n' | '\r' if !triple && depth == 0 => {
                    return Err(unterminated(triple));
                }
                c if c == quote => {
                    if !triple {
                        self.bump();
                        return Ok(());
                    }
                    if self.peek_nth(1) == Some(quote) && self.peek_nth(2) == Some(quote) {
                        self.bump();
                        self.bump();
                        self.bump();
                        return Ok(());
                    }
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn number(&mut self, start: usize, start_pos: TextPosition) -> Result<(), LocatedTokError> {
        let Some(m) = NUMBER_RE.find(self.rest()) else {
            return Err(self.error(TokError::BadNumber));
        };
        let literal = m.as_str();
        let len = literal.len();
        for _ in 0..literal.chars().count() {
            self.bump();
        }
        debug_assert_eq!(self.pos, start + len);

        if self.peek().is_some_and(is_name_continue) {
            return Err(self.error(if literal.starts_with("0x")
                || literal.starts_with("0X")
                || literal.starts_with("0o")
                || literal.starts_with("0O")
                || literal.starts_with("0b")
                || literal.starts_with("0B")
            {
                TokError::BadNumber
            } else {
                TokError::BadDecimal
            }));
        }

        // Python 3 rejects leading zeros on non-zero decimal integers.
        let is_plain_int = literal.bytes().all(|b| b.is_ascii_digit() || b == b'_');
        if is_plain_int && literal.starts_with('0') && literal.bytes().any(|b| (b'1'..=b'9').contains(&b))
        {
            return Err(LocatedTokError {
                error: TokError::BadDecimal,
                position: start_pos,
            });
        }

        self.push(TokType::Number, start, start_pos);
        Ok(())
    }

    fn operator(
        &mut self,
        c: char,
        start: usize,
        start_pos: TextPosition,
    ) -> Result<(), LocatedTokError> {
        let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(**op)) else {
            return Err(self.error(TokError::InvalidCharacter(c)));
        };
        for _ in 0..op.len() {
            self.bump();
        }
        match c {
            '(' | '[' | '{' => self.parens.push((c, start_pos)),
            ')' | ']' | '}' => {
                let Some((open, _)) = self.parens.pop() else {
                    return Err(LocatedTokError {
                        error: TokError::UnmatchedClosingParen(c),
                        position: start_pos,
                    });
                };
                let expected = match open {
                    '(' => ')',
                    '[' => ']',
                    _ => '}',
                };
                if c != expected {
                    return Err(LocatedTokError {
                        error: TokError::MismatchedClosingParen { open, close: c },
                        position: start_pos,
                    });
                }
            }
            _ => {}
        }
        self.push(TokType::Op, start, start_pos);
        Ok(())
    }
}

/// Reassemble source text from tokens.
pub fn untokenize(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        out.push_str(&tok.prefix);
        out.push_str(&tok.text);
    }
    out
}
