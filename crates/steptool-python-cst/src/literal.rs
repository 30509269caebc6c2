// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Safe evaluation of literal expressions.
//!
//! Accepts the same forms as Python's `ast.literal_eval`: strings, bytes,
//! numbers, `True`/`False`/`None`, tuples, lists, sets, dicts, unary `+`/`-`
//! on numbers and `+`/`-` between a real and an imaginary number. Nothing is
//! ever executed.

use thiserror::Error;

use crate::nodes::Expression;
use crate::tokenizer::Token;

/// A Python literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bytes(Vec<u8>),
    Int(i128),
    Float(f64),
    Complex { re: f64, im: f64 },
    Bool(bool),
    None,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("expression is not a literal")]
    NotLiteral,
    #[error("cannot mix bytes and nonbytes literals")]
    MixedBytes,
    #[error("invalid escape in string literal")]
    BadEscape,
    #[error("invalid number literal '{0}'")]
    BadNumber(String),
}

/// Evaluate `expr` if it is a literal.
pub fn evaluate(expr: &Expression) -> Result<Literal, LiteralError> {
    match expr {
        Expression::String(s) => evaluate_strings(&s.parts),
        Expression::Number(n) => parse_number(&n.token.text),
        Expression::Name(name) => match name.value() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            _ => Err(LiteralError::NotLiteral),
        },
        Expression::UnaryOp(op) => {
            let operand = evaluate(&op.operand)?;
            let negate = op.op.text == "-";
            match operand {
                Literal::Int(i) if negate => Ok(Literal::Int(-i)),
                Literal::Float(f) if negate => Ok(Literal::Float(-f)),
                Literal::Complex { re, im } if negate => Ok(Literal::Complex { re: -re, im: -im }),
                n @ (Literal::Int(_) | Literal::Float(_) | Literal::Complex { .. }) => Ok(n),
                _ => Err(LiteralError::NotLiteral),
            }
        }
        Expression::BinaryOp(op) => {
            let left = evaluate(&op.left)?;
            let right = evaluate(&op.right)?;
            let re = match left {
                Literal::Int(i) => i as f64,
                Literal::Float(f) => f,
                _ => return Err(LiteralError::NotLiteral),
            };
            let im = match right {
                Literal::Complex { re: real, im } if real == 0.0 => im,
                _ => return Err(LiteralError::NotLiteral),
            };
            let im = if op.op.text == "-" { -im } else { im };
            Ok(Literal::Complex { re, im })
        }
        Expression::List(list) => list
            .elements
            .iter()
            .map(|e| evaluate(&e.value))
            .collect::<Result<_, _>>()
            .map(Literal::List),
        Expression::Tuple(tuple) => tuple
            .elements
            .iter()
            .map(|e| evaluate(&e.value))
            .collect::<Result<_, _>>()
            .map(Literal::Tuple),
        Expression::Set(set) => set
            .elements
            .iter()
            .map(|e| evaluate(&e.value))
            .collect::<Result<_, _>>()
            .map(Literal::Set),
        Expression::Dict(dict) => dict
            .elements
            .iter()
            .map(|e| Ok((evaluate(&e.key)?, evaluate(&e.value)?)))
            .collect::<Result<_, _>>()
            .map(Literal::Dict),
        Expression::Parenthesized(p) => evaluate(&p.inner),
        Expression::Opaque(_) => Err(LiteralError::NotLiteral),
    }
}

fn evaluate_strings(parts: &[Token]) -> Result<Literal, LiteralError> {
    let mut text = String::new();
    let mut bytes = Vec::new();
    let mut is_bytes = None;
    for part in parts {
        let (prefix, body) = split_string_token(&part.text)?;
        if prefix.contains(['f', 't']) {
            return Err(LiteralError::NotLiteral);
        }
        let part_is_bytes = prefix.contains('b');
        if *is_bytes.get_or_insert(part_is_bytes) != part_is_bytes {
            return Err(LiteralError::MixedBytes);
        }
        let raw = prefix.contains('r');
        if part_is_bytes {
            bytes.extend(decode_bytes(body, raw)?);
        } else {
            text.push_str(&decode_str(body, raw)?);
        }
    }
    if is_bytes == Some(true) {
        Ok(Literal::Bytes(bytes))
    } else {
        Ok(Literal::Str(text))
    }
}

/// Split a string token into its lowercased prefix and the text between its
/// quotes.
fn split_string_token(text: &str) -> Result<(String, &str), LiteralError> {
    let quote_at = text.find(['\'', '"']).ok_or(LiteralError::NotLiteral)?;
    let prefix = text[..quote_at].to_ascii_lowercase();
    let rest = &text[quote_at..];
    let quote_len = if rest.starts_with("'''") || rest.starts_with("\"\"\"") {
        3
    } else {
        1
    };
    if rest.len() < quote_len * 2 {
        return Err(LiteralError::NotLiteral);
    }
    Ok((prefix, &rest[quote_len..rest.len() - quote_len]))
}

fn normalize_newlines(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n")
}

fn decode_str(body: &str, raw: bool) -> Result<String, LiteralError> {
    let body = normalize_newlines(body);
    if raw {
        return Ok(body);
    }
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else {
            return Err(LiteralError::BadEscape);
        };
        match e {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = e.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or(LiteralError::BadEscape)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            'N' => return Err(LiteralError::BadEscape),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Result<char, LiteralError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let d = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or(LiteralError::BadEscape)?;
        value = value * 16 + d;
    }
    char::from_u32(value).ok_or(LiteralError::BadEscape)
}

fn decode_bytes(body: &str, raw: bool) -> Result<Vec<u8>, LiteralError> {
    if !body.is_ascii() {
        return Err(LiteralError::NotLiteral);
    }
    let body = normalize_newlines(body);
    if raw {
        return Ok(body.into_bytes());
    }
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u8);
            continue;
        }
        let Some(e) = chars.next() else {
            return Err(LiteralError::BadEscape);
        };
        match e {
            '\n' => {}
            '\\' => out.push(b'\\'),
            '\'' => out.push(b'\''),
            '"' => out.push(b'"'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '0'..='7' => {
                let mut value = e.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            'x' => out.push(hex_escape(&mut chars, 2)? as u8),
            other => {
                out.push(b'\\');
                out.push(other as u8);
            }
        }
    }
    Ok(out)
}

fn parse_number(text: &str) -> Result<Literal, LiteralError> {
    let bad = || LiteralError::BadNumber(text.to_string());
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();

    if let Some(imag) = lower.strip_suffix('j') {
        let im = imag.parse::<f64>().map_err(|_| bad())?;
        return Ok(Literal::Complex { re: 0.0, im });
    }
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            return i128::from_str_radix(digits, radix)
                .map(Literal::Int)
                .map_err(|_| bad());
        }
    }
    if lower.contains(['.', 'e']) {
        return lower.parse::<f64>().map(Literal::Float).map_err(|_| bad());
    }
    lower.parse::<i128>().map(Literal::Int).map_err(|_| bad())
}
