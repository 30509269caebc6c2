// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Expression nodes.
//!
//! Only the literal-shaped subset of Python expressions is structured:
//! strings, numbers, names, unary/binary `+`/`-`, and the four display
//! brackets. Anything else is kept as an [`OpaqueExpression`] token run, which
//! still round-trips exactly but evaluates to nothing.

use super::traits::{Codegen, CodegenState, NodeId};
use crate::tokenizer::Token;

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub id: NodeId,
    pub token: Token,
}

impl Name {
    /// The identifier text.
    pub fn value(&self) -> &str {
        &self.token.text
    }
}

impl Codegen for Name {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.token.codegen(state);
        state.leave(self.id);
    }
}

/// One string literal, or several adjacent ones (implicit concatenation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub id: NodeId,
    pub parts: Vec<Token>,
}

impl StringLiteral {
    /// The literal exactly as written, prefixes and quotes included.
    ///
    /// For a concatenation this runs from the first part to the last,
    /// including the whitespace and comments between parts.
    pub fn value(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push_str(&part.prefix);
            }
            out.push_str(&part.text);
        }
        out
    }

    /// Replace the literal's source text.
    ///
    /// The whitespace in front of the literal is kept; everything from the
    /// first part to the last becomes `raw`.
    pub fn set_value(&mut self, raw: impl Into<String>) {
        let Some(first) = self.parts.first_mut() else {
            return;
        };
        first.text = raw.into();
        self.parts.truncate(1);
    }

    /// True when made of more than one string token.
    pub fn is_concatenated(&self) -> bool {
        self.parts.len() > 1
    }

    /// The raw text between the quotes of a single literal, escapes left
    /// as written. `None` for a concatenation.
    pub fn body(&self) -> Option<&str> {
        let [part] = self.parts.as_slice() else {
            return None;
        };
        let (start, end) = body_bounds(&part.text)?;
        Some(&part.text[start..end])
    }

    /// Replace the text between the quotes, keeping the prefix and the quote
    /// style. Returns `false`, leaving the literal alone, for a
    /// concatenation.
    pub fn set_body(&mut self, body: &str) -> bool {
        let [part] = self.parts.as_mut_slice() else {
            return false;
        };
        let Some((start, end)) = body_bounds(&part.text) else {
            return false;
        };
        part.text.replace_range(start..end, body);
        true
    }
}

/// Byte range of a string token's body: after the prefix letters and the
/// opening quote, before the closing quote.
fn body_bounds(text: &str) -> Option<(usize, usize)> {
    let open = text.find(['\'', '"'])?;
    let quote = &text[open..open + 1];
    let triple = quote.repeat(3);
    let quote_len = if text[open..].starts_with(&triple) { 3 } else { 1 };
    let start = open + quote_len;
    let end = text.len().checked_sub(quote_len)?;
    (start <= end).then_some((start, end))
}

impl Codegen for StringLiteral {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.parts.codegen(state);
        state.leave(self.id);
    }
}

/// A numeric literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    pub id: NodeId,
    pub token: Token,
}

impl Codegen for Number {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.token.codegen(state);
        state.leave(self.id);
    }
}

/// `+x`, `-x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryOp {
    pub id: NodeId,
    pub op: Token,
    pub operand: Box<Expression>,
}

impl Codegen for UnaryOp {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.op.codegen(state);
        self.operand.codegen(state);
        state.leave(self.id);
    }
}

/// `a + b`, `a - b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOp {
    pub id: NodeId,
    pub left: Box<Expression>,
    pub op: Token,
    pub right: Box<Expression>,
}

impl Codegen for BinaryOp {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.left.codegen(state);
        self.op.codegen(state);
        self.right.codegen(state);
        state.leave(self.id);
    }
}

/// An item of a list, tuple or set display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: NodeId,
    pub value: Expression,
    pub comma: Option<Token>,
}

impl Codegen for Element {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.value.codegen(state);
        self.comma.codegen(state);
        state.leave(self.id);
    }
}

/// `[a, b]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub id: NodeId,
    pub lbracket: Token,
    pub elements: Vec<Element>,
    pub rbracket: Token,
}

impl Codegen for List {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lbracket.codegen(state);
        self.elements.codegen(state);
        self.rbracket.codegen(state);
        state.leave(self.id);
    }
}

/// `(a, b)`, `(a,)`, `()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub id: NodeId,
    pub lpar: Token,
    pub elements: Vec<Element>,
    pub rpar: Token,
}

impl Codegen for Tuple {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lpar.codegen(state);
        self.elements.codegen(state);
        self.rpar.codegen(state);
        state.leave(self.id);
    }
}

/// `(expr)` without a comma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parenthesized {
    pub id: NodeId,
    pub lpar: Token,
    pub inner: Box<Expression>,
    pub rpar: Token,
}

impl Codegen for Parenthesized {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lpar.codegen(state);
        self.inner.codegen(state);
        self.rpar.codegen(state);
        state.leave(self.id);
    }
}

/// `{a, b}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    pub id: NodeId,
    pub lbrace: Token,
    pub elements: Vec<Element>,
    pub rbrace: Token,
}

impl Codegen for Set {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lbrace.codegen(state);
        self.elements.codegen(state);
        self.rbrace.codegen(state);
        state.leave(self.id);
    }
}

/// `key: value` inside a dict display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictElement {
    pub id: NodeId,
    pub key: Expression,
    pub colon: Token,
    pub value: Expression,
    pub comma: Option<Token>,
}

impl Codegen for DictElement {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.key.codegen(state);
        self.colon.codegen(state);
        self.value.codegen(state);
        self.comma.codegen(state);
        state.leave(self.id);
    }
}

/// `{k: v}`, `{}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    pub id: NodeId,
    pub lbrace: Token,
    pub elements: Vec<DictElement>,
    pub rbrace: Token,
}

impl Codegen for Dict {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lbrace.codegen(state);
        self.elements.codegen(state);
        self.rbrace.codegen(state);
        state.leave(self.id);
    }
}

/// Any expression the parser does not structure (calls, attribute access,
/// comprehensions, lambdas, f-string expressions, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueExpression {
    pub id: NodeId,
    pub tokens: Vec<Token>,
}

impl Codegen for OpaqueExpression {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.tokens.codegen(state);
        state.leave(self.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    String(StringLiteral),
    Number(Number),
    Name(Name),
    UnaryOp(UnaryOp),
    BinaryOp(BinaryOp),
    List(List),
    Tuple(Tuple),
    Parenthesized(Parenthesized),
    Set(Set),
    Dict(Dict),
    Opaque(OpaqueExpression),
}

impl Expression {
    pub fn id(&self) -> NodeId {
        match self {
            Expression::String(n) => n.id,
            Expression::Number(n) => n.id,
            Expression::Name(n) => n.id,
            Expression::UnaryOp(n) => n.id,
            Expression::BinaryOp(n) => n.id,
            Expression::List(n) => n.id,
            Expression::Tuple(n) => n.id,
            Expression::Parenthesized(n) => n.id,
            Expression::Set(n) => n.id,
            Expression::Dict(n) => n.id,
            Expression::Opaque(n) => n.id,
        }
    }

    /// Strip any number of redundant parentheses.
    pub fn unparenthesized(&self) -> &Expression {
        match self {
            Expression::Parenthesized(p) => p.inner.unparenthesized(),
            other => other,
        }
    }

    /// Mutable counterpart of [`Expression::unparenthesized`].
    pub fn unparenthesized_mut(&mut self) -> &mut Expression {
        match self {
            Expression::Parenthesized(p) => p.inner.unparenthesized_mut(),
            other => other,
        }
    }
}

impl Codegen for Expression {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Expression::String(n) => n.codegen(state),
            Expression::Number(n) => n.codegen(state),
            Expression::Name(n) => n.codegen(state),
            Expression::UnaryOp(n) => n.codegen(state),
            Expression::BinaryOp(n) => n.codegen(state),
            Expression::List(n) => n.codegen(state),
            Expression::Tuple(n) => n.codegen(state),
            Expression::Parenthesized(n) => n.codegen(state),
            Expression::Set(n) => n.codegen(state),
            Expression::Dict(n) => n.codegen(state),
            Expression::Opaque(n) => n.codegen(state),
        }
    }
}

/// One argument of a call: `value`, `*value`, `**value` or `name=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub id: NodeId,
    pub star: Option<Token>,
    pub keyword: Option<Name>,
    pub equal: Option<Token>,
    pub value: Expression,
    pub comma: Option<Token>,
}

impl Arg {
    /// Plain positional argument (no keyword, no unpacking).
    pub fn is_positional(&self) -> bool {
        self.star.is_none() && self.keyword.is_none()
    }
}

impl Codegen for Arg {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.star.codegen(state);
        self.keyword.codegen(state);
        self.equal.codegen(state);
        self.value.codegen(state);
        self.comma.codegen(state);
        state.leave(self.id);
    }
}
