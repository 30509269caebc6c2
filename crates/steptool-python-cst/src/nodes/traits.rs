// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree

//! Core traits and types for CST nodes.
//!
//! # Node Identity
//!
//! [`NodeId`] provides stable identity for CST nodes. The parser hands out ids
//! as it builds nodes. Nodes synthesized while editing a tree draw fresh ids
//! from the owning module's [`NodeIdGenerator`], so an id never refers to two
//! nodes of the same tree.
//!
//! # Code Generation
//!
//! Every node implements [`Codegen`]. Nodes own [`Token`]s, and tokens own
//! the whitespace and comments that precede them, so generating a tree that
//! was never edited reproduces the parsed text byte for byte.
//!
//! [`CodegenState`] can optionally track one node while generating. Nodes
//! bracket their output with [`CodegenState::enter`]/[`CodegenState::leave`],
//! and the state records the first and last significant character written in
//! between. That is how bounding boxes are computed: from the tree as it is
//! now, not from positions captured at parse time.

use std::fmt;

use crate::position::{BoundingBox, Position};
use crate::tokenizer::Token;

// ============================================================================
// Node Identity
// ============================================================================

/// A stable, unique identifier for a CST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId with the given value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Hands out sequential [`NodeId`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIdGenerator {
    next: u32,
}

impl NodeIdGenerator {
    /// Start at `NodeId(0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> u32 {
        self.next
    }
}

// ============================================================================
// Code Generation
// ============================================================================

/// Regenerate source text for a node.
pub trait Codegen {
    fn codegen(&self, state: &mut CodegenState);
}

impl<T: Codegen> Codegen for Vec<T> {
    fn codegen(&self, state: &mut CodegenState) {
        for item in self {
            item.codegen(state);
        }
    }
}

impl<T: Codegen> Codegen for Option<T> {
    fn codegen(&self, state: &mut CodegenState) {
        if let Some(item) = self {
            item.codegen(state);
        }
    }
}

impl<T: Codegen> Codegen for Box<T> {
    fn codegen(&self, state: &mut CodegenState) {
        (**self).codegen(state);
    }
}

impl Codegen for Token {
    fn codegen(&self, state: &mut CodegenState) {
        state.add_token(self);
    }
}

#[derive(Debug)]
struct Tracker {
    target: NodeId,
    line: usize,
    column: usize,
    active: bool,
    entry: Option<Position>,
    first: Option<Position>,
    last: Option<Position>,
}

impl Tracker {
    fn current(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn write(&mut self, text: &str, significant: bool) {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if self.active && significant {
                let here = self.current();
                self.first.get_or_insert(here);
                self.last = Some(here);
            }
            let is_newline = c == '\n' || (c == '\r' && chars.peek() != Some(&'\n'));
            if is_newline {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

/// Accumulates generated source text.
#[derive(Debug, Default)]
pub struct CodegenState {
    pub tokens: String,
    tracker: Option<Tracker>,
}

impl CodegenState {
    /// A state that records the bounding box of `target` while generating.
    pub fn tracking(target: NodeId) -> Self {
        CodegenState {
            tokens: String::new(),
            tracker: Some(Tracker {
                target,
                line: 1,
                column: 1,
                active: false,
                entry: None,
                first: None,
                last: None,
            }),
        }
    }

    /// Append a token: its prefix first, then its text.
    pub fn add_token(&mut self, tok: &Token) {
        self.write(&tok.prefix, false);
        self.write(&tok.text, !tok.kind.is_structural());
    }

    /// Append raw text that is not part of any node's extent.
    pub fn add_trivia(&mut self, text: &str) {
        self.write(text, false);
    }

    fn write(&mut self, text: &str, significant: bool) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.write(text, significant);
        }
        self.tokens.push_str(text);
    }

    /// Mark the start of a node's output.
    pub fn enter(&mut self, id: NodeId) {
        if let Some(tracker) = self.tracker.as_mut() {
            if tracker.target == id && tracker.entry.is_none() {
                tracker.active = true;
                tracker.entry = Some(tracker.current());
            }
        }
    }

    /// Mark the end of a node's output.
    pub fn leave(&mut self, id: NodeId) {
        if let Some(tracker) = self.tracker.as_mut() {
            if tracker.target == id {
                tracker.active = false;
            }
        }
    }

    /// Bounding box of the tracked node, if it was generated.
    ///
    /// A node that produced no significant characters gets a zero-width box
    /// at the point where it was entered.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let tracker = self.tracker.as_ref()?;
        let entry = tracker.entry?;
        match (tracker.first, tracker.last) {
            (Some(top_left), Some(bottom_right)) => Some(BoundingBox {
                top_left,
                bottom_right,
            }),
            _ => Some(BoundingBox::empty_at(entry)),
        }
    }
}

impl fmt::Display for CodegenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens)
    }
}

/// Generate the text of a node, including its leading trivia.
pub fn to_code<T: Codegen + ?Sized>(node: &T) -> String {
    let mut state = CodegenState::default();
    node.codegen(&mut state);
    state.tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokType;

    #[test]
    fn generator_is_sequential() {
        let mut ids = NodeIdGenerator::new();
        assert_eq!(ids.next_id(), NodeId(0));
        assert_eq!(ids.next_id(), NodeId(1));
        assert_eq!(ids.count(), 2);
    }

    #[test]
    fn tracking_ignores_prefix_and_structural_text() {
        let mut state = CodegenState::tracking(NodeId(7));
        state.add_token(&Token::synthetic(TokType::Name, "", "x"));
        state.enter(NodeId(7));
        state.add_token(&Token::synthetic(TokType::Op, "  \n  ", "("));
        state.add_token(&Token::synthetic(TokType::Name, " ", "abc"));
        state.add_token(&Token::synthetic(TokType::Newline, "", "\n"));
        state.leave(NodeId(7));
        state.add_token(&Token::synthetic(TokType::Name, "", "tail"));

        let bbox = state.bounding_box().unwrap();
        assert_eq!(bbox.top_left, Position { line: 2, column: 3 });
        assert_eq!(bbox.bottom_right, Position { line: 2, column: 7 });
        assert_eq!(state.to_string(), "x  \n  ( abc\ntail");
    }

    #[test]
    fn empty_node_gets_zero_width_box() {
        let mut state = CodegenState::tracking(NodeId(1));
        state.add_token(&Token::synthetic(TokType::Op, "", "("));
        state.enter(NodeId(1));
        state.leave(NodeId(1));
        state.add_token(&Token::synthetic(TokType::Op, "", ")"));
        let bbox = state.bounding_box().unwrap();
        assert_eq!(bbox.top_left, Position { line: 1, column: 2 });
        assert_eq!(bbox.bottom_right, Position { line: 1, column: 1 });
    }

    #[test]
    fn untracked_node_has_no_box() {
        let mut state = CodegenState::tracking(NodeId(99));
        state.enter(NodeId(1));
        state.add_token(&Token::synthetic(TokType::Name, "", "x"));
        state.leave(NodeId(1));
        assert_eq!(state.bounding_box(), None);
        assert_eq!(CodegenState::default().bounding_box(), None);
    }
}
