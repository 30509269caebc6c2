// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Absolute node positions.
//!
//! A [`BoundingBox`] is computed by regenerating the tree and watching for the
//! node's first and last significant characters (see
//! [`CodegenState::tracking`](crate::CodegenState::tracking)). Coordinates are
//! 1-indexed lines and 1-indexed char columns; `bottom_right` is the position
//! of the last character, inclusive.

use serde::Serialize;

/// A line/column pair, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// The rectangle covered by a node's significant text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    /// First character of the node.
    pub top_left: Position,
    /// Last character of the node, inclusive.
    pub bottom_right: Position,
}

impl BoundingBox {
    /// The zero-width box of a node with no text, located at `at`.
    ///
    /// `bottom_right` sits one column before `top_left` so that converting the
    /// inclusive end to an exclusive one yields an empty range.
    pub fn empty_at(at: Position) -> Self {
        BoundingBox {
            top_left: at,
            bottom_right: Position {
                line: at.line,
                column: at.column.saturating_sub(1),
            },
        }
    }

    /// True for boxes produced by [`BoundingBox::empty_at`].
    pub fn is_empty(&self) -> bool {
        self.top_left.line == self.bottom_right.line
            && self.bottom_right.column + 1 == self.top_left.column
    }
}
