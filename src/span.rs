//! Node spans in text coordinates.
//!
//! Bounding boxes from the syntax tree use 1-indexed columns with an
//! inclusive end. [`Span`]s use 0-indexed columns with an exclusive end, so
//! the conversion is `start_col = tl.column - 1` and `end_col = br.column`,
//! both clamped at zero. Nodes that cannot be located map to
//! [`Span::UNKNOWN`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use steptool_python_cst::{BoundingBox, Module, NodeId};

use crate::patch::Span;
use crate::source_tree::SourceTree;

/// Computes [`Span`]s for tree nodes.
pub struct SpanCalculator;

impl SpanCalculator {
    /// Span of node `id` in `module` as the tree is now.
    pub fn span_of(module: &Module, id: NodeId) -> Span {
        Self::from_bounding_box(module.bounding_box(id))
    }

    /// Convert a bounding box; `None` becomes the sentinel.
    pub fn from_bounding_box(bbox: Option<BoundingBox>) -> Span {
        let Some(bbox) = bbox else {
            return Span::UNKNOWN;
        };
        Span::new(
            clamp(bbox.top_left.line),
            clamp(bbox.top_left.column.saturating_sub(1)),
            clamp(bbox.bottom_right.line),
            clamp(bbox.bottom_right.column),
        )
    }

    /// Span of node `id`, computed now or deferred until read.
    pub fn compute(tree: &SourceTree, id: NodeId, lazy: bool) -> StepSpan {
        if lazy {
            StepSpan::Deferred(Self::lazy(tree, id))
        } else {
            StepSpan::Eager(Self::span_of(&tree.module(), id))
        }
    }

    /// A handle that computes the span of node `id` each time it is read.
    pub fn lazy(tree: &SourceTree, id: NodeId) -> LazySpan {
        LazySpan {
            module: tree.shared_module(),
            id,
        }
    }
}

fn clamp(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// A span computed on demand against the live tree.
///
/// Reading it after the node itself was replaced yields the sentinel. Reading
/// it while the tree is mutably borrowed also yields the sentinel.
#[derive(Clone)]
pub struct LazySpan {
    module: Rc<RefCell<Module>>,
    id: NodeId,
}

impl LazySpan {
    /// Compute the span now.
    pub fn get(&self) -> Span {
        match self.module.try_borrow() {
            Ok(module) => SpanCalculator::span_of(&module, self.id),
            Err(_) => Span::UNKNOWN,
        }
    }

    /// The node this span tracks.
    pub fn node(&self) -> NodeId {
        self.id
    }
}

impl fmt::Debug for LazySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySpan").field("node", &self.id).finish()
    }
}

/// The span carried by a discovered step: either a value or a deferred
/// computation.
#[derive(Debug, Clone)]
pub enum StepSpan {
    Eager(Span),
    Deferred(LazySpan),
}

impl StepSpan {
    /// The span, computing it if deferred.
    pub fn get(&self) -> Span {
        match self {
            StepSpan::Eager(span) => *span,
            StepSpan::Deferred(lazy) => lazy.get(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, StepSpan::Deferred(_))
    }
}

impl From<Span> for StepSpan {
    fn from(span: Span) -> Self {
        StepSpan::Eager(span)
    }
}

impl From<LazySpan> for StepSpan {
    fn from(lazy: LazySpan) -> Self {
        StepSpan::Deferred(lazy)
    }
}
