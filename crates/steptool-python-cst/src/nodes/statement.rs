// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Module and statement nodes.
//!
//! Top-level function definitions are fully structured down to their
//! decorators and parameters. Every other statement, and every function body,
//! is an opaque token run.

use super::expression::{Arg, Name};
use super::traits::{Codegen, CodegenState, NodeId, NodeIdGenerator};
use crate::position::BoundingBox;
use crate::tokenizer::{TokType, Token};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: NodeId,
    pub body: Vec<Statement>,
    /// The end marker, carrying trailing blank lines and comments.
    pub eof: Token,
    pub(crate) ids: NodeIdGenerator,
}

impl Module {
    /// Regenerate the module's source text.
    pub fn code(&self) -> String {
        let mut state = CodegenState::default();
        self.codegen(&mut state);
        state.tokens
    }

    /// Bounding box of the node with id `id`, computed from the tree as it is
    /// now. `None` when no such node exists in this module.
    pub fn bounding_box(&self, id: NodeId) -> Option<BoundingBox> {
        let mut state = CodegenState::tracking(id);
        self.codegen(&mut state);
        state.bounding_box()
    }

    /// Top-level function definitions, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::FunctionDef(def) => Some(def),
            Statement::Other(_) => None,
        })
    }

    /// Mutable access to the top-level function definitions.
    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut FunctionDef> {
        self.body.iter_mut().filter_map(|stmt| match stmt {
            Statement::FunctionDef(def) => Some(def),
            Statement::Other(_) => None,
        })
    }

    /// Find a top-level function definition by node id.
    pub fn function_mut(&mut self, id: NodeId) -> Option<&mut FunctionDef> {
        self.functions_mut().find(|def| def.id == id)
    }

    /// Hand out a fresh id for a node synthesized while editing.
    pub fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }

    /// Split borrow: a function definition together with the id generator.
    pub fn function_and_ids(
        &mut self,
        id: NodeId,
    ) -> Option<(&mut FunctionDef, &mut NodeIdGenerator)> {
        let Module { body, ids, .. } = self;
        let def = body.iter_mut().find_map(|stmt| match stmt {
            Statement::FunctionDef(def) if def.id == id => Some(def),
            _ => None,
        })?;
        Some((def, ids))
    }
}

impl Codegen for Module {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.body.codegen(state);
        self.eof.codegen(state);
        state.leave(self.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    FunctionDef(FunctionDef),
    Other(OpaqueStatement),
}

impl Codegen for Statement {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Statement::FunctionDef(def) => def.codegen(state),
            Statement::Other(stmt) => stmt.codegen(state),
        }
    }
}

/// A statement kept as raw tokens. Compound statements include their whole
/// indented block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueStatement {
    pub id: NodeId,
    pub tokens: Vec<Token>,
}

impl Codegen for OpaqueStatement {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.tokens.codegen(state);
        state.leave(self.id);
    }
}

/// `[@decorators] [async] def name[type_params](params) [-> returns]: body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub id: NodeId,
    pub decorators: Vec<Decorator>,
    pub async_tok: Option<Token>,
    pub def_tok: Token,
    pub name: Name,
    /// `[T, ...]` for generic functions, empty otherwise.
    pub type_params: Vec<Token>,
    pub lpar: Token,
    pub params: Parameters,
    pub rpar: Token,
    /// `-> annotation`, empty when absent.
    pub returns: Vec<Token>,
    pub colon: Token,
    pub body: Suite,
}

impl FunctionDef {
    pub fn name(&self) -> &str {
        self.name.value()
    }

    pub fn is_async(&self) -> bool {
        self.async_tok.is_some()
    }
}

impl Codegen for FunctionDef {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.decorators.codegen(state);
        self.async_tok.codegen(state);
        self.def_tok.codegen(state);
        self.name.codegen(state);
        self.type_params.codegen(state);
        self.lpar.codegen(state);
        self.params.codegen(state);
        self.rpar.codegen(state);
        self.returns.codegen(state);
        self.colon.codegen(state);
        self.body.codegen(state);
        state.leave(self.id);
    }
}

/// `@expr NEWLINE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator {
    pub id: NodeId,
    pub at: Token,
    pub expr: DecoratorExpr,
    pub newline: Token,
}

impl Decorator {
    /// The dotted name being applied, or `None` for arbitrary expressions.
    pub fn name(&self) -> Option<String> {
        match &self.expr {
            DecoratorExpr::Named { name, .. } => Some(name.value()),
            DecoratorExpr::Other(_) => None,
        }
    }

    /// The call part of `@name(...)`.
    pub fn call(&self) -> Option<&Call> {
        match &self.expr {
            DecoratorExpr::Named { call, .. } => call.as_ref(),
            DecoratorExpr::Other(_) => None,
        }
    }

    pub fn call_mut(&mut self) -> Option<&mut Call> {
        match &mut self.expr {
            DecoratorExpr::Named { call, .. } => call.as_mut(),
            DecoratorExpr::Other(_) => None,
        }
    }
}

impl Codegen for Decorator {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.at.codegen(state);
        self.expr.codegen(state);
        self.newline.codegen(state);
        state.leave(self.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorExpr {
    /// `@a.b.c` or `@a.b.c(args)`.
    Named {
        name: DottedName,
        call: Option<Call>,
    },
    /// Anything else (subscripts, chained calls, ...).
    Other(Vec<Token>),
}

impl Codegen for DecoratorExpr {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            DecoratorExpr::Named { name, call } => {
                name.codegen(state);
                call.codegen(state);
            }
            DecoratorExpr::Other(tokens) => tokens.codegen(state),
        }
    }
}

/// `a.b.c`, stored as alternating name and dot tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName {
    pub id: NodeId,
    pub tokens: Vec<Token>,
}

impl DottedName {
    /// The name with interior whitespace removed, e.g. `"a.b"`.
    pub fn value(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

impl Codegen for DottedName {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.tokens.codegen(state);
        state.leave(self.id);
    }
}

/// `( args )`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub id: NodeId,
    pub lpar: Token,
    pub args: Vec<Arg>,
    pub rpar: Token,
}

impl Codegen for Call {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.lpar.codegen(state);
        self.args.codegen(state);
        self.rpar.codegen(state);
        state.leave(self.id);
    }
}

/// The parameter list between a function's parentheses.
///
/// The whitespace between `(` and the first parameter is held in `leading`
/// and lies outside the node's extent, so replacing the parameters never
/// disturbs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub id: NodeId,
    pub leading: String,
    pub params: Vec<Param>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Bare parameter names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(Param::name_value).collect()
    }

    /// The text of the parameters, without `leading`.
    pub fn code(&self) -> String {
        let mut state = CodegenState::default();
        self.params.codegen(&mut state);
        state.tokens
    }

    /// Replace every parameter with a bare name, joined by `", "`.
    ///
    /// Markers, annotations and defaults of the old parameters are not kept.
    pub fn replace_with_names<S: AsRef<str>>(&mut self, names: &[S], ids: &mut NodeIdGenerator) {
        let last = names.len().saturating_sub(1);
        self.params = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let prefix = if i == 0 { "" } else { " " };
                Param {
                    id: ids.next_id(),
                    marker: None,
                    name: Some(Name {
                        id: ids.next_id(),
                        token: Token::synthetic(TokType::Name, prefix, name.as_ref()),
                    }),
                    annotation: Vec::new(),
                    default: Vec::new(),
                    comma: (i < last).then(|| Token::synthetic(TokType::Op, "", ",")),
                }
            })
            .collect();
    }
}

impl Codegen for Parameters {
    fn codegen(&self, state: &mut CodegenState) {
        state.add_trivia(&self.leading);
        state.enter(self.id);
        self.params.codegen(state);
        state.leave(self.id);
    }
}

/// One parameter: `[*|**] name [: annotation] [= default] [,]`, or a bare
/// `*` / `/` separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub id: NodeId,
    pub marker: Option<Token>,
    pub name: Option<Name>,
    /// `: annotation`, empty when absent.
    pub annotation: Vec<Token>,
    /// `= default`, empty when absent.
    pub default: Vec<Token>,
    pub comma: Option<Token>,
}

impl Param {
    /// The bare name, or the marker text for separators.
    pub fn name_value(&self) -> &str {
        match (&self.name, &self.marker) {
            (Some(name), _) => name.value(),
            (None, Some(marker)) => &marker.text,
            (None, None) => "",
        }
    }

    /// True for `*` and `/` separators.
    pub fn is_separator(&self) -> bool {
        self.name.is_none()
    }
}

impl Codegen for Param {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.marker.codegen(state);
        self.name.codegen(state);
        self.annotation.codegen(state);
        self.default.codegen(state);
        self.comma.codegen(state);
        state.leave(self.id);
    }
}

/// A block of statements following a `:`, from the `Newline` after the colon
/// through the closing `Dedent`, or the rest of the line for one-line bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub id: NodeId,
    pub tokens: Vec<Token>,
}

impl Codegen for Suite {
    fn codegen(&self, state: &mut CodegenState) {
        state.enter(self.id);
        self.tokens.codegen(state);
        state.leave(self.id);
    }
}
