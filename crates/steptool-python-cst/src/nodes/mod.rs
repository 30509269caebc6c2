// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod expression;
mod statement;
pub(crate) mod traits;

pub use expression::{
    Arg, BinaryOp, Dict, DictElement, Element, Expression, List, Name, Number, OpaqueExpression,
    Parenthesized, Set, StringLiteral, Tuple, UnaryOp,
};
pub use statement::{
    Call, Decorator, DecoratorExpr, DottedName, FunctionDef, Module, OpaqueStatement, Param,
    Parameters, Statement, Suite,
};
pub use traits::{to_code, Codegen, CodegenState, NodeId, NodeIdGenerator};
