// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser over the lossless token stream.
//!
//! Top-level `def`s (with their decorators and parameters) and literal-shaped
//! expressions inside decorator calls become structured nodes. Everything
//! else is validated line by line (bracketing, indentation, block headers) and
//! kept as token runs.

mod errors;

use std::collections::VecDeque;

pub use errors::{error_context, ParserError, Result, HERE_MARKER};

use crate::nodes::{
    Arg, BinaryOp, Call, Decorator, DecoratorExpr, Dict, DictElement, DottedName, Element,
    Expression, FunctionDef, List, Module, Name, NodeIdGenerator, Number, OpaqueExpression,
    OpaqueStatement, Param, Parameters, Parenthesized, Set, Statement, StringLiteral, Suite,
    Tuple, UnaryOp,
};
use crate::tokenizer::{TextPosition, TokType, Token};

/// Keywords that open a compound statement and therefore need a `:`.
const COMPOUND_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "while", "for", "try", "except", "finally", "with", "def", "class",
];

/// Parse a token stream produced by [`crate::tokenize`] into a [`Module`].
pub(crate) fn parse_tokens(source: &str, tokens: Vec<Token>) -> Result<Module> {
    Parser {
        source,
        tokens: tokens.into(),
        ids: NodeIdGenerator::new(),
    }
    .module()
}

struct Parser<'s> {
    source: &'s str,
    tokens: VecDeque<Token>,
    ids: NodeIdGenerator,
}

fn is_open(tok: &Token) -> bool {
    tok.kind == TokType::Op && matches!(tok.text.as_str(), "(" | "[" | "{")
}

fn is_close(tok: &Token) -> bool {
    tok.kind == TokType::Op && matches!(tok.text.as_str(), ")" | "]" | "}")
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(n)
    }

    fn peek_kind(&self) -> Option<TokType> {
        self.peek().map(|t| t.kind)
    }

    fn peek_is_op(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_op(op))
    }

    fn peek_is_name(&self, name: &str) -> bool {
        self.peek().is_some_and(|t| t.is_name(name))
    }

    fn position(&self) -> TextPosition {
        self.peek().map(|t| t.start).unwrap_or_default()
    }

    fn error(&self, expected: &str) -> ParserError {
        ParserError::expected(expected, self.position(), self.source)
    }

    fn bump(&mut self) -> Result<Token> {
        self.tokens
            .pop_front()
            .ok_or_else(|| self.error("more input"))
    }

    fn expect_op(&mut self, op: &str) -> Result<Token> {
        if self.peek_is_op(op) {
            self.bump()
        } else {
            Err(self.error(&format!("'{}'", op)))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<Name> {
        if self.peek_kind() == Some(TokType::Name) {
            let id = self.ids.next_id();
            Ok(Name {
                id,
                token: self.bump()?,
            })
        } else {
            Err(self.error(what))
        }
    }

    fn at_def(&self) -> bool {
        self.peek_is_name("def")
            || (self.peek_is_name("async") && self.peek_nth(1).is_some_and(|t| t.is_name("def")))
    }

    // ------------------------------------------------------------------------
    // Module and statements
    // ------------------------------------------------------------------------

    fn module(mut self) -> Result<Module> {
        let id = self.ids.next_id();
        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                None => return Err(self.error("end of input")),
                Some(TokType::EndMarker) => break,
                _ => body.push(self.statement()?),
            }
        }
        let eof = self.bump()?;
        Ok(Module {
            id,
            body,
            eof,
            ids: self.ids,
        })
    }

    fn statement(&mut self) -> Result<Statement> {
        if self.peek_is_op("@") {
            return self.decorated();
        }
        if self.at_def() {
            return Ok(Statement::FunctionDef(self.function_def()?));
        }
        let id = self.ids.next_id();
        let mut tokens = Vec::new();
        self.logical_line(&mut tokens)?;
        Ok(Statement::Other(OpaqueStatement { id, tokens }))
    }

    /// A decorated `def` becomes a [`FunctionDef`]; a decorated `class` is
    /// kept opaque together with its decorators.
    fn decorated(&mut self) -> Result<Statement> {
        let mut i = 0;
        let mut decorator_lines = 0;
        while self.peek_nth(i).is_some_and(|t| t.is_op("@")) {
            while self
                .peek_nth(i)
                .is_some_and(|t| !matches!(t.kind, TokType::Newline | TokType::EndMarker))
            {
                i += 1;
            }
            i += 1;
            decorator_lines += 1;
        }
        let target = self.peek_nth(i);
        let is_def = target.is_some_and(|t| t.is_name("def"))
            || (target.is_some_and(|t| t.is_name("async"))
                && self.peek_nth(i + 1).is_some_and(|t| t.is_name("def")));
        if is_def {
            return Ok(Statement::FunctionDef(self.function_def()?));
        }
        if target.is_some_and(|t| t.is_name("class")) {
            let id = self.ids.next_id();
            let mut tokens = Vec::new();
            for _ in 0..=decorator_lines {
                self.logical_line(&mut tokens)?;
            }
            return Ok(Statement::Other(OpaqueStatement { id, tokens }));
        }
        let position = target.map(|t| t.start).unwrap_or_default();
        Err(ParserError::expected(
            "'def', 'async def' or 'class' after decorator",
            position,
            self.source,
        ))
    }

    /// Consume one logical line, and its indented block if it opens one.
    fn logical_line(&mut self, out: &mut Vec<Token>) -> Result<()> {
        if self.peek_kind() == Some(TokType::Indent) {
            return Err(self.error("a statement, found an unexpected indent"));
        }
        let is_compound = self.peek().is_some_and(|t| {
            t.kind == TokType::Name && COMPOUND_KEYWORDS.contains(&t.text.as_str())
        }) || (self.peek_is_name("async")
            && self
                .peek_nth(1)
                .is_some_and(|t| t.is_name("def") || t.is_name("for") || t.is_name("with")));

        let mut depth = 0usize;
        let mut has_colon = false;
        let mut ends_with_colon = false;
        loop {
            match self.peek_kind() {
                None | Some(TokType::EndMarker) => return Err(self.error("end of line")),
                Some(TokType::Newline) => break,
                _ => {}
            }
            let tok = self.bump()?;
            if is_open(&tok) {
                depth += 1;
            } else if is_close(&tok) {
                depth = depth.saturating_sub(1);
            }
            ends_with_colon = depth == 0 && tok.is_op(":");
            has_colon |= ends_with_colon;
            out.push(tok);
        }
        if is_compound && !has_colon {
            return Err(self.error("':'"));
        }
        out.push(self.bump()?);

        if ends_with_colon {
            self.block(out)
        } else if self.peek_kind() == Some(TokType::Indent) {
            Err(self.error("a statement, found an unexpected indent"))
        } else {
            Ok(())
        }
    }

    /// `INDENT line+ DEDENT`, appended to `out`.
    fn block(&mut self, out: &mut Vec<Token>) -> Result<()> {
        if self.peek_kind() != Some(TokType::Indent) {
            return Err(self.error("an indented block"));
        }
        out.push(self.bump()?);
        loop {
            match self.peek_kind() {
                Some(TokType::Dedent) => {
                    out.push(self.bump()?);
                    return Ok(());
                }
                None | Some(TokType::EndMarker) => return Err(self.error("a dedent")),
                _ => self.logical_line(out)?,
            }
        }
    }

    // ------------------------------------------------------------------------
    // Function definitions
    // ------------------------------------------------------------------------

    fn function_def(&mut self) -> Result<FunctionDef> {
        let id = self.ids.next_id();
        let mut decorators = Vec::new();
        while self.peek_is_op("@") {
            decorators.push(self.decorator()?);
        }
        let async_tok = if self.peek_is_name("async") {
            Some(self.bump()?)
        } else {
            None
        };
        if !self.peek_is_name("def") {
            return Err(self.error("'def'"));
        }
        let def_tok = self.bump()?;
        let name = self.expect_name("a function name")?;

        let mut type_params = Vec::new();
        if self.peek_is_op("[") {
            self.balanced(&mut type_params)?;
        }

        let lpar = self.expect_op("(")?;
        let params = self.parameters()?;
        let rpar = self.expect_op(")")?;

        let mut returns = Vec::new();
        if self.peek_is_op("->") {
            returns.push(self.bump()?);
            self.expression_tokens(&[":"], &mut returns)?;
        }
        let colon = self.expect_op(":")?;
        let body = self.suite()?;

        Ok(FunctionDef {
            id,
            decorators,
            async_tok,
            def_tok,
            name,
            type_params,
            lpar,
            params,
            rpar,
            returns,
            colon,
            body,
        })
    }

    fn suite(&mut self) -> Result<Suite> {
        let id = self.ids.next_id();
        let mut tokens = Vec::new();
        if self.peek_kind() == Some(TokType::Newline) {
            tokens.push(self.bump()?);
            self.block(&mut tokens)?;
        } else {
            self.logical_line(&mut tokens)?;
        }
        Ok(Suite { id, tokens })
    }

    fn decorator(&mut self) -> Result<Decorator> {
        let id = self.ids.next_id();
        let at = self.expect_op("@")?;

        let mut end = 0;
        while self
            .peek_nth(end)
            .is_some_and(|t| !matches!(t.kind, TokType::Newline | TokType::EndMarker))
        {
            end += 1;
        }
        if end == 0 {
            return Err(self.error("an expression after '@'"));
        }

        let expr = if self.is_dotted_call(end) {
            let name_id = self.ids.next_id();
            let mut tokens = vec![self.bump()?];
            while self.peek_is_op(".") {
                tokens.push(self.bump()?);
                tokens.push(self.bump()?);
            }
            let name = DottedName {
                id: name_id,
                tokens,
            };
            let call = if self.peek_is_op("(") {
                Some(self.call()?)
            } else {
                None
            };
            DecoratorExpr::Named { name, call }
        } else {
            let mut tokens = Vec::with_capacity(end);
            for _ in 0..end {
                tokens.push(self.bump()?);
            }
            DecoratorExpr::Other(tokens)
        };

        if self.peek_kind() != Some(TokType::Newline) {
            return Err(self.error("a newline after the decorator"));
        }
        let newline = self.bump()?;
        Ok(Decorator {
            id,
            at,
            expr,
            newline,
        })
    }

    /// True when the next `end` tokens are `NAME ('.' NAME)* ['(' ... ')']`
    /// with the parenthesis closing on the last token.
    fn is_dotted_call(&self, end: usize) -> bool {
        let mut i = 0;
        if self.peek_nth(i).is_none_or(|t| t.kind != TokType::Name) {
            return false;
        }
        i += 1;
        while i < end && self.peek_nth(i).is_some_and(|t| t.is_op(".")) {
            if self.peek_nth(i + 1).is_none_or(|t| t.kind != TokType::Name) {
                return false;
            }
            i += 2;
        }
        if i == end {
            return true;
        }
        if self.peek_nth(i).is_none_or(|t| !t.is_op("(")) {
            return false;
        }
        let mut depth = 0usize;
        for j in i..end {
            let Some(tok) = self.peek_nth(j) else {
                return false;
            };
            if is_open(tok) {
                depth += 1;
            } else if is_close(tok) {
                depth -= 1;
                if depth == 0 {
                    return j + 1 == end;
                }
            }
        }
        false
    }

    fn call(&mut self) -> Result<Call> {
        let id = self.ids.next_id();
        let lpar = self.expect_op("(")?;
        let mut args = Vec::new();
        while !self.peek_is_op(")") {
            let arg_id = self.ids.next_id();
            let star = if self.peek_is_op("*") || self.peek_is_op("**") {
                Some(self.bump()?)
            } else {
                None
            };
            let (keyword, equal) = if star.is_none()
                && self.peek_kind() == Some(TokType::Name)
                && self.peek_nth(1).is_some_and(|t| t.is_op("="))
            {
                let keyword = self.expect_name("a keyword")?;
                (Some(keyword), Some(self.bump()?))
            } else {
                (None, None)
            };
            let value = self.expression(&[",", ")"])?;
            let comma = if self.peek_is_op(",") {
                Some(self.bump()?)
            } else {
                None
            };
            let done = comma.is_none();
            args.push(Arg {
                id: arg_id,
                star,
                keyword,
                equal,
                value,
                comma,
            });
            if done {
                break;
            }
        }
        let rpar = self.expect_op(")")?;
        Ok(Call {
            id,
            lpar,
            args,
            rpar,
        })
    }

    fn parameters(&mut self) -> Result<Parameters> {
        let id = self.ids.next_id();
        let mut leading = String::new();
        let mut params = Vec::new();
        if self.peek_is_op(")") {
            return Ok(Parameters {
                id,
                leading,
                params,
            });
        }
        if let Some(first) = self.tokens.front_mut() {
            leading = std::mem::take(&mut first.prefix);
        }

        loop {
            let param_id = self.ids.next_id();
            let marker = if self.peek_is_op("*") || self.peek_is_op("**") || self.peek_is_op("/")
            {
                Some(self.bump()?)
            } else {
                None
            };
            let bare = match &marker {
                Some(m) if m.text == "/" => true,
                Some(m) if m.text == "*" => self.peek_is_op(",") || self.peek_is_op(")"),
                _ => false,
            };
            let name = if bare {
                None
            } else {
                Some(self.expect_name("a parameter name")?)
            };

            let mut annotation = Vec::new();
            if name.is_some() && self.peek_is_op(":") {
                annotation.push(self.bump()?);
                self.expression_tokens(&[",", ")", "="], &mut annotation)?;
            }
            let mut default = Vec::new();
            if name.is_some() && self.peek_is_op("=") {
                default.push(self.bump()?);
                self.expression_tokens(&[",", ")"], &mut default)?;
            }
            let comma = if self.peek_is_op(",") {
                Some(self.bump()?)
            } else {
                None
            };
            let done = comma.is_none() || self.peek_is_op(")");
            params.push(Param {
                id: param_id,
                marker,
                name,
                annotation,
                default,
                comma,
            });
            if done {
                break;
            }
        }
        if !self.peek_is_op(")") {
            return Err(self.error("',' or ')'"));
        }
        Ok(Parameters {
            id,
            leading,
            params,
        })
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Move tokens into `out` up to (not including) one of `stops` at bracket
    /// depth zero. At least one token is required.
    fn expression_tokens(&mut self, stops: &[&str], out: &mut Vec<Token>) -> Result<()> {
        let mut depth = 0usize;
        let mut taken = 0;
        loop {
            let Some(tok) = self.peek() else {
                return Err(self.error("an expression"));
            };
            if depth == 0
                && (tok.kind.is_structural()
                    || (tok.kind == TokType::Op && stops.contains(&tok.text.as_str())))
            {
                break;
            }
            if is_open(tok) {
                depth += 1;
            } else if is_close(tok) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            out.push(self.bump()?);
            taken += 1;
        }
        if taken == 0 {
            return Err(self.error("an expression"));
        }
        Ok(())
    }

    /// An expression ending before one of `stops`, structured when it is
    /// literal-shaped and opaque otherwise.
    fn expression(&mut self, stops: &[&str]) -> Result<Expression> {
        let mut tokens = Vec::new();
        self.expression_tokens(stops, &mut tokens)?;
        let mut literal = LiteralParser {
            tokens: &tokens,
            pos: 0,
            ids: &mut self.ids,
        };
        if let Some(expr) = literal.parse() {
            return Ok(expr);
        }
        Ok(Expression::Opaque(OpaqueExpression {
            id: self.ids.next_id(),
            tokens,
        }))
    }

    /// Consume a bracketed run, from an opening bracket to its match.
    fn balanced(&mut self, out: &mut Vec<Token>) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let tok = self.bump()?;
            if is_open(&tok) {
                depth += 1;
            } else if is_close(&tok) {
                depth = depth.saturating_sub(1);
            }
            out.push(tok);
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

/// Structures a complete token run as a literal-shaped expression.
///
/// Works on a borrowed slice and clones tokens into nodes, so a run that
/// turns out not to be literal-shaped can still be kept as-is.
struct LiteralParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    ids: &'t mut NodeIdGenerator,
}

impl LiteralParser<'_> {
    fn parse(&mut self) -> Option<Expression> {
        let expr = self.additive()?;
        (self.pos == self.tokens.len()).then_some(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is_op(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_op(op))
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(tok)
    }

    fn expect_op(&mut self, op: &str) -> Option<Token> {
        if self.peek_is_op(op) {
            self.bump()
        } else {
            None
        }
    }

    fn additive(&mut self) -> Option<Expression> {
        let mut left = self.unary()?;
        while self.peek_is_op("+") || self.peek_is_op("-") {
            let id = self.ids.next_id();
            let op = self.bump()?;
            let right = self.unary()?;
            left = Expression::BinaryOp(BinaryOp {
                id,
                left: Box::new(left),
                op,
                right: Box::new(right),
            });
        }
        Some(left)
    }

    fn unary(&mut self) -> Option<Expression> {
        if self.peek_is_op("+") || self.peek_is_op("-") {
            let id = self.ids.next_id();
            let op = self.bump()?;
            let operand = self.unary()?;
            return Some(Expression::UnaryOp(UnaryOp {
                id,
                op,
                operand: Box::new(operand),
            }));
        }
        self.atom()
    }

    fn atom(&mut self) -> Option<Expression> {
        let tok = self.peek()?;
        match tok.kind {
            TokType::String => {
                let id = self.ids.next_id();
                let mut parts = Vec::new();
                while self.peek().is_some_and(|t| t.kind == TokType::String) {
                    parts.push(self.bump()?);
                }
                Some(Expression::String(StringLiteral { id, parts }))
            }
            TokType::Number => {
                let id = self.ids.next_id();
                Some(Expression::Number(Number {
                    id,
                    token: self.bump()?,
                }))
            }
            TokType::Name => {
                let id = self.ids.next_id();
                Some(Expression::Name(Name {
                    id,
                    token: self.bump()?,
                }))
            }
            TokType::Op => match tok.text.as_str() {
                "(" => self.paren(),
                "[" => {
                    let id = self.ids.next_id();
                    let lbracket = self.bump()?;
                    let elements = self.elements("]", Vec::new())?;
                    let rbracket = self.expect_op("]")?;
                    Some(Expression::List(List {
                        id,
                        lbracket,
                        elements,
                        rbracket,
                    }))
                }
                "{" => self.brace(),
                _ => None,
            },
            _ => None,
        }
    }

    fn paren(&mut self) -> Option<Expression> {
        let id = self.ids.next_id();
        let lpar = self.bump()?;
        if self.peek_is_op(")") {
            let rpar = self.bump()?;
            return Some(Expression::Tuple(Tuple {
                id,
                lpar,
                elements: Vec::new(),
                rpar,
            }));
        }
        let first_id = self.ids.next_id();
        let first = self.additive()?;
        if self.peek_is_op(",") {
            let comma = self.bump();
            let head = vec![Element {
                id: first_id,
                value: first,
                comma,
            }];
            let elements = self.elements(")", head)?;
            let rpar = self.expect_op(")")?;
            return Some(Expression::Tuple(Tuple {
                id,
                lpar,
                elements,
                rpar,
            }));
        }
        let rpar = self.expect_op(")")?;
        Some(Expression::Parenthesized(Parenthesized {
            id,
            lpar,
            inner: Box::new(first),
            rpar,
        }))
    }

    fn brace(&mut self) -> Option<Expression> {
        let id = self.ids.next_id();
        let lbrace = self.bump()?;
        if self.peek_is_op("}") {
            let rbrace = self.bump()?;
            return Some(Expression::Dict(Dict {
                id,
                lbrace,
                elements: Vec::new(),
                rbrace,
            }));
        }
        let first_id = self.ids.next_id();
        let first = self.additive()?;
        if !self.peek_is_op(":") {
            let comma = self.expect_op(",");
            let done = comma.is_none();
            let head = vec![Element {
                id: first_id,
                value: first,
                comma,
            }];
            let elements = if done {
                head
            } else {
                self.elements("}", head)?
            };
            let rbrace = self.expect_op("}")?;
            return Some(Expression::Set(Set {
                id,
                lbrace,
                elements,
                rbrace,
            }));
        }

        let mut elements = Vec::new();
        let mut key = Some((first_id, first));
        loop {
            let (elem_id, k) = match key.take() {
                Some(pair) => pair,
                None => {
                    if self.peek_is_op("}") {
                        break;
                    }
                    let elem_id = self.ids.next_id();
                    (elem_id, self.additive()?)
                }
            };
            let colon = self.expect_op(":")?;
            let value = self.additive()?;
            let comma = self.expect_op(",");
            let done = comma.is_none();
            elements.push(DictElement {
                id: elem_id,
                key: k,
                colon,
                value,
                comma,
            });
            if done {
                break;
            }
        }
        let rbrace = self.expect_op("}")?;
        Some(Expression::Dict(Dict {
            id,
            lbrace,
            elements,
            rbrace,
        }))
    }

    /// Comma-separated elements up to (not including) `close`.
    fn elements(&mut self, close: &str, mut elements: Vec<Element>) -> Option<Vec<Element>> {
        while !self.peek_is_op(close) {
            let id = self.ids.next_id();
            let value = self.additive()?;
            let comma = self.expect_op(",");
            let done = comma.is_none();
            elements.push(Element { id, value, comma });
            if done {
                break;
            }
        }
        Some(elements)
    }
}
