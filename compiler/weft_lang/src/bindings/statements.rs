//! `if`, `let`, and `print` statements, and variable resolution.

use std::sync::Arc;

use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_engine::{same_as, Batch, Binding, Engine, NodeId};
use weft_ir::{Key, Name, Precedence, Span};

use super::{consume, is_symbol, is_word, statement, wrap};
use crate::value::{Body, Cond, If, Let, Print, VarRef};

/// `if cond: body`, where the body is the rest of the line.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ParseIf;

impl Binding for ParseIf {
    fn precedence(&self) -> Precedence {
        Precedence::CONTROL
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        let engine = batch.engine();
        for &head in batch.nodes().iter().rev() {
            parse_if(engine, head);
        }
    }
}

fn parse_if(engine: &Engine, head: NodeId) {
    let Some((parent, at, rest)) = statement(engine, head) else {
        return;
    };
    let Some(colon_at) = rest.iter().position(|&n| is_symbol(engine, n, ":")) else {
        engine.error(
            Diagnostic::error(ErrorCode::E1001)
                .with_message("expected `:` after `if` condition")
                .with_label(engine.span(head), "this `if` has no `:`"),
        );
        return;
    };
    let (cond, body) = (&rest[..colon_at], &rest[colon_at + 1..]);
    if cond.is_empty() {
        engine.error(
            Diagnostic::error(ErrorCode::E1002)
                .with_message("expected condition after `if`")
                .with_label(engine.span(head), "missing condition"),
        );
    }
    if body.is_empty() {
        engine.error(
            Diagnostic::error(ErrorCode::E1002)
                .with_message("expected statement after `:`")
                .with_label(engine.span(rest[colon_at]), "nothing follows"),
        );
    }

    let count = engine.tree().child_count(parent);
    let Some(node) = wrap(engine, parent, at, count, If) else {
        return;
    };
    consume(engine, head);
    consume(engine, rest[colon_at]);
    let mut at = 0;
    if wrap(engine, node, 0, cond.len(), Cond).is_some() {
        at = 1;
    }
    wrap(engine, node, at, at + body.len(), Body);
}

/// `let name = expr`.
///
/// Declares `name` in the enclosing scope, visible from the end of the
/// statement, and binds a [`ResolveVar`] over the rest of that scope.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ParseLet;

impl Binding for ParseLet {
    fn precedence(&self) -> Precedence {
        Precedence::DECLARATION
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        let engine = batch.engine();
        for &head in batch.nodes().iter().rev() {
            parse_let(engine, head);
        }
    }
}

fn parse_let(engine: &Engine, head: NodeId) {
    let Some((parent, at, rest)) = statement(engine, head) else {
        return;
    };
    let name_node = match rest.first() {
        Some(&n) if is_word(engine, n) => n,
        other => {
            let span = other.map_or_else(|| engine.span(head), |&n| engine.span(n));
            engine.error(
                Diagnostic::error(ErrorCode::E1004)
                    .with_message("expected identifier after `let`")
                    .with_label(span, "expected a name"),
            );
            return;
        }
    };
    let text = engine.text(name_node);
    let Some(&eq) = rest.get(1).filter(|&&n| is_symbol(engine, n, "=")) else {
        engine.error(
            Diagnostic::error(ErrorCode::E1001)
                .with_message(format!("expected `=` after `let {text}`"))
                .with_label(engine.span(name_node), "expected `=` after this"),
        );
        return;
    };
    if rest.len() == 2 {
        engine.error(
            Diagnostic::error(ErrorCode::E1002)
                .with_message("expected expression after `=`")
                .with_label(engine.span(eq), "nothing follows"),
        );
    }

    let name = engine.interner().intern(&text);
    let count = engine.tree().child_count(parent);
    let Some(node) = wrap(engine, parent, at, count, Let { name }) else {
        return;
    };
    consume(engine, head);
    consume(engine, name_node);
    consume(engine, eq);

    let Some(scope) = engine.enclosing_scope(node) else {
        return;
    };
    let span = engine.span(node);
    let scope_end = engine.scope_span(scope).end;
    engine.declare(scope, name, span.end, node);
    engine.bind(
        Key::Word(name),
        Span::new(span.source, span.end, scope_end),
        Arc::new(ResolveVar { name, decl: node }),
    );
    tracing::trace!(name = %text, scope = scope.raw(), "declared");
}

/// Turns each use of a declared name into a [`VarRef`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ResolveVar {
    pub name: Name,
    pub decl: NodeId,
}

impl Binding for ResolveVar {
    fn precedence(&self) -> Precedence {
        Precedence::RESOLVE
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        for &node in batch.nodes() {
            let decl = batch.resolve(node, self.name).map_or(self.decl, |v| v.decl);
            batch.replace_with_value(
                node,
                VarRef {
                    name: self.name,
                    decl,
                },
            );
        }
    }
}

/// `print args`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ParsePrint;

impl Binding for ParsePrint {
    fn precedence(&self) -> Precedence {
        Precedence::EXPRESSION
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        let engine = batch.engine();
        for &head in batch.nodes().iter().rev() {
            let Some((parent, at, rest)) = statement(engine, head) else {
                continue;
            };
            if rest.is_empty() {
                engine.error(
                    Diagnostic::error(ErrorCode::E1002)
                        .with_message("expected expression after `print`")
                        .with_label(engine.span(head), "nothing to print"),
                );
                continue;
            }
            let count = engine.tree().child_count(parent);
            if wrap(engine, parent, at, count, Print).is_some() {
                consume(engine, head);
            }
        }
    }
}
