//! The language's bindings.
//!
//! | binding | key | precedence |
//! |---|---|---|
//! | [`ParseBrackets`] | `Symbol` `(` `)` `{` `}` | grouping |
//! | [`SplitLines`] | `Kind(line-break)` | structure |
//! | [`ParseIf`] | `Word(if)` | control |
//! | [`ParseLet`] | `Word(let)` | declaration |
//! | [`ResolveVar`] | `Word(name)`, local to each scope | resolve |
//! | [`ParsePrint`] | `Word(print)` | expression |
//! | [`ParseLiteral`] | `Kind(integer)`, `Kind(string)` | literal |
//! | [`UnknownWord`] | `Kind(word)` | fallback |
//!
//! Statement bindings take every sibling after their keyword up to the end
//! of the enclosing line, group, or block.

mod brackets;
mod fallback;
mod lines;
mod literal;
mod statements;

use std::sync::Arc;

use weft_engine::{Binding, Engine, NodeId, Value};
use weft_ir::Key;

use crate::value::{Token, TokenKind};

pub use brackets::ParseBrackets;
pub use fallback::UnknownWord;
pub use lines::SplitLines;
pub use literal::ParseLiteral;
pub use statements::{ParseIf, ParseLet, ParsePrint, ResolveVar};

/// Register every global binding of the language on `engine`.
pub fn install(engine: &Engine) {
    let interner = engine.interner();
    let kind = |k: TokenKind| Key::Kind(interner.intern(k.name()));
    let word = |w: &str| Key::Word(interner.intern(w));

    let globals: Vec<(Key, Arc<dyn Binding>)> = vec![
        (Key::Symbol(interner.intern("(")), Arc::new(ParseBrackets)),
        (Key::Symbol(interner.intern(")")), Arc::new(ParseBrackets)),
        (Key::Symbol(interner.intern("{")), Arc::new(ParseBrackets)),
        (Key::Symbol(interner.intern("}")), Arc::new(ParseBrackets)),
        (kind(TokenKind::LineBreak), Arc::new(SplitLines)),
        (word("if"), Arc::new(ParseIf)),
        (word("let"), Arc::new(ParseLet)),
        (word("print"), Arc::new(ParsePrint)),
        (kind(TokenKind::Integer), Arc::new(ParseLiteral)),
        (kind(TokenKind::Str), Arc::new(ParseLiteral)),
        (kind(TokenKind::Word), Arc::new(UnknownWord)),
    ];
    for (key, binding) in globals {
        engine.bind_global(key, binding);
    }
    tracing::debug!(bindings = engine.binding_count(), "language installed");
}

/// Move children `sta..end` of `parent` under a new node holding `value`.
///
/// Returns `None` for an empty range.
fn wrap(engine: &Engine, parent: NodeId, sta: usize, end: usize, value: impl Value) -> Option<NodeId> {
    let tree = engine.tree();
    let children = tree.children(parent);
    let span = tree.span_of(children.get(sta..end)?)?;
    let node = engine.new_node(value, span);
    let moved = tree.splice(parent, sta, end, &[node]);
    tree.insert_nodes(node, 0, &moved);
    Some(node)
}

/// Drop a token the enclosing construct has absorbed.
fn consume(engine: &Engine, node: NodeId) {
    engine.mark_done(node);
    engine.tree().remove(node);
}

fn token_kind(engine: &Engine, node: NodeId) -> Option<TokenKind> {
    engine.value(node).downcast_ref::<Token>().map(|t| t.kind)
}

fn is_symbol(engine: &Engine, node: NodeId, symbol: &str) -> bool {
    token_kind(engine, node) == Some(TokenKind::Symbol) && engine.text(node) == symbol
}

fn is_word(engine: &Engine, node: NodeId) -> bool {
    token_kind(engine, node) == Some(TokenKind::Word)
}

/// Statement headed by `head`: its parent, its index, and the siblings
/// after it.
fn statement(engine: &Engine, head: NodeId) -> Option<(NodeId, usize, Vec<NodeId>)> {
    let tree = engine.tree();
    let parent = tree.parent(head)?;
    let at = tree.index(head)?;
    Some((parent, at, tree.following(head)))
}
