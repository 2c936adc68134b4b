use rustc_hash::FxHashSet;
use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_engine::{same_as, Batch, Binding, Engine, NodeId};
use weft_ir::Precedence;

use super::{consume, wrap};
use crate::value::{Block, Group};

/// Matches `(`/`)` into groups and `{`/`}` into blocks.
///
/// Openers are matched right to left against the first unmatched closer
/// among their following siblings, so inner pairs collapse first.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ParseBrackets;

impl Binding for ParseBrackets {
    fn precedence(&self) -> Precedence {
        Precedence::GROUPING
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        let engine = batch.engine();
        let mut openers = Vec::new();
        let mut closers: FxHashSet<NodeId> = FxHashSet::default();
        for &node in batch.nodes() {
            match engine.text(node).as_str() {
                "(" | "{" => openers.push(node),
                _ => {
                    closers.insert(node);
                }
            }
        }

        for &open in openers.iter().rev() {
            let open_text = engine.text(open);
            let want = if open_text == "(" { ")" } else { "}" };
            let close = engine
                .tree()
                .following(open)
                .into_iter()
                .find(|n| closers.contains(n));
            match close {
                Some(close) if engine.text(close) == want => {
                    closers.remove(&close);
                    collapse(engine, open, close, want == "}");
                }
                Some(close) => {
                    closers.remove(&close);
                    engine.error(
                        Diagnostic::error(ErrorCode::E1001)
                            .with_message(format!(
                                "mismatched `{}`, expected `{want}`",
                                engine.text(close)
                            ))
                            .with_label(engine.span(close), format!("expected `{want}`"))
                            .with_secondary_label(engine.span(open), "to close this"),
                    );
                }
                None => {
                    engine.error(
                        Diagnostic::error(ErrorCode::E1003)
                            .with_message(format!("unclosed `{open_text}`"))
                            .with_label(engine.span(open), "never closed"),
                    );
                }
            }
        }

        for &node in batch.nodes() {
            if closers.contains(&node) {
                engine.error(
                    Diagnostic::error(ErrorCode::E1001)
                        .with_message(format!("unexpected `{}`", engine.text(node)))
                        .with_label(engine.span(node), "no matching opener"),
                );
            }
        }
    }
}

fn collapse(engine: &Engine, open: NodeId, close: NodeId, block: bool) {
    let tree = engine.tree();
    let (Some(parent), Some(sta), Some(end)) =
        (tree.parent(open), tree.index(open), tree.index(close))
    else {
        return;
    };
    let wrapped = if block {
        wrap(engine, parent, sta, end + 1, Block)
    } else {
        wrap(engine, parent, sta, end + 1, Group)
    };
    if wrapped.is_some() {
        consume(engine, open);
        consume(engine, close);
    }
}
