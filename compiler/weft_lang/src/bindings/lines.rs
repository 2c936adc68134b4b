use rustc_hash::FxHashSet;
use weft_engine::{same_as, Batch, Binding, NodeId};
use weft_ir::Precedence;

use crate::value::Line;

/// Splits every parent holding line breaks into [`Line`] nodes.
///
/// Breaks are dropped; empty lines produce no node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SplitLines;

impl Binding for SplitLines {
    fn precedence(&self) -> Precedence {
        Precedence::STRUCTURE
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        let engine = batch.engine();
        let tree = engine.tree();
        let breaks: FxHashSet<NodeId> = batch.nodes().iter().copied().collect();

        let mut seen = FxHashSet::default();
        let parents: Vec<NodeId> = batch
            .nodes()
            .iter()
            .filter_map(|&n| tree.parent(n))
            .filter(|&p| seen.insert(p))
            .collect();

        for parent in parents {
            let children = tree.remove_nodes(parent, 0, tree.child_count(parent));
            let mut lines = Vec::new();
            for run in children.split(|n| breaks.contains(n)) {
                let Some(span) = tree.span_of(run) else {
                    continue;
                };
                let line = engine.new_node(Line, span);
                tree.insert_nodes(line, 0, run);
                lines.push(line);
            }
            tree.insert_nodes(parent, 0, &lines);
        }
        tracing::trace!(breaks = breaks.len(), "lines split");
    }
}
