//! Text dump of every (Key, Source) table.

use std::sync::Arc;

use weft_ir::Span;

use super::Engine;
use crate::segment::SegmentState;

impl Engine {
    /// Render every table with its pending nodes and segments.
    ///
    /// Tables are listed by key then source. Global segments are marked
    /// `GLOBAL`; a segment whose nodes are all claimed is marked `[DONE]`.
    pub fn dump(&self) -> String {
        let mut tables: Vec<_> = self
            .tables
            .read()
            .iter()
            .map(|(&k, t)| (k, Arc::clone(t)))
            .collect();
        tables.sort_by_key(|&(k, _)| k);

        let mut lines = Vec::new();
        for ((key, source), table) in tables {
            let mut table = table.lock();
            let name = self
                .sources
                .get(source)
                .map_or_else(|| source.to_string(), |s| s.name().to_owned());
            lines.push(format!(
                "{} {:?} @ {name}",
                key.tag(),
                self.interner.lookup(key.name())
            ));

            let pending = table.pending().to_vec();
            for &(_, node) in &pending {
                let value = self.tree.value(node);
                let text = self.text(node);
                let state = if self.tree.is_done(node) { " [DONE]" } else { "" };
                lines.push(format!(
                    "  node {node:?} {} {}{state}",
                    value.describe(&text, &self.interner),
                    self.tree.span(node)
                ));
            }

            for seg in table.segments() {
                let end = if seg.end() == Span::OPEN_END {
                    "MAX".to_owned()
                } else {
                    seg.end().to_string()
                };
                let global = if seg.is_global() { " GLOBAL" } else { "" };
                let done = pending
                    .iter()
                    .filter(|&&(o, _)| seg.sta() <= o && o < seg.end())
                    .all(|&(_, n)| self.tree.is_done(n));
                let state = match seg.state() {
                    SegmentState::Queued => " queued",
                    SegmentState::Idle if done => " [DONE]",
                    SegmentState::Idle | SegmentState::Superseded => "",
                };
                lines.push(format!(
                    "  seg {}..{end} prec={} {:?}{global}{state}",
                    seg.sta(),
                    seg.precedence(),
                    seg.claim().binding,
                ));
            }
        }
        lines.join("\n")
    }
}
