//! Loading sources and running a whole compilation.

use std::fmt::Write as _;

use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_engine::{Engine, EngineConfig, NodeId, ScheduleError};
use weft_ir::SourceId;

use crate::bindings::install;
use crate::lexer::lex;
use crate::value::Token;

/// Add a source to `engine`: lex it, insert its tokens under the source
/// root, and let global bindings see it.
pub fn load(engine: &Engine, name: &str, text: &str) -> SourceId {
    let source = engine.add_source(name, text);
    let lexed = lex(source, text);
    for error in lexed.errors {
        engine.error(error);
    }
    let tokens: Vec<NodeId> = lexed
        .tokens
        .iter()
        .map(|&(kind, span)| engine.new_node(Token { kind }, span))
        .collect();
    engine.tree().insert_nodes(engine.root(source), 0, &tokens);
    engine.init_source(source);
    tracing::debug!(source = name, tokens = tokens.len(), "loaded");
    source
}

/// Result of [`compile`].
#[derive(Debug)]
pub struct Compilation {
    pub engine: Engine,
    pub sources: Vec<SourceId>,
    /// How draining ended.
    pub outcome: Result<(), ScheduleError>,
    /// Every diagnostic, sorted by span.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    /// Tree of the `n`th source, as rendered by [`render_tree`].
    pub fn render(&self, n: usize) -> String {
        self.sources
            .get(n)
            .map(|&source| render_tree(&self.engine, source))
            .unwrap_or_default()
    }
}

/// Compile `(name, text)` sources on a fresh engine: install the
/// language, load every source, drain, and finish.
#[tracing::instrument(level = "debug", skip_all, fields(sources = sources.len()))]
pub fn compile(config: EngineConfig, sources: &[(&str, &str)]) -> Compilation {
    let engine = Engine::new(config);
    install(&engine);
    let ids = sources
        .iter()
        .map(|&(name, text)| load(&engine, name, text))
        .collect();
    let outcome = engine.drain();
    let diagnostics = engine.finish();
    Compilation {
        engine,
        sources: ids,
        outcome,
        diagnostics,
    }
}

/// Indented outline of a source's tree, one node per line.
pub fn render_tree(engine: &Engine, source: SourceId) -> String {
    let mut out = String::new();
    engine.tree().walk(engine.root(source), |node, depth| {
        let text = engine.text(node);
        let line = engine.value(node).describe(&text, engine.interner());
        let _ = writeln!(out, "{:indent$}{line}", "", indent = depth * 2);
    });
    out
}
