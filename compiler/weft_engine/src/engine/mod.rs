//! The engine: one compilation's sources, tree, tables and worklist.
//!
//! Lifecycle: create, load sources and bindings, [`drain`](Engine::drain),
//! [`finish`](Engine::finish), drop. Several engines can run side by side;
//! nothing here is process-global.

mod dump;
mod scopes;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use weft_diagnostic::{Diagnostic, ErrorCode, ErrorSet};
use weft_ir::{Key, SharedInterner, SourceId, SourceMap, Span};

use crate::binding::{Batch, Binding, BindingId, BindingRegistry};
use crate::config::EngineConfig;
use crate::error::{fatal, InvariantViolation, ScheduleError};
use crate::scope::Scopes;
use crate::segment::{BindOutcome, Claim, Segment, SourceTable};
use crate::tree::{NodeId, Tree};
use crate::value::{SourceRoot, Value};
use crate::watchdog::Watchdog;
use crate::worklist::{Completion, Next, Ticket, Worklist};

type TableRef = Arc<Mutex<SourceTable>>;

struct GlobalEntry {
    key: Key,
    binding_id: BindingId,
    binding: Arc<dyn Binding>,
}

/// Global bindings and the sources they have been projected onto.
#[derive(Default)]
struct Globals {
    entries: Vec<GlobalEntry>,
    sources: Vec<SourceId>,
}

/// Per-compilation rewriting engine.
pub struct Engine {
    config: EngineConfig,
    interner: SharedInterner,
    sources: SourceMap,
    tree: Tree,
    roots: RwLock<Vec<NodeId>>,
    bindings: BindingRegistry,
    tables: RwLock<FxHashMap<(Key, SourceId), TableRef>>,
    globals: Mutex<Globals>,
    worklist: Worklist,
    scopes: Scopes,
    errors: ErrorSet,
    segment_ids: AtomicU64,
    sealed: AtomicBool,
    failure: Mutex<Option<ScheduleError>>,
    steps: AtomicUsize,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_interner(config, SharedInterner::new())
    }

    /// Create an engine sharing an existing interner, so names compare
    /// across engines.
    pub fn with_interner(config: EngineConfig, interner: SharedInterner) -> Self {
        let errors = ErrorSet::with_limit(config.error_limit);
        Engine {
            config,
            interner,
            sources: SourceMap::new(),
            tree: Tree::new(),
            roots: RwLock::new(Vec::new()),
            bindings: BindingRegistry::default(),
            tables: RwLock::new(FxHashMap::default()),
            globals: Mutex::new(Globals::default()),
            worklist: Worklist::new(),
            scopes: Scopes::new(),
            errors,
            segment_ids: AtomicU64::new(0),
            sealed: AtomicBool::new(false),
            failure: Mutex::new(None),
            steps: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[inline]
    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    #[inline]
    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    /// Batches processed across all drains.
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    // Sources

    /// Load a source and create its root node.
    ///
    /// Global bindings reach the source once [`init_source`](Self::init_source)
    /// is called, typically after its tokens are inserted.
    pub fn add_source(&self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let mut roots = self.roots.write();
        let id = self.sources.add(name, text);
        let len = self.sources.get(id).map_or(0, |s| s.len());
        let root = self
            .tree
            .alloc(Arc::new(SourceRoot), Span::new(id, 0, len));
        roots.push(root);
        tracing::debug!(source = id.raw(), len, "source added");
        id
    }

    /// Root node of a source.
    pub fn root(&self, source: SourceId) -> NodeId {
        match self.roots.read().get(source.index()) {
            Some(&root) => root,
            None => fatal(InvariantViolation::UnknownSource { id: source.raw() }),
        }
    }

    /// Project every global binding onto `source`. Idempotent.
    #[tracing::instrument(level = "debug", skip_all, fields(source = source.raw()))]
    pub fn init_source(&self, source: SourceId) {
        let _ = self.root(source);
        let mut globals = self.globals.lock();
        if globals.sources.contains(&source) {
            return;
        }
        globals.sources.push(source);
        let created: Vec<Arc<Segment>> = globals
            .entries
            .iter()
            .flat_map(|g| self.project(g, source).created)
            .collect();
        drop(globals);
        self.worklist.queue_all(&created);
    }

    // Nodes

    /// Allocate a node and register it under the keys its value reports.
    pub fn new_node(&self, value: impl Value, span: Span) -> NodeId {
        self.new_node_arc(Arc::new(value), span)
    }

    pub fn new_node_arc(&self, value: Arc<dyn Value>, span: Span) -> NodeId {
        let id = self.tree.alloc(Arc::clone(&value), span);
        self.register_keys(id, &*value, span);
        id
    }

    fn register_keys(&self, id: NodeId, value: &dyn Value, span: Span) {
        let text = self
            .sources
            .get(span.source)
            .map(|s| s.slice(span).to_owned())
            .unwrap_or_default();
        for key in value.keys(&text, &self.interner) {
            self.add_nodes(key, &[id]);
        }
    }

    /// Register nodes under `key`.
    ///
    /// Segments already covering a node are queued again so existing
    /// bindings see it.
    pub fn add_nodes(&self, key: Key, nodes: &[NodeId]) {
        let mut by_source: FxHashMap<SourceId, Vec<(u32, NodeId)>> = FxHashMap::default();
        for &node in nodes {
            let span = self.tree.span(node);
            self.tree.mark_registered(node);
            by_source
                .entry(span.source)
                .or_default()
                .push((span.start, node));
        }
        for (source, pending) in by_source {
            let table = self.table(key, source);
            let revive = table.lock().add_pending(&pending);
            self.worklist.queue_all(&revive);
        }
    }

    /// Give a node's position a new value.
    ///
    /// A fresh node with the same span takes the old node's place and is
    /// returned; the old node keeps its children and is detached.
    pub fn replace_with_value(&self, node: NodeId, value: impl Value) -> NodeId {
        let span = self.tree.span(node);
        let value: Arc<dyn Value> = Arc::new(value);
        let fresh = self.tree.alloc(Arc::clone(&value), span);
        self.tree.replace(node, &[fresh]);
        self.register_keys(fresh, &*value, span);
        fresh
    }

    /// Exclude a node from further rewriting.
    pub fn mark_done(&self, node: NodeId) {
        self.tree.set_done(node, true);
    }

    pub fn value(&self, node: NodeId) -> Arc<dyn Value> {
        self.tree.value(node)
    }

    pub fn span(&self, node: NodeId) -> Span {
        self.tree.span(node)
    }

    /// Source text under a node.
    pub fn text(&self, node: NodeId) -> String {
        self.sources.text(self.tree.span(node))
    }

    // Bindings

    /// Bind `binding` over `span` under `key`.
    ///
    /// Narrower claims override wider ones; overlapped segments are
    /// superseded and every new segment is queued. Zero-length spans are
    /// ignored.
    pub fn bind(&self, key: Key, span: Span, binding: Arc<dyn Binding>) {
        if self.is_sealed() {
            fatal(InvariantViolation::Sealed);
        }
        if span.end < span.start {
            fatal(InvariantViolation::InvertedRange {
                key,
                sta: span.start,
                end: span.end,
            });
        }
        if span.is_empty() {
            return;
        }
        let (binding_id, binding) = self.bindings.intern(binding);
        let claim = Arc::new(Claim {
            precedence: binding.precedence(),
            binding,
            binding_id,
            key,
            source: span.source,
            global: false,
            sta: span.start,
            end: span.end,
        });
        let outcome = self.apply(&claim);
        tracing::trace!(
            ?key,
            %span,
            binding = binding_id.raw(),
            created = outcome.created.len(),
            superseded = outcome.superseded.len(),
            "bind"
        );
        self.worklist.queue_all(&outcome.created);
    }

    /// Bind `binding` under `key` over every loaded and future source.
    ///
    /// Local bindings on the same key are narrower and override it.
    #[tracing::instrument(level = "debug", skip_all, fields(key = ?key, binding = ?binding))]
    pub fn bind_global(&self, key: Key, binding: Arc<dyn Binding>) {
        if self.is_sealed() {
            fatal(InvariantViolation::Sealed);
        }
        let (binding_id, binding) = self.bindings.intern(binding);
        let mut globals = self.globals.lock();
        if globals.entries.iter().any(|g| g.key == key) {
            fatal(InvariantViolation::DuplicateGlobal { key });
        }
        let entry = GlobalEntry {
            key,
            binding_id,
            binding,
        };
        let created: Vec<Arc<Segment>> = globals
            .sources
            .iter()
            .flat_map(|&source| self.project(&entry, source).created)
            .collect();
        globals.entries.push(entry);
        drop(globals);
        self.worklist.queue_all(&created);
    }

    fn project(&self, global: &GlobalEntry, source: SourceId) -> BindOutcome {
        let claim = Arc::new(Claim {
            binding: Arc::clone(&global.binding),
            binding_id: global.binding_id,
            precedence: global.binding.precedence(),
            key: global.key,
            source,
            global: true,
            sta: 0,
            end: Span::OPEN_END,
        });
        self.apply(&claim)
    }

    fn apply(&self, claim: &Arc<Claim>) -> BindOutcome {
        let table = self.table(claim.key, claim.source);
        let mut table = table.lock();
        table.bind(claim, &self.segment_ids)
    }

    fn table(&self, key: Key, source: SourceId) -> TableRef {
        if let Some(table) = self.tables.read().get(&(key, source)) {
            return Arc::clone(table);
        }
        let mut tables = self.tables.write();
        Arc::clone(
            tables
                .entry((key, source))
                .or_insert_with(|| Arc::new(Mutex::new(SourceTable::new(key, source)))),
        )
    }

    /// Snapshot of the segments under `(key, source)`, in order.
    pub fn segments(&self, key: Key, source: SourceId) -> Vec<Arc<Segment>> {
        let table = self.tables.read().get(&(key, source)).cloned();
        table.map_or_else(Vec::new, |t| t.lock().segments().to_vec())
    }

    /// Nodes registered under `(key, source)`, in source order.
    pub fn pending(&self, key: Key, source: SourceId) -> Vec<NodeId> {
        let table = self.tables.read().get(&(key, source)).cloned();
        table.map_or_else(Vec::new, |t| {
            t.lock().pending().iter().map(|&(_, n)| n).collect()
        })
    }

    /// Number of distinct bindings registered.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    // Diagnostics

    /// Report a diagnostic. Returns `false` for an exact duplicate.
    pub fn error(&self, diagnostic: Diagnostic) -> bool {
        self.errors.add(diagnostic)
    }

    // Draining

    /// Run queued work until the worklist is empty.
    ///
    /// Scheduling failures are also recorded as diagnostics. Once a drain
    /// fails, later drains return the same error.
    #[tracing::instrument(level = "debug", skip_all, fields(workers = self.config.workers))]
    pub fn drain(&self) -> Result<(), ScheduleError> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let watchdog = Watchdog::new(&self.config);
        if self.config.workers <= 1 {
            self.run_worker(&watchdog);
        } else {
            self.drain_parallel(&watchdog);
        }
        tracing::debug!(steps = watchdog.steps(), "drain finished");
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drain on a scoped rayon pool, one drainer per worker.
    fn drain_parallel(&self, watchdog: &Watchdog) {
        let workers = self.config.workers;
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    rayon::scope(|s| {
                        for _ in 0..workers {
                            s.spawn(|_| self.run_worker(watchdog));
                        }
                    });
                });
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create drain pool ({e}), draining on one thread");
                self.run_worker(watchdog);
            });
    }

    fn run_worker(&self, watchdog: &Watchdog) {
        loop {
            match self.worklist.next(watchdog.deadline()) {
                Next::Ready(ticket) => {
                    if let Err(err) = watchdog.step() {
                        self.worklist.complete(&ticket, Completion::Empty);
                        self.fail(err, &[]);
                        return;
                    }
                    self.run_batch(&ticket);
                    if let Err(err) = watchdog.check_time() {
                        self.fail(err, &[]);
                        return;
                    }
                    if self.config.stop_on_error && self.errors.has_errors() {
                        let errors = self.errors.len();
                        self.fail(ScheduleError::Stopped { errors }, &[]);
                        return;
                    }
                }
                Next::Stalled(parked) => {
                    let err = ScheduleError::Deadlock {
                        parked: parked.len(),
                    };
                    self.fail(err, &parked);
                    return;
                }
                Next::TimedOut => {
                    self.fail(watchdog.expired(), &[]);
                    return;
                }
                Next::Idle | Next::Aborted => return,
            }
        }
    }

    fn run_batch(&self, ticket: &Ticket) {
        let guard = InFlight {
            worklist: &self.worklist,
            ticket,
            finished: false,
        };

        let mut claimed: Vec<(Span, NodeId)> = Vec::new();
        for seg in &ticket.segments {
            let table = self.table(seg.key(), seg.source());
            let taken = table.lock().take(seg, &self.tree);
            claimed.extend(taken.into_iter().map(|n| (self.tree.span(n), n)));
        }
        if claimed.is_empty() {
            guard.finish(Completion::Empty);
            return;
        }
        claimed.sort_unstable();
        let nodes: Vec<NodeId> = claimed.into_iter().map(|(_, n)| n).collect();

        tracing::trace!(
            source = ticket.source.raw(),
            binding = ticket.binding_id.raw(),
            precedence = ticket.precedence.raw(),
            segments = ticket.segments.len(),
            nodes = nodes.len(),
            "dispatch"
        );

        let mut batch = Batch::new(self, ticket.source, ticket.binding_id, nodes);
        ticket.binding.process(&mut batch);
        self.steps.fetch_add(1, Ordering::Relaxed);

        if batch.is_blocked() {
            for node in batch.into_nodes() {
                self.tree.set_done(node, false);
            }
            guard.finish(Completion::Blocked);
        } else {
            guard.finish(Completion::Progress);
        }
    }

    /// Record the first scheduling failure and stop every drainer.
    fn fail(&self, err: ScheduleError, parked: &[Arc<Segment>]) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(err.clone());
            drop(failure);
            tracing::warn!(%err, "drain aborted");
            if let Some(diagnostic) = self.schedule_diagnostic(&err, parked) {
                self.errors.add(diagnostic);
            }
        }
        self.worklist.abort();
    }

    fn schedule_diagnostic(
        &self,
        err: &ScheduleError,
        parked: &[Arc<Segment>],
    ) -> Option<Diagnostic> {
        let code = match err {
            ScheduleError::Deadlock { .. } => ErrorCode::E9001,
            ScheduleError::Timeout { .. } => ErrorCode::E9002,
            ScheduleError::StepLimit { .. } => ErrorCode::E9003,
            ScheduleError::Stopped { .. } => return None,
        };
        let mut diagnostic = Diagnostic::error(code).with_message(err.to_string());
        for seg in parked {
            let len = self.sources.get(seg.source()).map_or(0, |s| s.len());
            let span = Span::new(seg.source(), seg.sta().min(len), seg.end().min(len));
            diagnostic = diagnostic.with_label(
                span,
                format!("{:?} waits here ({} time(s))", seg.claim().binding, seg.waiters()),
            );
        }
        if !parked.is_empty() {
            diagnostic = diagnostic.with_note("every remaining batch is waiting on another");
        }
        Some(diagnostic)
    }

    /// Seal the engine and report nodes no binding ever claimed.
    ///
    /// Returns every collected diagnostic, sorted by span. Binding after
    /// this point is an invariant violation.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish(&self) -> Vec<Diagnostic> {
        self.sealed.store(true, Ordering::Release);

        let roots = self.roots.read().clone();
        let mut unresolved: Vec<NodeId> = Vec::new();
        for root in roots {
            self.tree.walk(root, |id, _| {
                if self.tree.is_registered(id) && !self.tree.is_done(id) {
                    unresolved.push(id);
                }
            });
        }

        let mut kinds: Vec<&'static str> = Vec::new();
        let mut by_kind: FxHashMap<&'static str, Vec<NodeId>> = FxHashMap::default();
        for id in unresolved {
            let kind = self.tree.value(id).kind();
            by_kind
                .entry(kind)
                .or_insert_with(|| {
                    kinds.push(kind);
                    Vec::new()
                })
                .push(id);
        }

        let limit = self.config.unresolved_limit;
        for kind in kinds {
            let nodes = &by_kind[kind];
            let shown = if limit == 0 { nodes.len() } else { nodes.len().min(limit) };
            for (i, &id) in nodes[..shown].iter().enumerate() {
                let mut diagnostic = Diagnostic::error(ErrorCode::E8001)
                    .with_message(format!("unresolved {kind} `{}`", self.text(id)))
                    .with_label(self.tree.span(id), "no binding claimed this node");
                if i + 1 == shown && nodes.len() > shown {
                    diagnostic = diagnostic
                        .with_note(format!("{} more unresolved {kind} node(s)", nodes.len() - shown));
                }
                self.errors.add(diagnostic);
            }
        }

        tracing::debug!(
            errors = self.errors.len(),
            dropped = self.errors.dropped(),
            "finished"
        );
        self.errors.flush()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sources", &self.sources.len())
            .field("nodes", &self.tree.len())
            .field("bindings", &self.bindings.len())
            .field("queued", &self.worklist.len())
            .field("sealed", &self.is_sealed())
            .finish_non_exhaustive()
    }
}

/// Completes a dispatched batch, or aborts the worklist if the binding
/// panicked so other drainers stop waiting on it.
struct InFlight<'a> {
    worklist: &'a Worklist,
    ticket: &'a Ticket,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, completion: Completion) {
        self.finished = true;
        self.worklist.complete(self.ticket, completion);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.worklist.abort();
        }
    }
}
