//! Binding protocol.
//!
//! A binding is an immutable rule registered against a [`Key`] over a range
//! of a source. When its segments are dequeued the engine hands it a
//! [`Batch`] holding the pending nodes those segments claim.
//!
//! [`Key`]: weft_ir::Key

use std::any::TypeId;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use weft_ir::{Precedence, SourceId};

use crate::tree::NodeId;
use crate::value::AsAny;
use crate::Engine;

/// A rewriting rule.
pub trait Binding: AsAny + Send + Sync + fmt::Debug + 'static {
    /// Lower precedence runs first.
    fn precedence(&self) -> Precedence;

    /// Whether `other` is the same rule. Segments of the same rule in one
    /// source are processed together.
    fn is_same(&self, other: &dyn Binding) -> bool;

    /// Rewrite the batch's nodes.
    ///
    /// Every node in the batch is already marked done. To hand a node back,
    /// call [`Batch::undo`]; to retry later, call [`Batch::block`] before
    /// mutating anything.
    fn process(&self, batch: &mut Batch<'_>);
}

/// `is_same` for bindings that compare by value.
pub fn same_as<T: Binding + PartialEq>(this: &T, other: &dyn Binding) -> bool {
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| other == this)
}

/// Identity of a binding within one engine.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct BindingId(u32);

impl BindingId {
    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        BindingId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Default)]
struct RegistryInner {
    all: Vec<Arc<dyn Binding>>,
    by_type: FxHashMap<TypeId, SmallVec<[BindingId; 4]>>,
}

/// Maps bindings to stable ids using `is_same`.
#[derive(Default)]
pub(crate) struct BindingRegistry {
    inner: RwLock<RegistryInner>,
}

impl BindingRegistry {
    /// Id of the binding, registering it if no same binding exists.
    ///
    /// Returns the first registered instance alongside the id.
    pub(crate) fn intern(&self, binding: Arc<dyn Binding>) -> (BindingId, Arc<dyn Binding>) {
        let type_id = {
            let rule: &dyn Binding = &*binding;
            rule.as_any().type_id()
        };
        if let Some(found) = Self::find(&self.inner.read(), type_id, &*binding) {
            return found;
        }

        let mut inner = self.inner.write();
        if let Some(found) = Self::find(&inner, type_id, &*binding) {
            return found;
        }
        let raw = u32::try_from(inner.all.len())
            .unwrap_or_else(|_| panic!("binding registry exceeded {} entries", u32::MAX));
        let id = BindingId::from_raw(raw);
        inner.all.push(Arc::clone(&binding));
        inner.by_type.entry(type_id).or_default().push(id);
        (id, binding)
    }

    fn find(
        inner: &RegistryInner,
        type_id: TypeId,
        binding: &dyn Binding,
    ) -> Option<(BindingId, Arc<dyn Binding>)> {
        inner.by_type.get(&type_id)?.iter().find_map(|&id| {
            let known = &inner.all[id.0 as usize];
            known
                .is_same(binding)
                .then(|| (id, Arc::clone(known)))
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().all.len()
    }
}

/// Nodes handed to one binding invocation.
///
/// Derefs to the [`Engine`], so rules call `batch.bind(..)`,
/// `batch.tree()` and friends directly.
pub struct Batch<'e> {
    engine: &'e Engine,
    source: SourceId,
    binding: BindingId,
    nodes: Vec<NodeId>,
    blocked: bool,
}

impl<'e> Batch<'e> {
    pub(crate) fn new(
        engine: &'e Engine,
        source: SourceId,
        binding: BindingId,
        nodes: Vec<NodeId>,
    ) -> Self {
        Batch {
            engine,
            source,
            binding,
            nodes,
            blocked: false,
        }
    }

    /// Claimed nodes, in source order.
    #[inline]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[inline]
    pub fn source(&self) -> SourceId {
        self.source
    }

    #[inline]
    pub fn binding_id(&self) -> BindingId {
        self.binding
    }

    #[inline]
    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Give a claimed node back to the pending pool.
    ///
    /// The node is not re-queued; it is reconsidered when new work arrives
    /// for a segment covering it.
    pub fn undo(&self, node: NodeId) {
        self.engine.tree().set_done(node, false);
    }

    /// Declare that this batch needs another segment's output first.
    ///
    /// The claimed nodes are released and the segments parked until some
    /// other batch makes progress.
    pub fn block(&mut self) {
        self.blocked = true;
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub(crate) fn into_nodes(self) -> Vec<NodeId> {
        self.nodes
    }
}

impl Deref for Batch<'_> {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        self.engine
    }
}

impl fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("source", &self.source)
            .field("binding", &self.binding)
            .field("nodes", &self.nodes)
            .field("blocked", &self.blocked)
            .finish()
    }
}
