//! Node arena and mutable tree.
//!
//! Every node created during a compilation lives in one arena and is never
//! freed; "deletion" is detachment. Nodes link to their parent and their
//! index within it, so sibling lookups and range splices cost only the
//! affected nodes.
//!
//! All operations lock the arena briefly. Composite edits (`replace`,
//! `splice`) run under a single write lock, so readers never see a node
//! half-moved.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use weft_ir::Span;

use crate::error::{fatal, InvariantViolation};
use crate::value::Value;

/// Stable index of a node in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct NodeData {
    value: Arc<dyn Value>,
    span: Span,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    index: u32,
    /// Claimed by a batch or explicitly finished.
    done: AtomicBool,
    /// Registered under at least one key.
    registered: AtomicBool,
}

/// Arena-backed node tree.
#[derive(Default)]
pub struct Tree {
    nodes: RwLock<Vec<NodeData>>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` nodes.
    pub fn alloc(&self, value: Arc<dyn Value>, span: Span) -> NodeId {
        let mut nodes = self.nodes.write();
        let raw = u32::try_from(nodes.len())
            .unwrap_or_else(|_| panic!("node arena exceeded {} nodes", u32::MAX));
        nodes.push(NodeData {
            value,
            span,
            children: Vec::new(),
            parent: None,
            index: 0,
            done: AtomicBool::new(false),
            registered: AtomicBool::new(false),
        });
        NodeId(raw)
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn value(&self, id: NodeId) -> Arc<dyn Value> {
        Arc::clone(&self.nodes.read()[id.index()].value)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes.read()[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.read()[id.index()].parent
    }

    /// Position under the parent, or `None` if detached.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let nodes = self.nodes.read();
        let node = &nodes[id.index()];
        node.parent.map(|_| node.index as usize)
    }

    #[inline]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.parent(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes.read()[id.index()].children.clone()
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes.read()[id.index()].children.len()
    }

    pub fn child(&self, id: NodeId, at: usize) -> Option<NodeId> {
        self.nodes.read()[id.index()].children.get(at).copied()
    }

    /// Next sibling.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let nodes = self.nodes.read();
        let node = &nodes[id.index()];
        let parent = node.parent?;
        nodes[parent.index()]
            .children
            .get(node.index as usize + 1)
            .copied()
    }

    /// Previous sibling.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let nodes = self.nodes.read();
        let node = &nodes[id.index()];
        let parent = node.parent?;
        let at = (node.index as usize).checked_sub(1)?;
        nodes[parent.index()].children.get(at).copied()
    }

    /// Siblings after `id`, in order.
    pub fn following(&self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        let node = &nodes[id.index()];
        match node.parent {
            Some(parent) => nodes[parent.index()].children[node.index as usize + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        let mut out = Vec::new();
        let mut cur = nodes[id.index()].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = nodes[p.index()].parent;
        }
        out
    }

    /// Merged span of the first and last node, or `None` for an empty slice.
    pub fn span_of(&self, ids: &[NodeId]) -> Option<Span> {
        let (first, last) = (ids.first()?, ids.last()?);
        let nodes = self.nodes.read();
        Some(nodes[first.index()].span.merge(nodes[last.index()].span))
    }

    /// Splice detached nodes into `parent` at position `at`.
    ///
    /// The parent's span end grows to cover inserted nodes of the same
    /// source.
    pub fn insert_nodes(&self, parent: NodeId, at: usize, ids: &[NodeId]) {
        let mut nodes = self.nodes.write();
        splice(&mut nodes, parent, at, at, ids);
    }

    /// Detach and return the children `sta..end` of `parent`.
    pub fn remove_nodes(&self, parent: NodeId, sta: usize, end: usize) -> Vec<NodeId> {
        let mut nodes = self.nodes.write();
        splice(&mut nodes, parent, sta, end, &[])
    }

    /// Replace children `sta..end` of `parent` with `ids`, returning the
    /// detached range.
    pub fn splice(&self, parent: NodeId, sta: usize, end: usize, ids: &[NodeId]) -> Vec<NodeId> {
        let mut nodes = self.nodes.write();
        splice(&mut nodes, parent, sta, end, ids)
    }

    /// Detach a node from its parent. Returns `false` if it was detached.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut nodes = self.nodes.write();
        let node = &nodes[id.index()];
        let Some(parent) = node.parent else {
            return false;
        };
        let at = node.index as usize;
        splice(&mut nodes, parent, at, at + 1, &[]);
        true
    }

    /// Put `ids` where `id` was and detach `id`.
    ///
    /// Returns `false` and leaves everything untouched if `id` is detached.
    pub fn replace(&self, id: NodeId, ids: &[NodeId]) -> bool {
        let mut nodes = self.nodes.write();
        let node = &nodes[id.index()];
        let Some(parent) = node.parent else {
            return false;
        };
        let at = node.index as usize;
        splice(&mut nodes, parent, at, at + 1, ids);
        true
    }

    #[inline]
    pub fn is_done(&self, id: NodeId) -> bool {
        self.nodes.read()[id.index()].done.load(Ordering::Acquire)
    }

    /// Set the done flag, returning the previous state.
    pub fn set_done(&self, id: NodeId, done: bool) -> bool {
        self.nodes.read()[id.index()]
            .done
            .swap(done, Ordering::AcqRel)
    }

    /// Claim a pending node. Returns `false` if it was already done.
    pub fn try_claim(&self, id: NodeId) -> bool {
        self.nodes.read()[id.index()]
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn mark_registered(&self, id: NodeId) {
        self.nodes.read()[id.index()]
            .registered
            .store(true, Ordering::Release);
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.nodes.read()[id.index()]
            .registered
            .load(Ordering::Acquire)
    }

    /// Pre-order walk of the subtree under `root`, including `root`.
    pub fn walk(&self, root: NodeId, mut visit: impl FnMut(NodeId, usize)) {
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            visit(id, depth);
            let children = self.children(id);
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("nodes", &self.len()).finish()
    }
}

/// Replace `parent.children[sta..end]` with `ids`.
fn splice(
    nodes: &mut [NodeData],
    parent: NodeId,
    sta: usize,
    end: usize,
    ids: &[NodeId],
) -> Vec<NodeId> {
    let len = nodes[parent.index()].children.len();
    if sta > end || end > len {
        fatal(InvariantViolation::SpliceOutOfRange {
            parent: parent.raw(),
            sta,
            end,
            len,
        });
    }

    let removed: Vec<NodeId> = nodes[parent.index()].children.drain(sta..end).collect();
    for &id in &removed {
        let node = &mut nodes[id.index()];
        node.parent = None;
        node.index = 0;
    }

    for &id in ids {
        if let Some(owner) = nodes[id.index()].parent {
            fatal(InvariantViolation::AlreadyAttached {
                node: id.raw(),
                parent: owner.raw(),
            });
        }
        let mut cur = Some(parent);
        while let Some(p) = cur {
            if p == id {
                fatal(InvariantViolation::Cycle { node: id.raw() });
            }
            cur = nodes[p.index()].parent;
        }
        // Mark now so a duplicate in `ids` is caught as attached
        nodes[id.index()].parent = Some(parent);
    }

    let parent_span = nodes[parent.index()].span;
    let grown = ids
        .iter()
        .map(|id| nodes[id.index()].span)
        .filter(|s| s.source == parent_span.source)
        .fold(parent_span, |acc, s| acc.extend_to(s.end));
    let parent_node = &mut nodes[parent.index()];
    parent_node.span = grown;
    parent_node.children.splice(sta..sta, ids.iter().copied());

    let count = nodes[parent.index()].children.len();
    for i in sta..count {
        let child = nodes[parent.index()].children[i];
        nodes[child.index()].index = u32::try_from(i).unwrap_or(u32::MAX);
    }
    removed
}
