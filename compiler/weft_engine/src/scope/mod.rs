//! Span-bounded scopes and variables.
//!
//! A scope belongs to a node whose value opens one and covers that node's
//! current span. A variable is visible from its declaration offset to the
//! end of its scope. Scopes are created on first use.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use weft_ir::{Name, Span};

use crate::error::{fatal, InvariantViolation};
use crate::tree::NodeId;

/// Index of a scope.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A declared name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    pub scope: ScopeId,
    pub name: Name,
    /// First offset the variable is visible from.
    pub offset: u32,
    /// Node that declared it.
    pub decl: NodeId,
}

struct Scope {
    node: NodeId,
    vars: Mutex<Vec<Variable>>,
}

/// All scopes of one engine.
#[derive(Default)]
pub struct Scopes {
    by_node: RwLock<FxHashMap<NodeId, ScopeId>>,
    scopes: RwLock<Vec<Arc<Scope>>>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope owned by `node`, created on first use.
    pub(crate) fn scope_for(&self, node: NodeId) -> ScopeId {
        if let Some(&id) = self.by_node.read().get(&node) {
            return id;
        }
        let mut by_node = self.by_node.write();
        if let Some(&id) = by_node.get(&node) {
            return id;
        }
        let mut scopes = self.scopes.write();
        let raw = u32::try_from(scopes.len())
            .unwrap_or_else(|_| panic!("scope table exceeded {} scopes", u32::MAX));
        scopes.push(Arc::new(Scope {
            node,
            vars: Mutex::new(Vec::new()),
        }));
        let id = ScopeId(raw);
        by_node.insert(node, id);
        id
    }

    fn get(&self, scope: ScopeId) -> Arc<Scope> {
        Arc::clone(&self.scopes.read()[scope.0 as usize])
    }

    /// Node owning the scope.
    pub fn node(&self, scope: ScopeId) -> NodeId {
        self.scopes.read()[scope.0 as usize].node
    }

    /// Number of scopes created so far.
    pub fn len(&self) -> usize {
        self.scopes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a variable. `span` is the scope's current range and `text`
    /// the variable's name, used for the panic message.
    pub(crate) fn declare(
        &self,
        scope: ScopeId,
        span: Span,
        var: (Name, &str),
        offset: u32,
        decl: NodeId,
    ) -> Variable {
        let (name, text) = var;
        if offset < span.start || offset > span.end {
            fatal(InvariantViolation::OutsideScope {
                name: text.to_owned(),
                offset,
                span,
            });
        }
        let entry = self.get(scope);
        let mut vars = entry.vars.lock();
        if vars.iter().any(|v| v.name == name && v.offset == offset) {
            fatal(InvariantViolation::DuplicateVariable {
                name: text.to_owned(),
                offset,
            });
        }
        let var = Variable {
            scope,
            name,
            offset,
            decl,
        };
        vars.push(var.clone());
        var
    }

    /// Latest declaration of `name` in `scope` visible at `offset`.
    pub(crate) fn lookup(&self, scope: ScopeId, name: Name, offset: u32) -> Option<Variable> {
        let entry = self.get(scope);
        let vars = entry.vars.lock();
        vars.iter()
            .filter(|v| v.name == name && v.offset <= offset)
            .max_by_key(|v| v.offset)
            .cloned()
    }

    /// Variables declared in a scope, in declaration order.
    pub fn variables(&self, scope: ScopeId) -> Vec<Variable> {
        self.get(scope).vars.lock().clone()
    }
}

#[cfg(test)]
mod tests;
