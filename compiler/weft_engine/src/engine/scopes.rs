//! Scope queries on the engine's tree.

use weft_ir::{Name, Span};

use super::Engine;
use crate::scope::{ScopeId, Variable};
use crate::tree::NodeId;

impl Engine {
    /// Scope owned by `node`, if its value opens one.
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.tree
            .value(node)
            .opens_scope()
            .then(|| self.scopes.scope_for(node))
    }

    /// Nearest scope at or above `node`.
    pub fn enclosing_scope(&self, node: NodeId) -> Option<ScopeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find_map(|n| self.scope_of(n))
    }

    /// Current range of a scope: its node's span.
    pub fn scope_span(&self, scope: ScopeId) -> Span {
        self.tree.span(self.scopes.node(scope))
    }

    /// Declare `name` in `scope`, visible from `offset` to the scope's end.
    ///
    /// # Panics
    /// Panics on a duplicate `(name, offset)` or an offset outside the scope.
    pub fn declare(&self, scope: ScopeId, name: Name, offset: u32, decl: NodeId) -> Variable {
        let span = self.scope_span(scope);
        let text = self.interner.lookup(name);
        self.scopes.declare(scope, span, (name, text), offset, decl)
    }

    /// Resolve `name` as seen from `node`.
    ///
    /// Walks enclosing scopes outward and returns the nearest declaration
    /// at or before the node's start.
    pub fn resolve(&self, node: NodeId, name: Name) -> Option<Variable> {
        let offset = self.tree.span(node).start;
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .filter_map(|n| self.scope_of(n))
            .find_map(|scope| self.scopes.lookup(scope, name, offset))
    }
}
