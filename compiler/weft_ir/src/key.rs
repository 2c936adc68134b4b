//! Binding keys and precedence levels.

use std::fmt;

use crate::Name;

/// Tag indexing which bindings apply to a node.
///
/// A node registers under one or more keys derived from its value; every
/// (Key, Source) pair owns its own segment table in the engine.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Key {
    /// Token or node kind, e.g. `LineBreak`.
    Kind(Name),
    /// Literal word text, e.g. `if`.
    Word(Name),
    /// Literal symbol text, e.g. `:`.
    Symbol(Name),
    /// Synthetic marker introduced by an earlier rewrite.
    Marker(Name),
}

impl Key {
    /// The interned text carried by the key.
    #[inline]
    pub const fn name(self) -> Name {
        match self {
            Key::Kind(n) | Key::Word(n) | Key::Symbol(n) | Key::Marker(n) => n,
        }
    }

    /// Short tag used in dumps.
    pub const fn tag(self) -> &'static str {
        match self {
            Key::Kind(_) => "kind",
            Key::Word(_) => "word",
            Key::Symbol(_) => "symbol",
            Key::Marker(_) => "marker",
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag(), self.name().raw())
    }
}

/// Ordering level of a binding. Lower values are processed first.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Precedence(pub u32);

impl Precedence {
    /// Bracket matching, before anything looks inside a group.
    pub const GROUPING: Precedence = Precedence(50);
    /// Structural passes such as line splitting.
    pub const STRUCTURE: Precedence = Precedence(100);
    /// Control flow forms.
    pub const CONTROL: Precedence = Precedence(200);
    /// Statements that introduce names.
    pub const DECLARATION: Precedence = Precedence(300);
    /// Name resolution against declared variables.
    pub const RESOLVE: Precedence = Precedence(400);
    /// Calls and expression statements.
    pub const EXPRESSION: Precedence = Precedence(500);
    /// Literal values, which need nothing else resolved.
    pub const LITERAL: Precedence = Precedence(600);
    /// Catch-all bindings that report whatever is left.
    pub const FALLBACK: Precedence = Precedence(900);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering_groups_by_variant() {
        let a = Key::Word(Name::from_raw(9));
        let b = Key::Symbol(Name::from_raw(1));
        assert!(a < b);
        assert_eq!(a.name(), Name::from_raw(9));
    }

    #[test]
    fn test_precedence_levels_ascend() {
        assert!(Precedence::GROUPING < Precedence::STRUCTURE);
        assert!(Precedence::CONTROL < Precedence::DECLARATION);
        assert!(Precedence::RESOLVE < Precedence::LITERAL);
        assert!(Precedence::LITERAL < Precedence::FALLBACK);
        assert_eq!(Precedence(5).to_string(), "5");
    }
}
