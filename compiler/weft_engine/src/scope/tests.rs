use pretty_assertions::assert_eq;
use weft_ir::SourceId;

use super::*;

const SRC: SourceId = SourceId::new(0);

fn name(raw: u32) -> (Name, &'static str) {
    (Name::from_raw(raw), "x")
}

#[test]
fn test_scope_for_is_stable() {
    let scopes = Scopes::new();
    let a = scopes.scope_for(NodeId::from_raw(4));
    let b = scopes.scope_for(NodeId::from_raw(9));
    assert_ne!(a, b);
    assert_eq!(scopes.scope_for(NodeId::from_raw(4)), a);
    assert_eq!(scopes.node(b), NodeId::from_raw(9));
    assert_eq!(scopes.len(), 2);
}

#[test]
fn test_lookup_picks_nearest_preceding_declaration() {
    let scopes = Scopes::new();
    let scope = scopes.scope_for(NodeId::from_raw(0));
    let span = Span::new(SRC, 0, 100);
    scopes.declare(scope, span, name(1), 10, NodeId::from_raw(1));
    scopes.declare(scope, span, name(1), 40, NodeId::from_raw(2));
    scopes.declare(scope, span, name(2), 20, NodeId::from_raw(3));

    assert_eq!(scopes.lookup(scope, Name::from_raw(1), 5), None);
    let at_30 = scopes.lookup(scope, Name::from_raw(1), 30);
    assert_eq!(at_30.map(|v| v.decl), Some(NodeId::from_raw(1)));
    let at_40 = scopes.lookup(scope, Name::from_raw(1), 40);
    assert_eq!(at_40.map(|v| v.decl), Some(NodeId::from_raw(2)));
    assert_eq!(scopes.variables(scope).len(), 3);
}

#[test]
#[should_panic(expected = "declared twice")]
fn test_duplicate_declaration_panics() {
    let scopes = Scopes::new();
    let scope = scopes.scope_for(NodeId::from_raw(0));
    let span = Span::new(SRC, 0, 10);
    scopes.declare(scope, span, name(1), 3, NodeId::from_raw(1));
    scopes.declare(scope, span, name(1), 3, NodeId::from_raw(2));
}

#[test]
#[should_panic(expected = "outside scope")]
fn test_declaration_outside_scope_panics() {
    let scopes = Scopes::new();
    let scope = scopes.scope_for(NodeId::from_raw(0));
    scopes.declare(scope, Span::new(SRC, 10, 20), name(1), 25, NodeId::from_raw(1));
}
