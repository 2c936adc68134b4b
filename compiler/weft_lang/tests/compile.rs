//! End-to-end compilation of small programs.

use pretty_assertions::assert_eq;
use weft_diagnostic::ErrorCode;
use weft_engine::{EngineConfig, NodeId};
use weft_lang::{compile, Compilation, Let, VarRef};

fn run(text: &str) -> Compilation {
    compile(EngineConfig::unbounded(), &[("main.wf", text)])
}

fn assert_clean(c: &Compilation) {
    assert_eq!(c.outcome, Ok(()));
    assert!(c.diagnostics.is_empty(), "{:#?}", c.diagnostics);
}

/// `Let` nodes and `VarRef` declarations of source 0, in tree order.
fn lets_and_refs(c: &Compilation) -> (Vec<NodeId>, Vec<NodeId>) {
    let engine = &c.engine;
    let (mut lets, mut refs) = (Vec::new(), Vec::new());
    engine.tree().walk(engine.root(c.sources[0]), |node, _| {
        let value = engine.value(node);
        if value.is::<Let>() {
            lets.push(node);
        } else if let Some(var) = value.downcast_ref::<VarRef>() {
            refs.push(var.decl);
        }
    });
    (lets, refs)
}

#[test]
fn test_let_and_print() {
    let c = run("let x = 1\nprint x\n");
    assert_clean(&c);
    assert_eq!(
        c.render(0),
        "\
source
  line
    let x
      int 1
  line
    print
      var x
"
    );
}

#[test]
fn test_block_shadows_outer_variable() {
    let c = run("let x = 1\n{\n  let x = 2\n  print x\n}\nprint x\n");
    assert_clean(&c);
    assert_eq!(
        c.render(0),
        "\
source
  line
    let x
      int 1
  line
    block
      line
        let x
          int 2
      line
        print
          var x
  line
    print
      var x
"
    );
    let (lets, refs) = lets_and_refs(&c);
    assert_eq!(refs, vec![lets[1], lets[0]]);
}

#[test]
fn test_variable_visible_after_its_statement() {
    let c = run("let x = 1\nlet x = x\nprint x\n");
    assert_clean(&c);
    let (lets, refs) = lets_and_refs(&c);
    assert_eq!(refs, vec![lets[0], lets[1]]);
}

#[test]
fn test_if_statement() {
    let c = run("let ok = 1\nif ok: print \"yes\"\n");
    assert_clean(&c);
    assert_eq!(
        c.render(0),
        "\
source
  line
    let ok
      int 1
  line
    if
      cond
        var ok
      body
        print
          str \"yes\"
"
    );
}

#[test]
fn test_groups_without_line_breaks() {
    let c = run("print (1) (\"a\\tb\")");
    assert_clean(&c);
    assert_eq!(
        c.render(0),
        "\
source
  print
    group
      int 1
    group
      str \"a\\tb\"
"
    );
}

#[test]
fn test_use_before_declaration_is_unknown() {
    let c = run("print x\nlet x = 1\n");
    assert_eq!(c.codes(), vec![ErrorCode::E2001]);
    assert_eq!(c.diagnostics[0].message, "unknown identifier `x`");
    assert_eq!(c.diagnostics[0].primary_span().map(|s| s.start), Some(6));
}

#[test]
fn test_syntax_errors() {
    let cases: &[(&str, &[ErrorCode])] = &[
        ("if x print 1\n", &[ErrorCode::E1001, ErrorCode::E2001]),
        ("print (1\n", &[ErrorCode::E1003]),
        ("print 1)\n", &[ErrorCode::E1001]),
        ("print (1}\n", &[ErrorCode::E1001]),
        ("let = 1\n", &[ErrorCode::E1004, ErrorCode::E8001]),
        ("let x 1\n", &[ErrorCode::E1001, ErrorCode::E2001]),
        ("print\n", &[ErrorCode::E1002]),
        ("print 99999999999999999999\n", &[ErrorCode::E1005]),
        ("print \"\\q\"\n", &[ErrorCode::E1005]),
        ("print 1 @\n", &[ErrorCode::E1001]),
        ("print \"open\n", &[ErrorCode::E1002, ErrorCode::E1003]),
    ];
    for &(text, codes) in cases {
        let c = run(text);
        assert_eq!(c.outcome, Ok(()), "{text:?}");
        assert_eq!(c.codes(), codes.to_vec(), "{text:?}: {:#?}", c.diagnostics);
    }
}

#[test]
fn test_unclaimed_symbol_is_unresolved() {
    let c = run("print 1 + 2\n");
    assert_eq!(c.codes(), vec![ErrorCode::E8001]);
    assert_eq!(c.diagnostics[0].message, "unresolved symbol `+`");
    assert!(c.has_errors());
}

#[test]
fn test_sources_compile_independently_in_parallel() {
    let text = "let x = 1\n{\n  let y = x\n  print y\n}\nprint x\n";
    let names: Vec<String> = (0..6).map(|i| format!("s{i}.wf")).collect();
    let sources: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), text)).collect();

    let c = compile(EngineConfig::unbounded().with_workers(4), &sources);
    assert_clean(&c);
    let first = c.render(0);
    assert!(first.contains("var y"), "{first}");
    for n in 1..sources.len() {
        assert_eq!(c.render(n), first);
    }
}

#[test]
fn test_dump_shows_language_tables() {
    let c = run("let x = 1\nprint x\n");
    let dump = c.engine.dump();
    assert!(dump.contains("word \"x\" @ main.wf"), "{dump}");
    assert!(dump.contains("ResolveVar"), "{dump}");
    assert!(dump.contains("ParseLet GLOBAL"), "{dump}");
}
