use pretty_assertions::assert_eq;
use weft_diagnostic::ErrorCode;
use weft_ir::{SourceId, Span};

use super::lex;
use crate::value::TokenKind::{self, Integer, LineBreak, Str, Symbol, Word};

const SRC: SourceId = SourceId::new(0);

fn kinds(text: &str) -> Vec<(TokenKind, &str)> {
    let lexed = lex(SRC, text);
    assert!(lexed.errors.is_empty(), "{:?}", lexed.errors);
    lexed
        .tokens
        .iter()
        .map(|&(kind, span)| (kind, &text[span.to_range()]))
        .collect()
}

#[test]
fn test_statement() {
    assert_eq!(
        kinds("let x_1 = 42\n"),
        vec![
            (Word, "let"),
            (Word, "x_1"),
            (Symbol, "="),
            (Integer, "42"),
            (LineBreak, "\n"),
        ]
    );
}

#[test]
fn test_line_break_forms() {
    assert_eq!(
        kinds("a\r\nb\rc\n"),
        vec![
            (Word, "a"),
            (LineBreak, "\r\n"),
            (Word, "b"),
            (LineBreak, "\r"),
            (Word, "c"),
            (LineBreak, "\n"),
        ]
    );
}

#[test]
fn test_longest_symbol_wins() {
    assert_eq!(
        kinds("a==b=c->d"),
        vec![
            (Word, "a"),
            (Symbol, "=="),
            (Word, "b"),
            (Symbol, "="),
            (Word, "c"),
            (Symbol, "->"),
            (Word, "d"),
        ]
    );
}

#[test]
fn test_comment_runs_to_line_end() {
    assert_eq!(
        kinds("print 1 # note ( \nx"),
        vec![
            (Word, "print"),
            (Integer, "1"),
            (LineBreak, "\n"),
            (Word, "x"),
        ]
    );
}

#[test]
fn test_string_with_escapes() {
    assert_eq!(
        kinds(r#"print "a \"b\" \\" 7"#),
        vec![(Word, "print"), (Str, r#""a \"b\" \\""#), (Integer, "7")]
    );
}

#[test]
fn test_unterminated_string_stops_at_line_end() {
    let lexed = lex(SRC, "print \"abc\r\nx");
    assert_eq!(lexed.errors.len(), 1);
    assert_eq!(lexed.errors[0].code, ErrorCode::E1003);
    assert_eq!(lexed.errors[0].primary_span(), Some(Span::new(SRC, 6, 10)));
    let kinds: Vec<_> = lexed.tokens.iter().map(|&(k, _)| k).collect();
    assert_eq!(kinds, vec![Word, LineBreak, Word]);
}

#[test]
fn test_unterminated_string_stops_at_lone_carriage_return() {
    let lexed = lex(SRC, "print \"abc\rprint 4");
    assert_eq!(lexed.errors.len(), 1);
    assert_eq!(lexed.errors[0].code, ErrorCode::E1003);
    assert_eq!(lexed.errors[0].primary_span(), Some(Span::new(SRC, 6, 10)));
    let kinds: Vec<_> = lexed.tokens.iter().map(|&(k, _)| k).collect();
    assert_eq!(kinds, vec![Word, LineBreak, Word, Integer]);
}

#[test]
fn test_escaped_line_break_ends_string() {
    let lexed = lex(SRC, "\"a\\\nb");
    assert_eq!(lexed.errors.len(), 1);
    assert_eq!(lexed.errors[0].primary_span(), Some(Span::new(SRC, 0, 3)));
    let kinds: Vec<_> = lexed.tokens.iter().map(|&(k, _)| k).collect();
    assert_eq!(kinds, vec![LineBreak, Word]);
}

#[test]
fn test_invalid_character_is_skipped() {
    let lexed = lex(SRC, "a é b");
    assert_eq!(lexed.errors.len(), 1);
    assert_eq!(lexed.errors[0].code, ErrorCode::E1001);
    assert_eq!(lexed.errors[0].primary_span(), Some(Span::new(SRC, 2, 4)));
    assert_eq!(lexed.tokens.len(), 2);
}

#[test]
fn test_empty_input() {
    let lexed = lex(SRC, "");
    assert!(lexed.tokens.is_empty());
    assert!(lexed.errors.is_empty());
}
