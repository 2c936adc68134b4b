//! Byte-dispatch lexer.
//!
//! Produces one [`Token`](crate::Token) span per word, integer, string,
//! symbol, or line break. Spaces, tabs and `#` comments are skipped. Lexical
//! errors become diagnostics and scanning continues after the bad input.

use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_ir::{SourceId, Span};

use crate::value::TokenKind;

/// Symbols, longest first so `==` wins over `=`.
const SYMBOLS: &[&str] = &[
    "==", "!=", "<=", ">=", "->", "(", ")", "{", "}", "[", "]", ":", "=", "+", "-", "*", "/",
    "<", ">", ",", ";", ".", "!",
];

/// Output of [`lex`].
#[derive(Clone, Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<(TokenKind, Span)>,
    pub errors: Vec<Diagnostic>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Tag {
    Token(TokenKind),
    Whitespace,
    Comment,
    Invalid,
    UnterminatedStr,
}

#[derive(Copy, Clone, Debug)]
struct RawToken {
    tag: Tag,
    start: usize,
    end: usize,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.current().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<RawToken> {
        let start = self.pos;
        let tag = match self.current()? {
            b' ' | b'\t' => {
                self.eat_while(|b| b == b' ' || b == b'\t');
                Tag::Whitespace
            }
            b'\r' => {
                self.pos += 1;
                if self.current() == Some(b'\n') {
                    self.pos += 1;
                }
                Tag::Token(TokenKind::LineBreak)
            }
            b'\n' => {
                self.pos += 1;
                Tag::Token(TokenKind::LineBreak)
            }
            b'#' => {
                let rest = &self.bytes[self.pos..];
                self.pos += memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
                Tag::Comment
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                Tag::Token(TokenKind::Word)
            }
            b'0'..=b'9' => {
                self.eat_while(|b| b.is_ascii_digit());
                Tag::Token(TokenKind::Integer)
            }
            b'"' => self.string(),
            _ => self.symbol_or_invalid(),
        };
        Some(RawToken {
            tag,
            start,
            end: self.pos,
        })
    }

    /// String literal. Stops before a line break if unterminated.
    fn string(&mut self) -> Tag {
        self.pos += 1;
        let line_end = memchr::memchr2(b'\n', b'\r', &self.bytes[self.pos..])
            .map_or(self.bytes.len(), |i| self.pos + i);
        loop {
            let line = &self.bytes[self.pos..line_end];
            let Some(i) = memchr::memchr2(b'"', b'\\', line) else {
                self.pos = line_end;
                return Tag::UnterminatedStr;
            };
            if line[i] == b'"' {
                self.pos += i + 1;
                return Tag::Token(TokenKind::Str);
            }
            // An escaped line break still ends the literal
            self.pos = (self.pos + i + 2).min(line_end);
        }
    }

    fn symbol_or_invalid(&mut self) -> Tag {
        let rest = &self.bytes[self.pos..];
        if let Some(sym) = SYMBOLS.iter().find(|s| rest.starts_with(s.as_bytes())) {
            self.pos += sym.len();
            return Tag::Token(TokenKind::Symbol);
        }
        let width = self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.pos += width;
        Tag::Invalid
    }
}

/// Tokenize `text` as source `source`.
pub fn lex(source: SourceId, text: &str) -> Lexed {
    let mut scanner = Scanner::new(text);
    let mut out = Lexed::default();
    while let Some(raw) = scanner.next_token() {
        let span = Span::from_range(source, raw.start..raw.end);
        match raw.tag {
            Tag::Token(kind) => out.tokens.push((kind, span)),
            Tag::Whitespace | Tag::Comment => {}
            Tag::Invalid => out.errors.push(
                Diagnostic::error(ErrorCode::E1001)
                    .with_message(format!("invalid character `{}`", &text[raw.start..raw.end]))
                    .with_label(span, "not valid here"),
            ),
            Tag::UnterminatedStr => out.errors.push(
                Diagnostic::error(ErrorCode::E1003)
                    .with_message("unterminated string literal")
                    .with_label(span, "missing closing `\"`"),
            ),
        }
    }
    out
}

#[cfg(test)]
mod tests;
