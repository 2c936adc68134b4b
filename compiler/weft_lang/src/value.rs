//! Node values produced by the lexer and the bindings.

use std::fmt;

use weft_engine::{Keys, NodeId, Value};
use weft_ir::{Key, Name, StringInterner};

/// Lexical class of a token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    Word,
    Integer,
    Str,
    Symbol,
    LineBreak,
}

impl TokenKind {
    /// Name used for the token's `Kind` key.
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::Word => "word",
            TokenKind::Integer => "integer",
            TokenKind::Str => "string",
            TokenKind::Symbol => "symbol",
            TokenKind::LineBreak => "line-break",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw token straight from the lexer.
///
/// Registers under `Kind(kind)`, plus `Word(text)` or `Symbol(text)` for
/// words and symbols.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
}

impl Value for Token {
    fn kind(&self) -> &'static str {
        self.kind.name()
    }

    fn keys(&self, text: &str, interner: &StringInterner) -> Keys {
        let mut keys = Keys::new();
        keys.push(Key::Kind(interner.intern(self.kind.name())));
        match self.kind {
            TokenKind::Word => keys.push(Key::Word(interner.intern(text))),
            TokenKind::Symbol => keys.push(Key::Symbol(interner.intern(text))),
            TokenKind::Integer | TokenKind::Str | TokenKind::LineBreak => {}
        }
        keys
    }

    fn describe(&self, text: &str, _interner: &StringInterner) -> String {
        format!("{} {text:?}", self.kind)
    }
}

macro_rules! structural {
    ($($(#[$meta:meta])* $name:ident => $kind:literal, scope: $scope:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
            pub struct $name;

            impl Value for $name {
                fn kind(&self) -> &'static str {
                    $kind
                }

                fn opens_scope(&self) -> bool {
                    $scope
                }
            }
        )*
    };
}

structural! {
    /// One line of a source or block.
    Line => "line", scope: false;
    /// `( ... )`
    Group => "group", scope: false;
    /// `{ ... }`
    Block => "block", scope: true;
    /// `if cond: body`
    If => "if", scope: false;
    Cond => "cond", scope: false;
    Body => "body", scope: true;
    /// `print args`
    Print => "print", scope: false;
}

/// `let name = expr`
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Let {
    pub name: Name,
}

impl Value for Let {
    fn kind(&self) -> &'static str {
        "let"
    }

    fn describe(&self, _text: &str, interner: &StringInterner) -> String {
        format!("let {}", interner.lookup(self.name))
    }
}

/// A resolved use of a variable.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VarRef {
    pub name: Name,
    /// The `Let` node that declared it.
    pub decl: NodeId,
}

impl Value for VarRef {
    fn kind(&self) -> &'static str {
        "var"
    }

    fn describe(&self, _text: &str, interner: &StringInterner) -> String {
        format!("var {}", interner.lookup(self.name))
    }
}

/// A parsed literal.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Literal {
    Int(i64),
    Str(String),
}

impl Value for Literal {
    fn kind(&self) -> &'static str {
        "literal"
    }

    fn describe(&self, _text: &str, _interner: &StringInterner) -> String {
        match self {
            Literal::Int(v) => format!("int {v}"),
            Literal::Str(s) => format!("str {s:?}"),
        }
    }
}
