//! Weft demo language.
//!
//! A small line-oriented language whose parser is nothing but bindings
//! registered on a [`weft_engine::Engine`]:
//!
//! ```text
//! let x = 1
//! if x: print "yes"
//! {
//!     let x = (2)
//!     print x
//! }
//! ```
//!
//! Bracket matching runs first, then line splitting, then statements
//! (`if`, `let`, `print`), variable resolution, and literals. Any word
//! still unclaimed at the end is reported as an unknown identifier.

mod bindings;
mod compile;
mod lexer;
mod value;

pub use bindings::{
    install, ParseBrackets, ParseIf, ParseLet, ParseLiteral, ParsePrint, ResolveVar, SplitLines,
    UnknownWord,
};
pub use compile::{compile, load, render_tree, Compilation};
pub use lexer::{lex, Lexed};
pub use value::{Block, Body, Cond, Group, If, Let, Line, Literal, Print, Token, TokenKind, VarRef};
