//! Weft IR - shared identifiers for the rewriting engine.
//!
//! This crate holds the small, copyable types every other Weft crate speaks:
//! - Spans tying a byte range to a source
//! - Sources and the per-compilation `SourceMap`
//! - Names for interned words and markers
//! - Keys indexing which binding applies to a node
//! - Precedence levels used to order pending work
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: literal text becomes `Name(u32)`, so keys are
//!   `Copy` and compare in O(1)
//! - **Index, don't point**: sources are `SourceId(u32)`, nodes live in the
//!   engine arena behind `NodeId(u32)`

mod interner;
mod key;
mod name;
mod source;
mod span;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use key::{Key, Precedence};
pub use name::Name;
pub use source::{Source, SourceId, SourceMap};
pub use span::{Span, SpanError};
