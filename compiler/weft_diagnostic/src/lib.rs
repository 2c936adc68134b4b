//! Diagnostics for the Weft rewriting engine.
//!
//! Bindings report problems against spans while the engine keeps running:
//! - Error codes for searchability
//! - A message saying what went wrong
//! - A primary span saying where
//! - Notes for context
//!
//! Diagnostics from all worker threads land in one [`ErrorSet`], which
//! drops exact duplicates and hands them back in source order.

mod diagnostic;
mod error_code;
mod error_set;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use error_set::ErrorSet;
