//! Weft engine: incremental, precedence-ordered tree rewriting.
//!
//! Source text becomes a mutable node tree. Independently registered
//! bindings claim ranges of it under a [`Key`], rewrite the nodes they
//! claim, and register narrower bindings for what they produce. Everything
//! re-enters one priority worklist until the tree stops changing.
//!
//! # Architecture
//!
//! - [`Tree`]: arena of nodes with parent/index links and range splices
//! - `segment`: per-(Key, Source) interval tables; narrower claims override
//!   wider ones
//! - `worklist`: min-heap of queued segments with lazy deletion
//! - [`Binding`] / [`Batch`]: the rule contract and the nodes handed to it
//! - [`Scopes`]: span-bounded variable declarations
//! - [`Engine`]: owns all of the above for one compilation
//!
//! # Tracing
//!
//! Set `RUST_LOG=weft_engine=debug` (or `trace` for per-batch events) and
//! call [`init_tracing`].
//!
//! [`Key`]: weft_ir::Key

mod binding;
mod config;
mod engine;
mod error;
mod scope;
mod segment;
mod tree;
mod value;
mod watchdog;
mod worklist;

use std::sync::Once;

pub use binding::{same_as, Batch, Binding, BindingId};
pub use config::{EngineConfig, DEFAULT_TIMEOUT};
pub use engine::Engine;
pub use error::{fatal, InvariantViolation, ScheduleError};
pub use scope::{ScopeId, Scopes, Variable};
pub use segment::{Claim, Segment, SegmentId, SegmentState};
pub use tree::{NodeId, Tree};
pub use value::{AsAny, Keys, SourceRoot, Value};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=weft_engine=debug` or `RUST_LOG=weft_engine=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
