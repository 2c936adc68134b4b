//! Engine error types.
//!
//! Two classes of failure leave the engine:
//! - [`ScheduleError`]: draining could not finish (deadlock, budget exceeded,
//!   stopped on error). Returned from `drain` and mirrored as a diagnostic.
//! - [`InvariantViolation`]: a caller broke the engine's contract. These are
//!   programming errors and panic via [`fatal`].

use std::time::Duration;

use thiserror::Error;
use weft_ir::{Key, Span};

/// Why draining stopped before the worklist emptied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Nothing runnable, nothing in flight, and blocked work remains.
    #[error("deadlock: {parked} blocked segment(s) with no runnable work")]
    Deadlock { parked: usize },

    /// Wall-clock budget exceeded.
    #[error("timeout: drain ran for {elapsed:?}, budget is {budget:?}")]
    Timeout { elapsed: Duration, budget: Duration },

    /// Step budget exceeded.
    #[error("step limit exceeded: {limit} batches processed")]
    StepLimit { limit: usize },

    /// Stopped because an error diagnostic was reported.
    #[error("stopped after {errors} error(s)")]
    Stopped { errors: usize },
}

/// A broken engine contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("inverted range {sta}..{end} bound under {key:?}")]
    InvertedRange { key: Key, sta: u32, end: u32 },

    #[error("duplicate claim for {key:?} over {span}")]
    DuplicateClaim { key: Key, span: Span },

    #[error("global binding for {key:?} registered twice")]
    DuplicateGlobal { key: Key },

    #[error("binding registered after the engine was sealed")]
    Sealed,

    #[error("node #{node} inserted while attached to #{parent}")]
    AlreadyAttached { node: u32, parent: u32 },

    #[error("splice {sta}..{end} out of range for #{parent} with {len} children")]
    SpliceOutOfRange {
        parent: u32,
        sta: usize,
        end: usize,
        len: usize,
    },

    #[error("node #{node} cannot be its own ancestor")]
    Cycle { node: u32 },

    #[error("variable `{name}` declared twice at offset {offset}")]
    DuplicateVariable { name: String, offset: u32 },

    #[error("variable `{name}` declared at {offset}, outside scope {span}")]
    OutsideScope {
        name: String,
        offset: u32,
        span: Span,
    },

    #[error("unknown source {id}")]
    UnknownSource { id: u32 },
}

/// Abort on a broken engine contract.
#[cold]
#[track_caller]
pub fn fatal(violation: InvariantViolation) -> ! {
    panic!("invariant violation: {violation}")
}
