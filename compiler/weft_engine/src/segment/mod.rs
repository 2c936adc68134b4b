//! Segments and the per-(Key, Source) interval table.
//!
//! A [`Claim`] is one binding's registration over a range. The table splits
//! claims into [`Segment`]s so that, within one key and source, every offset
//! belongs to at most one segment and narrower claims win.

mod table;

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use weft_ir::{Key, Precedence, SourceId, Span};

use crate::binding::{Binding, BindingId};

pub(crate) use table::{BindOutcome, SourceTable};

/// Stable identity of a segment.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SegmentId(u64);

impl SegmentId {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        SegmentId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One binding registration over `[sta, end)` of a source.
///
/// Global claims cover `[0, Span::OPEN_END)`.
pub struct Claim {
    pub(crate) binding: Arc<dyn Binding>,
    pub(crate) binding_id: BindingId,
    pub(crate) precedence: Precedence,
    pub(crate) key: Key,
    pub(crate) source: SourceId,
    pub(crate) global: bool,
    pub(crate) sta: u32,
    pub(crate) end: u32,
}

impl Claim {
    /// Whether `self` is more specific than `other`: its range lies inside
    /// the other's.
    #[inline]
    pub(crate) fn within(&self, other: &Claim) -> bool {
        other.sta <= self.sta && self.end <= other.end
    }

    pub fn span(&self) -> Span {
        Span::new(self.source, self.sta, self.end)
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

impl fmt::Debug for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim")
            .field("binding", &self.binding_id)
            .field("key", &self.key)
            .field("span", &self.span())
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}

/// Scheduling state of a segment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum SegmentState {
    Idle = 0,
    Queued = 1,
    Superseded = 2,
}

impl SegmentState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SegmentState::Queued,
            2 => SegmentState::Superseded,
            _ => SegmentState::Idle,
        }
    }
}

/// Maximal contiguous range claimed by one binding for one key in one
/// source.
///
/// The range never changes. Trimming a segment supersedes it and creates
/// remainder segments.
pub struct Segment {
    id: SegmentId,
    claim: Arc<Claim>,
    sta: u32,
    end: u32,
    state: AtomicU8,
    generation: AtomicU32,
    waiters: AtomicU32,
}

impl Segment {
    pub(crate) fn new(id: SegmentId, claim: Arc<Claim>, sta: u32, end: u32) -> Self {
        Segment {
            id,
            claim,
            sta,
            end,
            state: AtomicU8::new(SegmentState::Idle as u8),
            generation: AtomicU32::new(0),
            waiters: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    #[inline]
    pub fn claim(&self) -> &Arc<Claim> {
        &self.claim
    }

    #[inline]
    pub fn sta(&self) -> u32 {
        self.sta
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.claim.key
    }

    #[inline]
    pub fn source(&self) -> SourceId {
        self.claim.source
    }

    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.claim.source, self.sta, self.end)
    }

    #[inline]
    pub fn precedence(&self) -> Precedence {
        self.claim.precedence
    }

    #[inline]
    pub fn binding_id(&self) -> BindingId {
        self.claim.binding_id
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.claim.global
    }

    pub fn state(&self) -> SegmentState {
        SegmentState::from_raw(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_superseded(&self) -> bool {
        self.state() == SegmentState::Superseded
    }

    /// Times this segment's batch declared itself blocked.
    pub fn waiters(&self) -> u32 {
        self.waiters.load(Ordering::Relaxed)
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn supersede(&self) {
        self.state
            .store(SegmentState::Superseded as u8, Ordering::Release);
    }

    /// Move to `Queued` and stamp a new generation.
    ///
    /// Returns `None` if the segment was superseded.
    pub(crate) fn mark_queued(&self) -> Option<u32> {
        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            if cur == SegmentState::Superseded as u8 {
                return None;
            }
            match self.state.compare_exchange_weak(
                cur,
                SegmentState::Queued as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
        Some(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Move a dequeued segment back to `Idle`. Superseded stays superseded.
    pub(crate) fn mark_dequeued(&self) {
        let _ = self.state.compare_exchange(
            SegmentState::Queued as u8,
            SegmentState::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub(crate) fn add_waiter(&self) {
        self.waiters.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment({} {:?} {}..{} binding={} state={:?})",
            self.id.0,
            self.claim.key,
            self.sta,
            self.end,
            self.claim.binding_id.raw(),
            self.state()
        )
    }
}
