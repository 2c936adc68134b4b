//! Interval table for one (Key, Source).
//!
//! Segments are kept sorted and non-overlapping. Binding a new claim walks
//! the segments it overlaps: a claim lying inside an existing segment's
//! claim overrides it, anything else keeps the existing segment and only
//! fills the gaps around it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use weft_ir::{Key, SourceId, Span};

use super::{Claim, Segment, SegmentId, SegmentState};
use crate::error::{fatal, InvariantViolation};
use crate::tree::{NodeId, Tree};

/// Segments created and superseded by one `bind`.
#[derive(Debug, Default)]
pub(crate) struct BindOutcome {
    pub(crate) created: Vec<Arc<Segment>>,
    pub(crate) superseded: Vec<Arc<Segment>>,
}

enum Piece {
    Keep(Arc<Segment>),
    New { claim: Arc<Claim>, sta: u32, end: u32 },
}

/// Append `[sta, end)` of `claim`, merging with a directly preceding piece
/// of the same claim.
fn push_piece(out: &mut Vec<Piece>, claim: &Arc<Claim>, sta: u32, end: u32) {
    if sta >= end {
        return;
    }
    if let Some(Piece::New {
        claim: last,
        end: last_end,
        ..
    }) = out.last_mut()
    {
        if Arc::ptr_eq(last, claim) && *last_end == sta {
            *last_end = end;
            return;
        }
    }
    out.push(Piece::New {
        claim: Arc::clone(claim),
        sta,
        end,
    });
}

pub(crate) struct SourceTable {
    key: Key,
    source: SourceId,
    segs: Vec<Arc<Segment>>,
    /// Claim ranges bound so far.
    claimed: FxHashSet<(u32, u32)>,
    /// Registered nodes by start offset.
    pending: Vec<(u32, NodeId)>,
    sorted: bool,
}

impl SourceTable {
    pub(crate) fn new(key: Key, source: SourceId) -> Self {
        SourceTable {
            key,
            source,
            segs: Vec::new(),
            claimed: FxHashSet::default(),
            pending: Vec::new(),
            sorted: true,
        }
    }

    pub(crate) fn segments(&self) -> &[Arc<Segment>] {
        &self.segs
    }

    /// Apply a claim. The claim's range must be non-empty.
    pub(crate) fn bind(&mut self, claim: &Arc<Claim>, ids: &AtomicU64) -> BindOutcome {
        let (sta, end) = (claim.sta, claim.end);
        if !self.claimed.insert((sta, end)) {
            fatal(InvariantViolation::DuplicateClaim {
                key: self.key,
                span: Span::new(self.source, sta, end),
            });
        }

        let first = self.segs.partition_point(|s| s.end <= sta);
        let mut last = first;
        let mut cur = sta;
        let mut out = Vec::new();
        let mut superseded = Vec::new();

        while last < self.segs.len() && self.segs[last].sta < end {
            let old = Arc::clone(&self.segs[last]);
            last += 1;

            if !claim.within(&old.claim) {
                push_piece(&mut out, claim, cur, old.sta);
                cur = cur.max(old.end);
                out.push(Piece::Keep(old));
                continue;
            }

            old.supersede();
            if old.sta < cur {
                push_piece(&mut out, &old.claim, old.sta, cur);
            }
            let piece_end = end.min(old.end);
            push_piece(&mut out, claim, cur, piece_end);
            if end < old.end {
                push_piece(&mut out, &old.claim, end, old.end);
            }
            cur = piece_end;
            superseded.push(old);
        }
        push_piece(&mut out, claim, cur, end);

        let mut created = Vec::new();
        let replacement: Vec<Arc<Segment>> = out
            .into_iter()
            .map(|piece| match piece {
                Piece::Keep(seg) => seg,
                Piece::New { claim, sta, end } => {
                    let id = SegmentId::new(ids.fetch_add(1, Ordering::Relaxed));
                    let seg = Arc::new(Segment::new(id, claim, sta, end));
                    created.push(Arc::clone(&seg));
                    seg
                }
            })
            .collect();
        self.segs.splice(first..last, replacement);

        BindOutcome {
            created,
            superseded,
        }
    }

    /// Segment covering `offset`.
    pub(crate) fn covering(&self, offset: u32) -> Option<&Arc<Segment>> {
        let at = self.segs.partition_point(|s| s.end <= offset);
        self.segs.get(at).filter(|s| s.sta <= offset)
    }

    /// Register nodes, returning the idle segments that cover them and must
    /// be queued again.
    pub(crate) fn add_pending(&mut self, nodes: &[(u32, NodeId)]) -> Vec<Arc<Segment>> {
        let mut revive: Vec<Arc<Segment>> = Vec::new();
        for &(offset, node) in nodes {
            if self.sorted {
                self.sorted = self.pending.last().map_or(true, |&last| last <= (offset, node));
            }
            self.pending.push((offset, node));

            if let Some(seg) = self.covering(offset) {
                if seg.state() == SegmentState::Idle && !revive.iter().any(|s| s.id == seg.id) {
                    revive.push(Arc::clone(seg));
                }
            }
        }
        revive
    }

    fn sort_pending(&mut self) {
        if !self.sorted {
            self.pending.sort_unstable();
            self.pending.dedup();
            self.sorted = true;
        }
    }

    /// Registered nodes, sorted by offset.
    pub(crate) fn pending(&mut self) -> &[(u32, NodeId)] {
        self.sort_pending();
        &self.pending
    }

    /// Claim every pending node inside the segment.
    ///
    /// A superseded segment claims nothing.
    pub(crate) fn take(&mut self, seg: &Segment, tree: &Tree) -> Vec<NodeId> {
        if seg.is_superseded() {
            return Vec::new();
        }
        self.sort_pending();
        let lo = self.pending.partition_point(|&(o, _)| o < seg.sta);
        let hi = self.pending.partition_point(|&(o, _)| o < seg.end);
        self.pending[lo..hi]
            .iter()
            .map(|&(_, node)| node)
            .filter(|&node| tree.try_claim(node))
            .collect()
    }
}

#[cfg(test)]
mod tests;
