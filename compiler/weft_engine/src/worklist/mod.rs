//! Global priority worklist.
//!
//! A min-heap of queued segments ordered by
//! `(precedence, local-before-global, source, binding, sta, end, id)`.
//! Re-queuing a segment stamps a new generation; heap entries carrying an
//! older generation, or pointing at a superseded segment, are skipped when
//! they surface (lazy deletion).
//!
//! With several drainers, a batch is only handed out when its precedence is
//! not above anything in flight, and each source has at most one batch in
//! flight.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;
use weft_ir::{Precedence, SourceId};

use crate::binding::{Binding, BindingId};
use crate::segment::{Segment, SegmentId, SegmentState};

struct Entry {
    precedence: Precedence,
    global: bool,
    source: SourceId,
    binding: BindingId,
    sta: u32,
    end: u32,
    id: SegmentId,
    generation: u32,
    segment: Arc<Segment>,
}

type EntryKey = (Precedence, bool, SourceId, BindingId, u32, u32, SegmentId);

impl Entry {
    fn new(segment: &Arc<Segment>, generation: u32) -> Self {
        Entry {
            precedence: segment.precedence(),
            global: segment.is_global(),
            source: segment.source(),
            binding: segment.binding_id(),
            sta: segment.sta(),
            end: segment.end(),
            id: segment.id(),
            generation,
            segment: Arc::clone(segment),
        }
    }

    fn key(&self) -> EntryKey {
        (
            self.precedence,
            self.global,
            self.source,
            self.binding,
            self.sta,
            self.end,
            self.id,
        )
    }

    /// Still the segment's current queue entry.
    fn is_live(&self) -> bool {
        self.segment.state() == SegmentState::Queued
            && self.segment.generation() == self.generation
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.generation == other.generation
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so `BinaryHeap` pops the smallest key first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key()
            .cmp(&self.key())
            .then(other.generation.cmp(&self.generation))
    }
}

/// Segments dequeued together for one binding in one source.
pub(crate) struct Ticket {
    pub(crate) source: SourceId,
    pub(crate) binding_id: BindingId,
    pub(crate) binding: Arc<dyn Binding>,
    pub(crate) precedence: Precedence,
    pub(crate) segments: Vec<Arc<Segment>>,
}

/// What a drainer should do next.
pub(crate) enum Next {
    Ready(Ticket),
    /// Nothing queued, in flight, or parked.
    Idle,
    /// Nothing queued or in flight, but these segments are parked.
    Stalled(Vec<Arc<Segment>>),
    /// Another drainer stopped the worklist.
    Aborted,
    /// The deadline passed while waiting.
    TimedOut,
}

/// How a dispatched batch ended.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Completion {
    /// The binding ran on at least one node.
    Progress,
    /// No pending nodes were left to claim.
    Empty,
    /// The binding asked to wait for other work.
    Blocked,
}

enum Step {
    Ready(Ticket),
    Wait,
    Idle,
    Stalled(Vec<Arc<Segment>>),
}

#[derive(Default)]
struct State {
    heap: BinaryHeap<Entry>,
    in_flight: SmallVec<[(SourceId, Precedence); 8]>,
    parked: Vec<Arc<Segment>>,
    aborted: bool,
}

impl State {
    fn push(&mut self, segment: &Arc<Segment>) -> bool {
        match segment.mark_queued() {
            Some(generation) => {
                self.heap.push(Entry::new(segment, generation));
                true
            }
            None => false,
        }
    }

    fn source_busy(&self, source: SourceId) -> bool {
        self.in_flight.iter().any(|&(s, _)| s == source)
    }

    fn try_next(&mut self) -> Step {
        let floor = self.in_flight.iter().map(|&(_, p)| p).min();
        let mut aside: Vec<Entry> = Vec::new();

        let head = loop {
            let Some(entry) = self.heap.pop() else {
                break None;
            };
            if !entry.is_live() {
                continue;
            }
            let above_floor = floor.is_some_and(|f| entry.precedence > f);
            let above_aside = aside.first().is_some_and(|a| entry.precedence > a.precedence);
            if above_floor || above_aside {
                self.heap.push(entry);
                break None;
            }
            if self.source_busy(entry.source) {
                aside.push(entry);
                continue;
            }
            break Some(entry);
        };

        let Some(head) = head else {
            self.heap.extend(aside);
            if !self.in_flight.is_empty() {
                return Step::Wait;
            }
            self.parked.retain(|s| !s.is_superseded());
            if self.parked.is_empty() {
                return Step::Idle;
            }
            return Step::Stalled(std::mem::take(&mut self.parked));
        };

        let (source, binding_id) = (head.source, head.binding);
        let mut segments = vec![head.segment];
        while let Some(peek) = self.heap.peek() {
            if !peek.is_live() {
                self.heap.pop();
                continue;
            }
            if peek.source != source || peek.binding != binding_id {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                segments.push(entry.segment);
            }
        }
        self.heap.extend(aside);

        for seg in &segments {
            seg.mark_dequeued();
        }
        let binding = Arc::clone(&segments[0].claim().binding);
        let precedence = segments[0].precedence();
        self.in_flight.push((source, precedence));

        Step::Ready(Ticket {
            source,
            binding_id,
            binding,
            precedence,
            segments,
        })
    }
}

/// Shared priority queue of pending segments.
#[derive(Default)]
pub(crate) struct Worklist {
    state: Mutex<State>,
    ready: Condvar,
}

impl Worklist {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a segment. Returns `false` if it was superseded.
    #[cfg(test)]
    pub(crate) fn queue(&self, segment: &Arc<Segment>) -> bool {
        let queued = self.state.lock().push(segment);
        if queued {
            self.ready.notify_one();
        }
        queued
    }

    pub(crate) fn queue_all(&self, segments: &[Arc<Segment>]) {
        if segments.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        for seg in segments {
            state.push(seg);
        }
        drop(state);
        self.ready.notify_all();
    }

    /// Wait for the next batch.
    pub(crate) fn next(&self, deadline: Option<Instant>) -> Next {
        let mut state = self.state.lock();
        loop {
            if state.aborted {
                return Next::Aborted;
            }
            match state.try_next() {
                Step::Ready(ticket) => return Next::Ready(ticket),
                Step::Idle => {
                    self.ready.notify_all();
                    return Next::Idle;
                }
                Step::Stalled(parked) => {
                    state.aborted = true;
                    self.ready.notify_all();
                    return Next::Stalled(parked);
                }
                Step::Wait => match deadline {
                    Some(deadline) => {
                        if self.ready.wait_until(&mut state, deadline).timed_out() {
                            return Next::TimedOut;
                        }
                    }
                    None => self.ready.wait(&mut state),
                },
            }
        }
    }

    /// Finish a dispatched batch.
    ///
    /// Blocked segments are parked; a batch that made progress re-queues
    /// every parked segment.
    pub(crate) fn complete(&self, ticket: &Ticket, completion: Completion) {
        let mut state = self.state.lock();
        if let Some(at) = state
            .in_flight
            .iter()
            .position(|&(s, _)| s == ticket.source)
        {
            state.in_flight.swap_remove(at);
        }
        match completion {
            Completion::Blocked => {
                for seg in &ticket.segments {
                    seg.add_waiter();
                    state.parked.push(Arc::clone(seg));
                }
            }
            Completion::Progress => {
                let parked = std::mem::take(&mut state.parked);
                for seg in &parked {
                    state.push(seg);
                }
            }
            Completion::Empty => {}
        }
        drop(state);
        self.ready.notify_all();
    }

    /// Stop handing out batches and wake every waiting drainer.
    pub(crate) fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        state.heap.clear();
        state.in_flight.clear();
        drop(state);
        self.ready.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// Number of live queued entries.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().heap.iter().filter(|e| e.is_live()).count()
    }

    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.state.lock().parked.len()
    }
}
