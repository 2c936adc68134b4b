//! Source location spans.
//!
//! A span is a half-open byte range `[start, end)` inside one source. Spans
//! of composite nodes are built by merging the spans of their first and last
//! children, so ranges bubble up without re-scanning source text.

use std::fmt;

use crate::SourceId;

/// Error when creating a span from an invalid range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// Span start position exceeds `u32::MAX`.
    StartTooLarge(usize),
    /// Span end position exceeds `u32::MAX`.
    EndTooLarge(usize),
    /// Span end is before its start.
    Inverted { start: usize, end: usize },
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanError::StartTooLarge(v) => {
                write!(f, "span start {v} (0x{v:X}) exceeds u32::MAX")
            }
            SpanError::EndTooLarge(v) => write!(f, "span end {v} (0x{v:X}) exceeds u32::MAX"),
            SpanError::Inverted { start, end } => {
                write!(f, "span end {end} is before its start {start}")
            }
        }
    }
}

impl std::error::Error for SpanError {}

/// Byte range within a single source.
///
/// Layout: 12 bytes (`SourceId` + two `u32` offsets).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    pub source: SourceId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// End offset used by unbounded (global) ranges.
    pub const OPEN_END: u32 = u32::MAX;

    /// Create a new span.
    #[inline]
    pub const fn new(source: SourceId, start: u32, end: u32) -> Self {
        Span { source, start, end }
    }

    /// The unbounded range `[0, OPEN_END)` of a source.
    #[inline]
    pub const fn open(source: SourceId) -> Self {
        Span {
            source,
            start: 0,
            end: Self::OPEN_END,
        }
    }

    /// Try to create a span from a byte range.
    pub fn try_from_range(
        source: SourceId,
        range: std::ops::Range<usize>,
    ) -> Result<Self, SpanError> {
        let start =
            u32::try_from(range.start).map_err(|_| SpanError::StartTooLarge(range.start))?;
        let end = u32::try_from(range.end).map_err(|_| SpanError::EndTooLarge(range.end))?;
        if end < start {
            return Err(SpanError::Inverted {
                start: range.start,
                end: range.end,
            });
        }
        Ok(Span { source, start, end })
    }

    /// Create from a byte range.
    ///
    /// # Panics
    /// Panics if the range does not fit in `u32` or is inverted.
    #[inline]
    pub fn from_range(source: SourceId, range: std::ops::Range<usize>) -> Self {
        Self::try_from_range(source, range).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the span reaches the open end used by global bindings.
    #[inline]
    pub const fn is_open(&self) -> bool {
        self.end == Self::OPEN_END
    }

    /// Check if an offset is within this span.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if another span is fully contained within this span.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.source == other.source && self.start <= other.start && other.end <= self.end
    }

    /// Merge two spans of the same source into one covering both.
    ///
    /// Spans from different sources keep `self`.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        if self.source != other.source {
            return self;
        }
        Span {
            source: self.source,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Extend span to include another position.
    #[inline]
    #[must_use]
    pub fn extend_to(self, end: u32) -> Span {
        Span {
            end: self.end.max(end),
            ..self
        }
    }

    /// Create a zero-length span.
    #[inline]
    pub const fn point(source: SourceId, offset: u32) -> Span {
        Span {
            source,
            start: offset,
            end: offset,
        }
    }

    /// Convert to a `std::ops::Range`.
    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    /// Source first, then start offset, then the shorter span.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.source
            .cmp(&other.source)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            write!(f, "{}:{}..MAX", self.source.raw(), self.start)
        } else {
            write!(f, "{}:{}..{}", self.source.raw(), self.start, self.end)
        }
    }
}
