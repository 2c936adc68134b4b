//! Loaded sources and the per-compilation source map.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::Span;

/// Index of a loaded source.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct SourceId(u32);

impl SourceId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        SourceId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loaded source text with precomputed line starts.
#[derive(Debug)]
pub struct Source {
    id: SourceId,
    name: String,
    text: String,
    line_starts: Vec<u32>,
}

impl Source {
    fn new(id: SourceId, name: String, text: String) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut pos = 0;
        while let Some(off) = memchr::memchr2(b'\n', b'\r', &bytes[pos..]) {
            let at = pos + off;
            let next = if bytes[at] == b'\r' && bytes.get(at + 1) == Some(&b'\n') {
                at + 2
            } else {
                at + 1
            };
            line_starts.push(u32::try_from(next).unwrap_or(u32::MAX));
            pos = next;
        }
        Source {
            id,
            name,
            text,
            line_starts,
        }
    }

    #[inline]
    pub fn id(&self) -> SourceId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        u32::try_from(self.text.len()).unwrap_or(u32::MAX)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Span covering the whole text.
    pub fn full_span(&self) -> Span {
        Span::new(self.id, 0, self.len())
    }

    /// Text under a span, clamped to the source bounds.
    pub fn slice(&self, span: Span) -> &str {
        let len = self.text.len();
        let start = (span.start as usize).min(len);
        let end = (span.end as usize).clamp(start, len);
        self.text.get(start..end).unwrap_or("")
    }

    /// 1-based line and column of an offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&s| s <= offset);
        let start = self.line_starts[line.saturating_sub(1)];
        (
            u32::try_from(line).unwrap_or(u32::MAX),
            offset - start + 1,
        )
    }

    /// Number of lines, counting a trailing partial line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// All sources loaded into one compilation.
///
/// Sources are append-only; a `SourceId` stays valid for the map's lifetime.
#[derive(Debug, Default)]
pub struct SourceMap {
    sources: RwLock<Vec<Arc<Source>>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, returning its id.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` sources are loaded.
    pub fn add(&self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let mut sources = self.sources.write();
        let raw = u32::try_from(sources.len())
            .unwrap_or_else(|_| panic!("source map exceeded {} sources", u32::MAX));
        let id = SourceId::new(raw);
        sources.push(Arc::new(Source::new(id, name.into(), text.into())));
        id
    }

    pub fn get(&self, id: SourceId) -> Option<Arc<Source>> {
        self.sources.read().get(id.index()).cloned()
    }

    /// All source ids in load order.
    pub fn ids(&self) -> Vec<SourceId> {
        (0..self.len())
            .filter_map(|i| u32::try_from(i).ok().map(SourceId::new))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text under a span, or `""` for an unknown source.
    pub fn text(&self, span: Span) -> String {
        self.get(span.source)
            .map(|s| s.slice(span).to_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;
