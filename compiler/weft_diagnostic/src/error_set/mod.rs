//! Deduplicated, thread-safe diagnostic collection.
//!
//! Every worker drains into the same set. Exact duplicates (same code,
//! message, labels and notes) are kept once; `flush` returns the rest in
//! source order.

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::Diagnostic;

#[derive(Default)]
struct Inner {
    seen: FxHashSet<Diagnostic>,
    order: Vec<Diagnostic>,
    dropped: usize,
}

/// Concurrency-safe set of diagnostics.
#[derive(Default)]
pub struct ErrorSet {
    inner: Mutex<Inner>,
    /// Maximum number of diagnostics kept (0 = unlimited).
    limit: usize,
}

impl ErrorSet {
    /// Create an unlimited set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set that keeps at most `limit` diagnostics.
    ///
    /// Diagnostics past the limit are counted in [`dropped`](Self::dropped).
    pub fn with_limit(limit: usize) -> Self {
        ErrorSet {
            inner: Mutex::default(),
            limit,
        }
    }

    /// Add a diagnostic. Returns `true` if it was new and kept.
    pub fn add(&self, diagnostic: Diagnostic) -> bool {
        let mut inner = self.inner.lock();
        if inner.seen.contains(&diagnostic) {
            return false;
        }
        if self.limit > 0 && inner.order.len() >= self.limit {
            inner.dropped += 1;
            return false;
        }
        inner.seen.insert(diagnostic.clone());
        inner.order.push(diagnostic);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    /// Check if any kept diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.inner.lock().order.iter().any(Diagnostic::is_error)
    }

    /// Number of diagnostics rejected by the limit.
    pub fn dropped(&self) -> usize {
        self.inner.lock().dropped
    }

    /// Copy of the diagnostics in insertion order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.inner.lock().order.clone()
    }

    /// Take all diagnostics, sorted by primary span then code.
    ///
    /// Diagnostics without a span come first. The set is left empty.
    pub fn flush(&self) -> Vec<Diagnostic> {
        let mut inner = self.inner.lock();
        inner.seen.clear();
        inner.dropped = 0;
        let mut diagnostics = std::mem::take(&mut inner.order);
        drop(inner);
        diagnostics.sort_by(|a, b| {
            a.primary_span()
                .cmp(&b.primary_span())
                .then(a.code.cmp(&b.code))
        });
        diagnostics
    }
}

impl std::fmt::Debug for ErrorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorSet")
            .field("len", &self.len())
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests;
