use pretty_assertions::assert_eq;
use weft_ir::{SourceId, Span};

use super::*;
use crate::ErrorCode;

fn at(source: u32, start: u32, code: ErrorCode) -> Diagnostic {
    Diagnostic::error(code)
        .with_message(code.description())
        .with_label(Span::new(SourceId::new(source), start, start + 1), "here")
}

#[test]
fn test_duplicates_kept_once() {
    let set = ErrorSet::new();
    assert!(set.add(at(0, 4, ErrorCode::E1001)));
    assert!(!set.add(at(0, 4, ErrorCode::E1001)));
    assert!(set.add(at(0, 4, ErrorCode::E2001)));
    assert_eq!(set.len(), 2);
    assert!(set.has_errors());
}

#[test]
fn test_flush_sorts_by_source_then_span_then_code() {
    let set = ErrorSet::new();
    set.add(at(1, 0, ErrorCode::E1001));
    set.add(at(0, 9, ErrorCode::E2001));
    set.add(at(0, 9, ErrorCode::E1002));
    set.add(at(0, 2, ErrorCode::E8001));

    let codes: Vec<_> = set.flush().iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::E8001,
            ErrorCode::E1002,
            ErrorCode::E2001,
            ErrorCode::E1001
        ]
    );
    assert!(set.is_empty());
}

#[test]
fn test_limit_counts_dropped() {
    let set = ErrorSet::with_limit(2);
    set.add(at(0, 0, ErrorCode::E1001));
    set.add(at(0, 1, ErrorCode::E1001));
    assert!(!set.add(at(0, 2, ErrorCode::E1001)));
    assert_eq!(set.len(), 2);
    assert_eq!(set.dropped(), 1);
}

#[test]
fn test_concurrent_adds() {
    let set = ErrorSet::new();
    std::thread::scope(|s| {
        for t in 0..4u32 {
            let set = &set;
            s.spawn(move || {
                for i in 0..50 {
                    // Every thread reports the same 50 diagnostics plus one of its own
                    set.add(at(0, i, ErrorCode::E1001));
                }
                set.add(at(1, t, ErrorCode::E2001));
            });
        }
    });
    assert_eq!(set.len(), 54);
}
