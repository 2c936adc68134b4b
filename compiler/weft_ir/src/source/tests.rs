use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_add_and_get() {
    let map = SourceMap::new();
    let a = map.add("a.wf", "print 1\n");
    let b = map.add("b.wf", "let x = 2\n");

    assert_eq!(a, SourceId::new(0));
    assert_eq!(b, SourceId::new(1));
    assert_eq!(map.len(), 2);
    assert_eq!(map.ids(), vec![a, b]);

    let src = map.get(b).unwrap_or_else(|| panic!("source b missing"));
    assert_eq!(src.name(), "b.wf");
    assert_eq!(src.len(), 10);
}

#[test]
fn test_slice_clamps() {
    let map = SourceMap::new();
    let id = map.add("s", "hello");
    assert_eq!(map.text(Span::new(id, 1, 3)), "el");
    assert_eq!(map.text(Span::open(id)), "hello");
    assert_eq!(map.text(Span::new(SourceId::new(7), 0, 1)), "");
}

#[test]
fn test_line_col_mixed_breaks() {
    let map = SourceMap::new();
    let id = map.add("s", "ab\r\ncd\ne\rf");
    let src = map.get(id).unwrap_or_else(|| panic!("source missing"));

    assert_eq!(src.line_count(), 4);
    assert_eq!(src.line_col(0), (1, 1));
    assert_eq!(src.line_col(4), (2, 1));
    assert_eq!(src.line_col(5), (2, 2));
    assert_eq!(src.line_col(7), (3, 1));
    assert_eq!(src.line_col(9), (4, 1));
}
