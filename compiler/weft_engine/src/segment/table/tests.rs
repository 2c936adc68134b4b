use pretty_assertions::assert_eq;
use proptest::prelude::*;
use weft_ir::{Name, Precedence};

use super::*;
use crate::binding::{same_as, Batch, Binding, BindingId};

#[derive(Debug, PartialEq)]
struct Rule(u32);

impl Binding for Rule {
    fn precedence(&self) -> Precedence {
        Precedence(1)
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, _batch: &mut Batch<'_>) {}
}

const KEY: Key = Key::Word(Name::from_raw(1));
const SRC: SourceId = SourceId::new(0);

fn claim(id: u32, sta: u32, end: u32) -> Arc<Claim> {
    Arc::new(Claim {
        binding: Arc::new(Rule(id)),
        binding_id: BindingId::from_raw(id),
        precedence: Precedence(1),
        key: KEY,
        source: SRC,
        global: false,
        sta,
        end,
    })
}

/// `(binding, sta, end)` for every segment.
fn layout(table: &SourceTable) -> Vec<(u32, u32, u32)> {
    table
        .segments()
        .iter()
        .map(|s| (s.binding_id().raw(), s.sta(), s.end()))
        .collect()
}

fn check_invariants(table: &SourceTable) {
    let segs = table.segments();
    for seg in segs {
        assert!(seg.sta() < seg.end(), "empty segment {seg:?}");
        assert!(!seg.is_superseded(), "superseded segment left in table");
        assert!(seg.claim().sta <= seg.sta() && seg.end() <= seg.claim().end);
    }
    for pair in segs.windows(2) {
        assert!(pair[0].end() <= pair[1].sta(), "overlap: {pair:?}");
        if pair[0].end() == pair[1].sta() {
            assert!(
                !Arc::ptr_eq(pair[0].claim(), pair[1].claim()),
                "adjacent segments of one claim: {pair:?}"
            );
        }
    }
}

#[test]
fn test_bind_into_empty_table() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    let out = table.bind(&claim(0, 10, 20), &ids);

    assert_eq!(layout(&table), vec![(0, 10, 20)]);
    assert_eq!(out.created.len(), 1);
    assert!(out.superseded.is_empty());
}

#[test]
fn test_interior_subset_splits_three_ways() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 0, 100), &ids);
    let original = Arc::clone(&table.segments()[0]);

    let out = table.bind(&claim(1, 40, 60), &ids);

    assert_eq!(layout(&table), vec![(0, 0, 40), (1, 40, 60), (0, 60, 100)]);
    assert_eq!(out.created.len(), 3);
    assert_eq!(out.superseded.len(), 1);
    assert!(original.is_superseded());
    assert!(table
        .segments()
        .iter()
        .all(|s| s.id() != original.id()));
}

#[test]
fn test_prefix_override_leaves_right_remainder() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 0, 10), &ids);
    table.bind(&claim(1, 0, 4), &ids);
    assert_eq!(layout(&table), vec![(1, 0, 4), (0, 4, 10)]);
}

#[test]
fn test_wider_claim_fills_gaps_only() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 10, 20), &ids);
    table.bind(&claim(1, 30, 40), &ids);

    let out = table.bind(&claim(2, 0, 50), &ids);

    assert_eq!(
        layout(&table),
        vec![(2, 0, 10), (0, 10, 20), (2, 20, 30), (1, 30, 40), (2, 40, 50)]
    );
    assert!(out.superseded.is_empty());
    check_invariants(&table);
}

#[test]
fn test_partial_overlap_keeps_existing() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 0, 10), &ids);
    table.bind(&claim(1, 5, 15), &ids);
    assert_eq!(layout(&table), vec![(0, 0, 10), (1, 10, 15)]);
}

#[test]
fn test_override_around_kept_segment() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 0, 100), &ids);
    table.bind(&claim(1, 20, 30), &ids);
    // Inside claim 0 but not claim 1: takes 0's pieces, keeps 1
    table.bind(&claim(2, 10, 50), &ids);

    assert_eq!(
        layout(&table),
        vec![(0, 0, 10), (2, 10, 20), (1, 20, 30), (2, 30, 50), (0, 50, 100)]
    );
    check_invariants(&table);
}

#[test]
fn test_global_claim_then_local_override() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    let global = Arc::new(Claim {
        global: true,
        sta: 0,
        end: Span::OPEN_END,
        ..Arc::into_inner(claim(0, 0, 0)).unwrap_or_else(|| panic!("claim shared"))
    });
    table.bind(&global, &ids);
    table.bind(&claim(1, 5, 6), &ids);

    assert_eq!(
        layout(&table),
        vec![(0, 0, 5), (1, 5, 6), (0, 6, Span::OPEN_END)]
    );
    assert!(table.segments()[0].is_global());
}

#[test]
#[should_panic(expected = "duplicate claim")]
fn test_duplicate_claim_panics() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 3, 9), &ids);
    table.bind(&claim(1, 3, 9), &ids);
}

#[test]
fn test_take_claims_pending_in_range() {
    #[derive(Debug)]
    struct Leaf;
    impl crate::Value for Leaf {
        fn kind(&self) -> &'static str {
            "leaf"
        }
    }

    let tree = Tree::new();
    let nodes: Vec<NodeId> = (0..5)
        .map(|i| tree.alloc(Arc::new(Leaf), Span::new(SRC, i * 2, i * 2 + 1)))
        .collect();

    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 2, 7), &ids);
    let pending: Vec<_> = nodes.iter().rev().map(|&n| (tree.span(n).start, n)).collect();
    table.add_pending(&pending);

    let seg = Arc::clone(&table.segments()[0]);
    assert_eq!(table.take(&seg, &tree), vec![nodes[1], nodes[2], nodes[3]]);
    assert_eq!(table.take(&seg, &tree), Vec::<NodeId>::new());

    tree.set_done(nodes[2], false);
    assert_eq!(table.take(&seg, &tree), vec![nodes[2]]);

    seg.supersede();
    tree.set_done(nodes[2], false);
    assert_eq!(table.take(&seg, &tree), Vec::<NodeId>::new());
}

#[test]
fn test_add_pending_revives_idle_covering_segment() {
    let ids = AtomicU64::new(0);
    let mut table = SourceTable::new(KEY, SRC);
    table.bind(&claim(0, 0, 10), &ids);
    table.bind(&claim(1, 20, 30), &ids);

    let revive = table.add_pending(&[
        (3, NodeId::from_raw(0)),
        (4, NodeId::from_raw(1)),
        (15, NodeId::from_raw(2)),
    ]);
    assert_eq!(revive.len(), 1);
    assert_eq!(revive[0].sta(), 0);

    revive[0].mark_queued();
    assert!(table.add_pending(&[(5, NodeId::from_raw(3))]).is_empty());
}

proptest! {
    #[test]
    fn prop_random_binds_keep_partition(
        ranges in proptest::collection::vec((0u32..64, 1u32..32), 1..24)
    ) {
        let ids = AtomicU64::new(0);
        let mut table = SourceTable::new(KEY, SRC);
        let mut seen = std::collections::HashSet::new();
        let mut covered = [false; 96];

        for (i, (sta, len)) in ranges.into_iter().enumerate() {
            let end = sta + len;
            if !seen.insert((sta, end)) {
                continue;
            }
            let raw = u32::try_from(i).unwrap_or(u32::MAX);
            let out = table.bind(&claim(raw, sta, end), &ids);
            for old in &out.superseded {
                prop_assert!(old.is_superseded());
            }
            for x in sta..end {
                covered[x as usize] = true;
            }
            check_invariants(&table);
        }

        // Segments cover exactly the union of all claims
        let mut by_segments = [false; 96];
        for seg in table.segments() {
            for x in seg.sta()..seg.end() {
                by_segments[x as usize] = true;
            }
        }
        prop_assert_eq!(covered, by_segments);
    }

    #[test]
    fn prop_nested_override_splits_at_most_three(
        outer_sta in 0u32..32,
        outer_len in 2u32..64,
        inner_off in 0u32..64,
        inner_len in 1u32..64,
    ) {
        let outer_end = outer_sta + outer_len;
        let inner_sta = outer_sta + inner_off % outer_len;
        let inner_end = (inner_sta + inner_len).min(outer_end);
        prop_assume!((inner_sta, inner_end) != (outer_sta, outer_end));

        let ids = AtomicU64::new(0);
        let mut table = SourceTable::new(KEY, SRC);
        table.bind(&claim(0, outer_sta, outer_end), &ids);
        table.bind(&claim(1, inner_sta, inner_end), &ids);

        let mut expected = Vec::new();
        if outer_sta < inner_sta {
            expected.push((0, outer_sta, inner_sta));
        }
        expected.push((1, inner_sta, inner_end));
        if inner_end < outer_end {
            expected.push((0, inner_end, outer_end));
        }
        prop_assert_eq!(layout(&table), expected);
    }
}
