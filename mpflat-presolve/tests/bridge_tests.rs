//! Integration tests for presolve and postsolve ordering

use mpflat_presolve::{IndexRange, NodeRange, ValueKind, ValuePresolver};
use proptest::prelude::*;

#[test]
fn test_chain_postsolve_depends_on_order() {
    // A -> B registered first, B -> C second. C's value only reaches A when
    // the B -> C link is undone before the A -> B link.
    let mut p = ValuePresolver::new();
    let a = p.add_node("A", ValueKind::Primal);
    let b = p.add_node("B", ValueKind::Primal);
    let c = p.add_node("C", ValueKind::Primal);
    let ra = p.add_slots(a, 1);
    let rb = p.add_slots(b, 1);
    let rc = p.add_slots(c, 1);
    p.add_copy_link(ra, rb);
    p.add_copy_link(rb, rc);

    p.set_values(c, &[42.0]);
    p.postsolve_solution(p.full_range());
    assert_eq!(p.values::<f64>(a), vec![42.0]);
    assert_eq!(p.values::<f64>(b), vec![42.0]);
}

#[test]
fn test_partial_registry_range() {
    let mut p = ValuePresolver::new();
    let a = p.add_node("A", ValueKind::Primal);
    let b = p.add_node("B", ValueKind::Primal);
    let ra = p.add_slots(a, 2);
    let rb = p.add_slots(b, 2);
    p.add_copy_link(ra, rb);
    p.add_one2many_link(NodeRange::single(a, 0), NodeRange::single(b, 1));
    assert_eq!(p.num_registry_records(), 2);

    p.set_values(a, &[5.0, 6.0]);
    p.presolve_solution(IndexRange::single(0));
    assert_eq!(p.values::<f64>(b), vec![5.0, 6.0]);
    p.presolve_solution(IndexRange::single(1));
    assert_eq!(p.values::<f64>(b), vec![5.0, 5.0]);
}

proptest! {
    /// Presolve then postsolve over distinct scalar copy links is the identity
    #[test]
    fn copy_links_round_trip(values in proptest::collection::vec(-1e6f64..1e6, 1..40)) {
        let mut p = ValuePresolver::new();
        let src = p.add_node("src", ValueKind::Primal);
        let dst = p.add_node("dst", ValueKind::Primal);
        let n = values.len();
        p.add_slots(src, n);
        p.add_slots(dst, n);
        for i in 0..n {
            p.add_copy_link(NodeRange::single(src, i), NodeRange::single(dst, n - 1 - i));
        }
        p.set_values(src, &values);
        p.presolve_solution(p.full_range());
        p.clear_values();
        // values now only live where we put them back
        let mut reversed = values.clone();
        reversed.reverse();
        p.set_values(dst, &reversed);
        p.postsolve_solution(p.full_range());
        prop_assert_eq!(p.values::<f64>(src), values);
    }

    /// Summed duals of a split row equal the sum of the parts
    #[test]
    fn one2many_dual_sum(parts in proptest::collection::vec(-100.0f64..100.0, 1..6)) {
        let mut p = ValuePresolver::new();
        let orig = p.add_node("orig", ValueKind::Dual);
        let src = p.add_slots(orig, 1);
        let mut nodes = Vec::new();
        for (i, &v) in parts.iter().enumerate() {
            let n = p.add_node(format!("part{i}"), ValueKind::Dual);
            let r = p.add_slots(n, 1);
            p.add_one2many_link(src, r);
            nodes.push((n, v));
        }
        for &(n, v) in &nodes {
            p.set_values(n, &[v]);
        }
        p.postsolve_solution(p.full_range());
        let expected: f64 = parts.iter().sum();
        prop_assert!((p.values::<f64>(orig)[0] - expected).abs() < 1e-9);
    }
}
