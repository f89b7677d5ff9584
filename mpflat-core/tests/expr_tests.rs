//! Integration tests for the expression arena

use mpflat_core::expr::{
    Expr, ExprFactory, ExprHandle, FunctionType, IteratedExpr, Kind, LogicalExpr, NumericExpr,
    RelationalExpr,
};
use proptest::prelude::*;

/// Count every node reachable from `root`
fn reachable(f: &ExprFactory, root: Expr) -> usize {
    1 + f
        .children(root)
        .into_iter()
        .map(|c| reachable(f, c))
        .sum::<usize>()
}

#[test]
fn test_nested_tree_traversal() {
    let mut f = ExprFactory::new();
    let x = f.make_variable(0);
    let y = f.make_variable(1);
    let s = f.make_unary(Kind::Sin, x);
    let sum = f.make_iterated(Kind::Sum, &[s.into(), y.into()]);
    let lim = f.make_numeric_constant(1.0);
    let le = f.make_relational(Kind::Le, sum, lim);
    let ge = f.make_relational(Kind::Ge, x, lim);
    let both = f.make_binary_logical(Kind::And, le, ge);
    let not = f.make_not(both);

    // not, and, le, sum, sin, x, y, 1, ge, x, 1
    assert_eq!(reachable(&f, not.into()), 11);
    assert_eq!(f.num_exprs(), 9);
    assert_eq!(not.arg(&f), LogicalExpr::from(both));
}

#[test]
fn test_cast_through_all_views() {
    let mut f = ExprFactory::new();
    let x = f.make_variable(2);
    let c = f.make_numeric_constant(4.0);
    let rel = f.make_relational(Kind::Ne, x, c);
    let e: Expr = rel.into();

    assert!(f.cast::<LogicalExpr>(e).is_some());
    assert!(f.cast::<NumericExpr>(e).is_none());
    let back: RelationalExpr = f.cast(e).unwrap();
    assert_eq!(back, rel);
    assert_eq!(f.kind(back), Kind::Ne);
    assert_eq!(back.id(), rel.id());
}

#[test]
fn test_symbolic_expressions() {
    let mut f = ExprFactory::new();
    let func = f.add_function("concat", -1, FunctionType::Symbolic);
    let a = f.make_string("left");
    let b = f.make_string("right");
    let mut call = f.begin_call(func, 2);
    call.add_arg(a);
    call.add_arg(b);
    let call = f.end_call(call);
    assert_eq!(call.num_args(&f), 2);

    let t = f.make_logical_constant(false);
    let sif = f.make_symbolic_if(t, a, b);
    assert_eq!(sif.then_expr(&f), Expr::from(a));
    assert_eq!(f.kind(sif), Kind::IfSym);

    let mut nof = f.begin_symbolic_number_of(3, a);
    nof.add_arg(a);
    nof.add_arg(b);
    let nof = f.end_symbolic_number_of(nof);
    let texts: Vec<&str> = nof
        .args(&f)
        .skip(1)
        .map(|e| f.cast::<mpflat_core::expr::StringLiteral>(e).unwrap().value(&f))
        .collect();
    assert_eq!(texts, vec!["left", "right"]);
}

#[test]
fn test_implication_and_iterated_logical() {
    let mut f = ExprFactory::new();
    let x = f.make_variable(0);
    let zero = f.make_numeric_constant(0.0);
    let c1 = f.make_relational(Kind::Gt, x, zero);
    let c2 = f.make_relational(Kind::Lt, x, zero);
    let t = f.make_logical_constant(true);
    let imp = f.make_implication(c1, c2, t);
    assert_eq!(imp.condition(&f), LogicalExpr::from(c1));
    assert_eq!(imp.else_expr(&f), LogicalExpr::from(t));

    let mut b = f.begin_iterated_logical(Kind::Exists, 2);
    b.add_arg(c1);
    b.add_arg(imp);
    let ex = f.end_iterated_logical(b);
    assert_eq!(ex.args(&f).rev().next(), Some(LogicalExpr::from(imp)));
}

#[test]
#[should_panic(expected = "invalid iterated expression kind")]
fn test_begin_iterated_rejects_count() {
    let f = ExprFactory::new();
    let _ = f.begin_iterated(Kind::Count, 2);
}

#[test]
#[should_panic(expected = "takes 2 arguments")]
fn test_call_arity_checked() {
    let mut f = ExprFactory::new();
    let func = f.add_function("hypot", 2, FunctionType::Numeric);
    let _ = f.begin_call(func, 3);
}

proptest! {
    /// Arguments come back in insertion order
    #[test]
    fn iterated_args_keep_order(indices in proptest::collection::vec(0usize..50, 1..20)) {
        let mut f = ExprFactory::new();
        let vars: Vec<NumericExpr> = indices.iter().map(|&i| f.make_variable(i).into()).collect();
        let max: IteratedExpr = f.make_iterated(Kind::Max, &vars);
        let back: Vec<usize> = max
            .args(&f)
            .map(|a| f.cast::<mpflat_core::expr::Reference>(a).unwrap().index(&f))
            .collect();
        prop_assert_eq!(back, indices);
    }

    /// Piecewise-linear data is stored without loss
    #[test]
    fn pl_term_data_preserved(
        slopes in proptest::collection::vec(-10.0f64..10.0, 2..8),
        start in -100.0f64..100.0,
    ) {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let n = slopes.len() - 1;
        let breakpoints: Vec<f64> = (0..n).map(|i| start + i as f64).collect();
        let mut b = f.begin_pl_term(n);
        for i in 0..n {
            b.add_slope(slopes[i]);
            b.add_breakpoint(breakpoints[i]);
        }
        b.add_slope(slopes[n]);
        let pl = f.end_pl_term(b, x);
        prop_assert_eq!(pl.slopes(&f), slopes);
        prop_assert_eq!(pl.breakpoints(&f), breakpoints);
    }
}
