//! Expression flattening over random affine trees

use mpflat_converter::{ConversionContext, ConverterState, ExprFlattener, LinkContext, VarType};
use mpflat_core::{AcceptanceLevel, ConverterConfig, ExprFactory, Kind, NumericExpr};
use proptest::prelude::*;

fn state() -> ConverterState {
    ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended)
}

proptest! {
    /// `sum c_i x_i + k` flattens to the same affine form with no new rows
    #[test]
    fn affine_tree_keeps_coefficients(
        coefs in prop::collection::vec(1i32..10, 1..5),
        k in -20i32..20,
    ) {
        let mut f = ExprFactory::new();
        let mut tree: NumericExpr = f.make_numeric_constant(f64::from(k)).into();
        for (i, &c) in coefs.iter().enumerate() {
            let c = f.make_numeric_constant(f64::from(c));
            let x = f.make_variable(i);
            let term = f.make_binary(Kind::Mul, c, x);
            tree = f.make_binary(Kind::Add, tree, term).into();
        }

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(coefs.len(), -1.0, 1.0, VarType::Continuous);
        let mut fl = ExprFlattener::new(&f, vars.clone());
        let q = fl.flatten_numeric(&mut ctx, tree).unwrap();
        prop_assert!(q.is_affine());
        prop_assert_eq!(q.constant, f64::from(k));

        let mut got = vec![0.0; coefs.len()];
        for (c, v) in q.terms.lin.iter() {
            let i = vars.iter().position(|&w| w == v).unwrap();
            got[i] += c;
        }
        let want: Vec<f64> = coefs.iter().map(|&c| f64::from(c)).collect();
        prop_assert_eq!(got, want);
        drop(ctx);
        prop_assert_eq!(st.model().num_active_constraints(), 0);
    }

    /// Arithmetic on constants folds to a single constant
    #[test]
    fn constant_arithmetic_folds(a in -100i32..100, b in -100i32..100, op in 0u8..3) {
        let (kind, want) = match op {
            0 => (Kind::Add, f64::from(a) + f64::from(b)),
            1 => (Kind::Sub, f64::from(a) - f64::from(b)),
            _ => (Kind::Mul, f64::from(a) * f64::from(b)),
        };
        let mut f = ExprFactory::new();
        let lhs = f.make_numeric_constant(f64::from(a));
        let rhs = f.make_numeric_constant(f64::from(b));
        let e = f.make_binary(kind, lhs, rhs);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let mut fl = ExprFlattener::new(&f, Vec::new());
        let q = fl.flatten_numeric(&mut ctx, e.into()).unwrap();
        prop_assert!(q.terms.lin.is_empty());
        prop_assert!(q.terms.quad.is_empty());
        prop_assert_eq!(q.constant, want);
    }
}
