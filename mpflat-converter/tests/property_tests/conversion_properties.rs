//! Conversion invariants over randomly generated models

use mpflat_converter::{
    AlgebraicConstraint, CmpOp, CollectingSolver, Comparison, ConstraintKind, ConverterConfig, FlatConverter, FuncExpr,
    LinTerms, SolverCapabilities, SolverValues, VarId, VarType,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn functional(kind: u8, args: Vec<VarId>) -> FuncExpr {
    match kind % 3 {
        0 => FuncExpr::Max(args),
        1 => FuncExpr::Min(args),
        _ => FuncExpr::Abs(args[0]),
    }
}

proptest! {
    /// Assigning the same functional expression twice yields the same variable
    #[test]
    fn dedup_is_idempotent(kind in 0u8..3, picks in prop::collection::vec(0usize..4, 1..4)) {
        let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
        let vars: Vec<VarId> = (0..4)
            .map(|_| conv.add_var(-3.0, 3.0, VarType::Continuous).unwrap())
            .collect();
        let args: Vec<VarId> = picks.iter().map(|&i| vars[i]).collect();
        let first = conv.assign_result_var(functional(kind, args.clone())).unwrap();
        let kept = conv.model().num_active_constraints();
        let second = conv.assign_result_var(functional(kind, args)).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(conv.model().num_active_constraints(), kept);
    }

    /// The dual of a split range is the sum of its two halves
    #[test]
    fn range_dual_is_sum_of_halves(le in -50.0f64..50.0, ge in -50.0f64..50.0) {
        let solver = CollectingSolver::new("rows")
            .accept(ConstraintKind::LinLE, mpflat_converter::AcceptanceLevel::Recommended)
            .accept(ConstraintKind::LinGE, mpflat_converter::AcceptanceLevel::Recommended);
        let mut conv = FlatConverter::new(solver, ConverterConfig::default()).unwrap();
        let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
        conv.add_constraint(AlgebraicConstraint::new(LinTerms::single(1.0, x), 1.0, 3.0)).unwrap();
        conv.finish_model_input().unwrap();

        let sol = SolverValues {
            primal: vec![2.0],
            duals: BTreeMap::from([(ConstraintKind::LinLE, vec![le]), (ConstraintKind::LinGE, vec![ge])]),
            objs: Vec::new(),
        };
        let post = conv.postsolve_solution(&sol).unwrap();
        prop_assert_eq!(post.cons["LinConRange"].clone(), vec![le + ge]);
    }

    /// Primal values of original variables survive postsolve unchanged
    #[test]
    fn primal_values_pass_through(values in prop::collection::vec(-100.0f64..100.0, 1..8)) {
        let mut conv = FlatConverter::new(CollectingSolver::linear(), ConverterConfig::default()).unwrap();
        let vars: Vec<VarId> = values
            .iter()
            .map(|_| conv.add_var(-100.0, 100.0, VarType::Continuous).unwrap())
            .collect();
        let all = LinTerms::from_pairs(vars.iter().map(|&v| (1.0, v)));
        conv.add_constraint(AlgebraicConstraint::le(all, 1000.0)).unwrap();
        conv.finish_model_input().unwrap();

        let sol = SolverValues { primal: values.clone(), duals: BTreeMap::new(), objs: Vec::new() };
        let post = conv.postsolve_solution(&sol).unwrap();
        prop_assert_eq!(post.vars, values);
    }

    /// Narrowing keeps the intersection, or fails when it is empty
    #[test]
    fn narrowing_intersects_domains(lb in -10.0f64..10.0, width in -5.0f64..5.0) {
        let mut conv = FlatConverter::new(CollectingSolver::linear(), ConverterConfig::default()).unwrap();
        let x = conv.add_var(-4.0, 4.0, VarType::Continuous).unwrap();
        let ub = lb + width;
        let mut ctx = conv.context();
        let res = ctx.narrow_var_bounds(x, lb, ub);
        let (new_lb, new_ub) = (lb.max(-4.0), ub.min(4.0));
        if new_lb > new_ub {
            prop_assert!(res.unwrap_err().is_infeasible());
        } else {
            prop_assert!(res.is_ok());
            prop_assert_eq!(ctx.bounds(x), (new_lb, new_ub));
        }
    }

    /// A MIP target only ever receives kinds it accepts
    #[test]
    fn conversion_reaches_native_fixed_point(
        kinds in prop::collection::vec(0u8..5, 1..6),
        rhs in -3i32..3,
    ) {
        let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
        let x = conv.add_var(-4.0, 4.0, VarType::Integer).unwrap();
        let y = conv.add_var(-4.0, 4.0, VarType::Integer).unwrap();
        let mut used = Vec::new();
        for k in kinds {
            let r = match k {
                0 => conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap(),
                1 => conv.assign_result_var(FuncExpr::Min(vec![x, y])).unwrap(),
                2 => conv.assign_result_var(FuncExpr::Abs(x)).unwrap(),
                3 => conv
                    .assign_result_var(FuncExpr::Conditional(Comparison::new(
                        LinTerms::single(1.0, y),
                        CmpOp::Le,
                        f64::from(rhs),
                    )))
                    .unwrap(),
                _ => conv
                    .assign_result_var(FuncExpr::Conditional(Comparison::new(
                        LinTerms::single(1.0, x),
                        CmpOp::Ge,
                        f64::from(rhs),
                    )))
                    .unwrap(),
            };
            used.push(r);
        }
        used.dedup();
        let all = LinTerms::from_pairs(used.iter().map(|&v| (1.0, v)));
        conv.add_constraint(AlgebraicConstraint::le(all, 100.0)).unwrap();
        conv.finish_model_input().unwrap();

        let solver = conv.solver();
        for con in &solver.constraints {
            prop_assert!(solver.acceptance_level(con.kind()).is_accepted(), "{} reached the target", con.kind());
        }
    }
}
