//! End-to-end conversion tests against in-memory targets

use mpflat_converter::{
    AcceptanceLevel, AlgebraicBody, AlgebraicConstraint, CmpOp, CollectingSolver, Comparison, Constraint,
    ConstraintKind, ConverterConfig,
    ExprFlattener, FlatConverter, FuncExpr, IndicatorConstraint, LinTerms, LinearObjective, ModelValues, ObjSense,
    QuadTerms, QuadraticObjective, SolverCapabilities, SolverValues, VarId, VarType,
};
use mpflat_core::{ExprFactory, Kind};
use std::collections::BTreeMap;

fn row_solver() -> CollectingSolver {
    CollectingSolver::new("rows")
        .accept(ConstraintKind::LinLE, AcceptanceLevel::Recommended)
        .accept(ConstraintKind::LinGE, AcceptanceLevel::Recommended)
        .accept(ConstraintKind::LinEQ, AcceptanceLevel::Recommended)
}

/// Every constraint the target received is of a kind it accepts
fn assert_native(solver: &CollectingSolver) {
    for con in &solver.constraints {
        assert!(
            solver.acceptance_level(con.kind()).is_accepted(),
            "{} reached {} unconverted",
            con.kind(),
            solver.name()
        );
    }
}

fn sum(vars: &[VarId]) -> LinTerms {
    LinTerms::from_pairs(vars.iter().map(|&v| (1.0, v)))
}

#[test]
fn test_range_split_and_dual_postsolve() {
    let mut conv = FlatConverter::new(row_solver(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    let y = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    conv.add_constraint(AlgebraicConstraint::new(sum(&[x, y]), 1.0, 3.0)).unwrap();
    conv.add_objective(LinearObjective::new(ObjSense::Minimize, sum(&[x, y]), "cost")).unwrap();
    let report = conv.finish_model_input().unwrap();

    assert_eq!(conv.solver().count(ConstraintKind::LinLE), 1);
    assert_eq!(conv.solver().count(ConstraintKind::LinGE), 1);
    assert_eq!(report.stats.converted, 1);
    assert!(conv.solver().finished);

    let sol = SolverValues {
        primal: vec![1.0, 0.0],
        duals: BTreeMap::from([(ConstraintKind::LinLE, vec![0.0]), (ConstraintKind::LinGE, vec![2.5])]),
        objs: vec![1.0],
    };
    let post = conv.postsolve_solution(&sol).unwrap();
    assert_eq!(post.vars, vec![1.0, 0.0]);
    assert_eq!(post.cons["LinConRange"], vec![2.5]);
    assert_eq!(post.objs, vec![1.0]);
}

#[test]
fn test_warm_start_presolve() {
    let mut conv = FlatConverter::new(row_solver(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    let y = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    conv.add_constraint(AlgebraicConstraint::new(sum(&[x, y]), 1.0, 3.0)).unwrap();
    conv.finish_model_input().unwrap();

    let start = ModelValues {
        vars: vec![2.0, 3.0],
        cons: BTreeMap::from([("LinConRange".to_string(), vec![-1.0])]),
        objs: Vec::new(),
    };
    let pre = conv.presolve_solution(&start).unwrap();
    assert_eq!(pre.primal, vec![2.0, 3.0]);
    assert_eq!(pre.duals[&ConstraintKind::LinLE], vec![-1.0]);
    assert_eq!(pre.duals[&ConstraintKind::LinGE], vec![-1.0]);
}

#[test]
fn test_postsolve_rejects_wrong_row_count() {
    let mut conv = FlatConverter::new(row_solver(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 1.0, VarType::Continuous).unwrap();
    conv.add_constraint(AlgebraicConstraint::le(sum(&[x]), 1.0)).unwrap();
    conv.finish_model_input().unwrap();
    let sol = SolverValues {
        primal: vec![0.5],
        duals: BTreeMap::from([(ConstraintKind::LinLE, vec![0.0, 1.0])]),
        objs: Vec::new(),
    };
    assert!(conv.postsolve_solution(&sol).is_err());
}

#[test]
fn test_unsupported_without_converter() {
    let mut conv = FlatConverter::new(CollectingSolver::linear(), ConverterConfig::default()).unwrap();
    conv.registry_mut().unregister(ConstraintKind::Max);
    let x = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let y = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let r = conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
    conv.add_constraint(AlgebraicConstraint::le(sum(&[r]), 3.0)).unwrap();
    let err = conv.finish_model_input().unwrap_err();
    assert!(err.is_unsupported(), "{err}");
    assert!(err.to_string().contains("MaxConstraint"));
}

#[test]
fn test_logical_model_reaches_fixed_point() {
    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(-5.0, 5.0, VarType::Integer).unwrap();
    let y = conv.add_var(-5.0, 5.0, VarType::Integer).unwrap();
    let r = conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
    let a = conv.assign_result_var(FuncExpr::Abs(x)).unwrap();
    let b1 = conv
        .assign_result_var(FuncExpr::Conditional(Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 2.0)))
        .unwrap();
    let b2 = conv
        .assign_result_var(FuncExpr::Conditional(Comparison::new(LinTerms::single(1.0, y), CmpOp::Ge, 1.0)))
        .unwrap();
    let or = conv.assign_result_var(FuncExpr::Or(vec![b1, b2])).unwrap();
    conv.fix_as_true(or).unwrap();
    conv.add_constraint(AlgebraicConstraint::le(sum(&[r, a]), 8.0)).unwrap();

    let report = conv.finish_model_input().unwrap();
    assert_native(conv.solver());
    assert!(report.stats.converted >= 5);
    assert_eq!(conv.solver().count(ConstraintKind::Max), 0);
    assert!(conv.solver().count(ConstraintKind::IndicatorLinLE) > 0);
    assert!(conv.solver().types.iter().filter(|&&t| t == VarType::Integer).count() > 2);
}

#[test]
fn test_indicator_without_bound_fails() {
    let mut conv = FlatConverter::new(CollectingSolver::linear(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, f64::INFINITY, VarType::Continuous).unwrap();
    let b = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    conv.add_constraint(IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 5.0)))
        .unwrap();
    let err = conv.finish_model_input().unwrap_err();
    assert_eq!(err.failure_key(), Some("IndicatorInfBound"));
    assert!(err.to_string().contains("cvt:mip:bigM"));
}

#[test]
fn test_indicator_with_default_big_m() {
    let mut cfg = ConverterConfig::default();
    cfg.set_option("cvt:mip:bigM", "1000").unwrap();
    let mut conv = FlatConverter::new(CollectingSolver::linear(), cfg).unwrap();
    let x = conv.add_var(0.0, f64::INFINITY, VarType::Continuous).unwrap();
    let b = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    conv.add_constraint(IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 5.0)))
        .unwrap();
    conv.finish_model_input().unwrap();
    assert_native(conv.solver());
    assert_eq!(conv.solver().count(ConstraintKind::LinLE), 1);
}

#[test]
fn test_failed_conversion_kept_when_accepted() {
    let solver = CollectingSolver::linear().accept(ConstraintKind::IndicatorLinLE, AcceptanceLevel::AcceptedButNotRecommended);
    let mut conv = FlatConverter::new(solver, ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, f64::INFINITY, VarType::Continuous).unwrap();
    let b = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    conv.add_constraint(IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 5.0)))
        .unwrap();
    let report = conv.finish_model_input().unwrap();
    assert_eq!(conv.solver().count(ConstraintKind::IndicatorLinLE), 1);
    assert!(report.warnings.get("IndicatorInfBound").is_some());
}

#[test]
fn test_unused_definition_eliminated() {
    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let y = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let r = conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
    conv.add_constraint(AlgebraicConstraint::le(sum(&[x, y]), 6.0)).unwrap();
    let report = conv.finish_model_input().unwrap();

    assert_eq!(conv.solver().constraints.len(), 1);
    assert_eq!(report.stats.init_exprs_eliminated, 1);
    assert_eq!(conv.solver().lbs[r.index()], 0.0);
    assert_eq!(conv.solver().ubs[r.index()], 0.0);
}

#[test]
fn test_dedup_returns_same_result() {
    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let y = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
    let r1 = conv.assign_result_var(FuncExpr::Min(vec![x, y])).unwrap();
    let r2 = conv.assign_result_var(FuncExpr::Min(vec![x, y])).unwrap();
    assert_eq!(r1, r2);
    assert_eq!(conv.model().keeper(ConstraintKind::Min).len(), 1);
    assert_eq!(conv.state().stats().map_hits, 1);
}

#[test]
fn test_narrowing_to_empty_domain_is_infeasible() {
    let mut conv = FlatConverter::new(CollectingSolver::linear(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    let err = conv.context().narrow_var_bounds(x, 5.0, 3.0).unwrap_err();
    assert!(err.is_infeasible());
    assert!(!err.is_conversion_failure());
}

#[test]
fn test_relaxed_integrality() {
    let mut cfg = ConverterConfig::default();
    cfg.set_option("alg:relax", "1").unwrap();
    let mut conv = FlatConverter::new(CollectingSolver::linear(), cfg).unwrap();
    let x = conv.add_var(0.0, 3.0, VarType::Integer).unwrap();
    conv.add_constraint(AlgebraicConstraint::ge(sum(&[x]), 1.0)).unwrap();
    conv.finish_model_input().unwrap();
    assert!(conv.solver().types.iter().all(|&t| t == VarType::Continuous));
}

#[test]
fn test_quadratic_objective_passed_through() {
    let solver = CollectingSolver::linear().with_quadratic_objective();
    let mut conv = FlatConverter::new(solver, ConverterConfig::default()).unwrap();
    let x = conv.add_var(-1.0, 1.0, VarType::Continuous).unwrap();
    let lin = LinearObjective::new(ObjSense::Minimize, LinTerms::single(1.0, x), "q");
    conv.add_objective(QuadraticObjective::new(lin, QuadTerms::from_triples([(1.0, x, x)]))).unwrap();
    conv.finish_model_input().unwrap();
    assert_eq!(conv.solver().objectives[0].quad.len(), 1);
    assert_eq!(conv.model().keeper(ConstraintKind::QuadraticFunctional).len(), 0);
}

#[test]
fn test_graph_export_writes_json_lines() {
    let path = std::env::temp_dir().join(format!("mpflat_graph_{}.jsonl", std::process::id()));
    let mut cfg = ConverterConfig::default();
    cfg.set_option("tech:writegraph", path.to_str().unwrap()).unwrap();
    let mut conv = FlatConverter::new(row_solver(), cfg).unwrap();
    let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    conv.add_constraint(AlgebraicConstraint::new(sum(&[x]), 1.0, 3.0)).unwrap();
    let report = conv.finish_model_input().unwrap();

    let records = report.graph_records.unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(records > 0);
    assert_eq!(text.lines().count(), records);
    for line in text.lines() {
        let _: serde_json::Value = serde_json::from_str(line).unwrap();
    }
}

#[test]
fn test_flattened_model_end_to_end() {
    let mut f = ExprFactory::new();
    let x = f.make_variable(0);
    let y = f.make_variable(1);
    let diff = f.make_binary(Kind::Sub, x, y);
    let abs = f.make_unary(Kind::Abs, diff);
    let one = f.make_numeric_constant(1.0);
    let three = f.make_numeric_constant(3.0);
    let x_ge = f.make_relational(Kind::Ge, x, one);
    let y_ge = f.make_relational(Kind::Ge, y, one);
    let either = f.make_binary_logical(Kind::Or, x_ge, y_ge);
    let two = f.make_numeric_constant(2.0);
    let twice = f.make_binary(Kind::Mul, two, x);
    let lin = f.make_binary(Kind::Add, twice, y);
    let obj = f.make_binary(Kind::Add, lin, three);

    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let vars = conv
        .add_vars(&[0.0, 0.0], &[5.0, 5.0], &[VarType::Integer, VarType::Integer])
        .unwrap();
    let mut fl = ExprFlattener::new(&f, vars);
    fl.add_algebraic_constraint(&mut conv, abs.into(), f64::NEG_INFINITY, 3.0).unwrap();
    fl.add_logical_constraint(&mut conv, either.into()).unwrap();
    fl.add_objective(&mut conv, ObjSense::Minimize, obj.into(), "obj").unwrap();
    conv.finish_model_input().unwrap();
    assert_native(conv.solver());

    let obj = &conv.solver().objectives[0];
    assert_eq!(obj.lin.terms.len(), 3);
    let one_var = obj.lin.terms.vars()[2];
    assert_eq!(conv.solver().lbs[one_var.index()], 1.0);
    assert_eq!(conv.solver().ubs[one_var.index()], 1.0);

    let n = conv.model().num_vars();
    let mut primal = vec![0.0; n];
    primal[0] = 1.0;
    primal[1] = 4.0;
    let sol = SolverValues {
        primal,
        duals: BTreeMap::new(),
        objs: vec![9.0],
    };
    let post = conv.postsolve_solution(&sol).unwrap();
    assert_eq!(post.vars, vec![1.0, 4.0]);
    assert_eq!(post.objs, vec![9.0]);
}

/// Whether the target received `terms <= ub` as a linear row
fn has_le_row(solver: &CollectingSolver, terms: &[(f64, VarId)], ub: f64) -> bool {
    let mut want = terms.to_vec();
    want.sort_by_key(|&(_, v)| v);
    solver.constraints.iter().any(|con| match con {
        Constraint::Algebraic(AlgebraicConstraint {
            body: AlgebraicBody::Linear(l),
            lb,
            ub: row_ub,
        }) => {
            let mut got: Vec<_> = l.iter().collect();
            got.sort_by_key(|&(_, v)| v);
            *lb == f64::NEG_INFINITY && *row_ub == ub && got == want
        }
        _ => false,
    })
}

#[test]
fn test_row_use_survives_branch_context() {
    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let x1 = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    let x2 = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    let c = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    let y = conv.add_var(0.0, 1.0, VarType::Integer).unwrap();
    let r = conv.assign_result_var(FuncExpr::Or(vec![x1, x2])).unwrap();
    let v = conv
        .assign_result_var(FuncExpr::IfThen {
            cond: c,
            then_val: r,
            else_val: y,
        })
        .unwrap();
    conv.fix_as_true(v).unwrap();
    conv.add_constraint(AlgebraicConstraint::le(sum(&[r]), 0.0)).unwrap();
    conv.finish_model_input().unwrap();
    assert_native(conv.solver());

    // or(x1, x2) <= 0 must force both disjuncts down
    assert!(has_le_row(conv.solver(), &[(1.0, x1), (-1.0, r)], 0.0));
    assert!(has_le_row(conv.solver(), &[(1.0, x2), (-1.0, r)], 0.0));
}

#[test]
fn test_practically_infinite_side_dropped() {
    let mut conv = FlatConverter::new(row_solver(), ConverterConfig::default()).unwrap();
    let x = conv.add_var(0.0, 10.0, VarType::Continuous).unwrap();
    conv.add_constraint(AlgebraicConstraint::new(sum(&[x]), -1e30, 5.0)).unwrap();
    let report = conv.finish_model_input().unwrap();
    assert_eq!(conv.solver().count(ConstraintKind::LinLE), 1);
    assert_eq!(conv.solver().count(ConstraintKind::LinGE), 0);
    assert_eq!(report.stats.converted, 0);

    let sol = SolverValues {
        primal: vec![5.0],
        duals: BTreeMap::from([(ConstraintKind::LinLE, vec![-1.5])]),
        objs: Vec::new(),
    };
    let post = conv.postsolve_solution(&sol).unwrap();
    assert_eq!(post.cons["LinConLE"], vec![-1.5]);
}
