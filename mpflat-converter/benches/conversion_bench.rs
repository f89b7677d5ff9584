//! Benchmarks for flat model conversion

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use mpflat_converter::{
    AlgebraicConstraint, CmpOp, CollectingSolver, Comparison, ConverterConfig, FlatConverter, FuncExpr, LinTerms,
    LinearObjective, ObjSense, VarId, VarType,
};
use std::hint::black_box;

/// A chain of max/abs/conditional definitions over `n` integer variables
fn build_model(n: usize) -> FlatConverter<CollectingSolver> {
    let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
    let xs: Vec<VarId> = (0..n).map(|_| conv.add_var(-10.0, 10.0, VarType::Integer).unwrap()).collect();
    let mut used = Vec::with_capacity(n * 3);
    for w in xs.windows(2) {
        used.push(conv.assign_result_var(FuncExpr::Max(vec![w[0], w[1]])).unwrap());
        used.push(conv.assign_result_var(FuncExpr::Abs(w[0])).unwrap());
        let cmp = Comparison::new(LinTerms::from_pairs([(1.0, w[0]), (-1.0, w[1])]), CmpOp::Le, 0.0);
        used.push(conv.assign_result_var(FuncExpr::Conditional(cmp)).unwrap());
    }
    let total = LinTerms::from_pairs(used.iter().map(|&v| (1.0, v)));
    conv.add_constraint(AlgebraicConstraint::le(total.clone(), 1000.0)).unwrap();
    conv.add_objective(LinearObjective::new(ObjSense::Minimize, total, "obj")).unwrap();
    conv
}

fn bench_finish_model_input(c: &mut Criterion) {
    for n in [10, 100] {
        c.bench_function(&format!("finish_model_input_{n}"), |b| {
            b.iter_batched(
                || build_model(n),
                |mut conv| black_box(conv.finish_model_input().unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_dedup_lookup(c: &mut Criterion) {
    c.bench_function("assign_result_dedup", |b| {
        let mut conv = build_model(50);
        let x = VarId::new(0);
        let y = VarId::new(1);
        b.iter(|| black_box(conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap()))
    });
}

criterion_group!(benches, bench_finish_model_input, bench_dedup_lookup);
criterion_main!(benches);
