//! Count, numberof and alldiff.

use super::{expect_functional, sum_minus};
use crate::constraint::{AlgebraicConstraint, CmpOp, Comparison, Constraint, Context, FuncExpr};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// Domains wider than this are not expanded value by value.
const MAX_ALLDIFF_VALUES: f64 = 1e6;

/// `r = count(x)`, `r = numberof k in (x)`, `r = numberof y in (x)`.
///
/// Each comparison becomes a conditional equality; `r` is their sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingConverter;

impl ConstraintConverter for CountingConverter {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let r = fc.result;
        let flags: Vec<VarId> = match &fc.expr {
            FuncExpr::Count(args) => args.clone(),
            FuncExpr::NumberofConst { value, args } => {
                let mut flags = Vec::with_capacity(args.len());
                for &x in args {
                    let cmp = Comparison::new(LinTerms::single(1.0, x), CmpOp::Eq, *value);
                    flags.push(equality_flag(ctx, cmp)?);
                }
                flags
            }
            FuncExpr::NumberofVar { value, args } => {
                let mut flags = Vec::with_capacity(args.len());
                for &x in args {
                    let cmp = Comparison::new(LinTerms::from_pairs([(1.0, x), (-1.0, *value)]), CmpOp::Eq, 0.0);
                    flags.push(equality_flag(ctx, cmp)?);
                }
                flags
            }
            other => {
                return Err(FlatError::invalid_operation(format!("counting converter received {}", other.kind())));
            }
        };
        ctx.add_constraint(AlgebraicConstraint::eq(sum_minus(&flags, r), 0.0))?;
        Ok(())
    }
}

fn equality_flag(ctx: &mut ConversionContext<'_>, cmp: Comparison) -> Result<VarId> {
    let b = ctx.assign_result_var(FuncExpr::Conditional(cmp))?;
    ctx.propagate_result(b, f64::NEG_INFINITY, f64::INFINITY, Context::Mixed)?;
    Ok(b)
}

/// `alldiff(x)` asserted true.
///
/// For every value `v` in the union of the integer domains,
/// `sum_i (x_i == v) <= 1`. Only valid at the root, where the result is
/// fixed to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllDiffConverter;

impl ConstraintConverter for AllDiffConverter {
    fn name(&self) -> &'static str {
        "alldiff"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let FuncExpr::AllDiff(args) = &fc.expr else {
            return Err(FlatError::invalid_operation(format!("alldiff converter received {}", fc.expr.kind())));
        };
        if ctx.lb(fc.result) < 1.0 {
            return Err(FlatError::conversion_failure(
                "AllDiffContext",
                "alldiff can only be linearized when it is asserted true; \
                 reformulate the model or use a solver accepting it (acc:alldiff)",
            ));
        }
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &x in args {
            let (lb, ub) = ctx.bounds(x);
            if !ctx.is_integer(x) || lb.is_infinite() || ub.is_infinite() {
                return Err(FlatError::conversion_failure(
                    "AllDiffInfBound",
                    format!("alldiff argument {x} needs to be integer with finite bounds, has [{lb}, {ub}]"),
                ));
            }
            lo = lo.min(lb);
            hi = hi.max(ub);
        }
        if args.is_empty() {
            return Ok(());
        }
        if hi - lo > MAX_ALLDIFF_VALUES {
            return Err(FlatError::conversion_failure(
                "AllDiffInfBound",
                format!("alldiff domain [{lo}, {hi}] is too wide to expand"),
            ));
        }
        let mut v = lo;
        while v <= hi {
            let mut flags = Vec::new();
            for &x in args {
                let (lb, ub) = ctx.bounds(x);
                if lb <= v && v <= ub {
                    let cmp = Comparison::new(LinTerms::single(1.0, x), CmpOp::Eq, v);
                    let b = ctx.assign_result_var(FuncExpr::Conditional(cmp))?;
                    ctx.propagate_result(b, f64::NEG_INFINITY, f64::INFINITY, Context::Negative)?;
                    flags.push(b);
                }
            }
            if flags.len() > 1 {
                let sum = LinTerms::from_pairs(flags.iter().map(|&b| (1.0, b)));
                ctx.add_constraint(AlgebraicConstraint::le(sum, 1.0))?;
            }
            v += 1.0;
        }
        Ok(())
    }
}
