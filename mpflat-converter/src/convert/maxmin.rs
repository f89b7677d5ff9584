//! Max, min and abs as MIP.

use super::{difference, expect_functional};
use crate::constraint::{AlgebraicConstraint, CmpOp, Comparison, Constraint, FuncExpr, IndicatorConstraint};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// `r = max(x)` / `r = min(x)`.
///
/// The bounding rows `r >= x_i` (resp. `<=`) are needed when the result is
/// used decreasingly; the selection binaries with `b_i = 1 ==> r = x_i` when
/// it is used increasingly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxMinConverter;

impl ConstraintConverter for MaxMinConverter {
    fn name(&self) -> &'static str {
        "max/min"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let r = fc.result;
        // `sign` flips the rows for min
        let (args, sign, bound_side, select_side) = match &fc.expr {
            FuncExpr::Max(a) => (a, 1.0, fc.context.has_negative(), fc.context.has_positive()),
            FuncExpr::Min(a) => (a, -1.0, fc.context.has_positive(), fc.context.has_negative()),
            other => {
                return Err(FlatError::invalid_operation(format!("max/min converter received {}", other.kind())));
            }
        };
        if bound_side {
            for &x in args {
                let mut body = difference(x, r);
                body.scale(sign);
                ctx.add_constraint(AlgebraicConstraint::le(body, 0.0))?;
            }
        }
        if select_side {
            select_one(ctx, r, args, sign)?;
        }
        Ok(())
    }
}

/// Binaries `b_i` with `sum b = 1` and `b_i = 1 ==> sign * (r - x_i) <= 0`.
fn select_one(ctx: &mut ConversionContext<'_>, r: VarId, args: &[VarId], sign: f64) -> Result<()> {
    let flags: Vec<VarId> = (0..args.len()).map(|_| ctx.add_binary()).collect();
    let sum = LinTerms::from_pairs(flags.iter().map(|&b| (1.0, b)));
    ctx.add_constraint(AlgebraicConstraint::eq(sum, 1.0))?;
    for (&x, &b) in args.iter().zip(&flags) {
        let mut body = difference(r, x);
        body.scale(sign);
        ctx.add_constraint(IndicatorConstraint::new(b, true, Comparison::new(body, CmpOp::Le, 0.0)))?;
    }
    Ok(())
}

/// `r = |x|`.
///
/// Sign-definite arguments become a linear equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsConverter;

impl ConstraintConverter for AbsConverter {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let FuncExpr::Abs(x) = fc.expr else {
            return Err(FlatError::invalid_operation(format!("abs converter received {}", fc.expr.kind())));
        };
        let r = fc.result;
        let (lb, ub) = ctx.bounds(x);
        if lb >= 0.0 {
            ctx.add_constraint(AlgebraicConstraint::eq(difference(x, r), 0.0))?;
            return Ok(());
        }
        if ub <= 0.0 {
            ctx.add_constraint(AlgebraicConstraint::eq(LinTerms::from_pairs([(1.0, x), (1.0, r)]), 0.0))?;
            return Ok(());
        }
        if fc.context.has_negative() {
            // r >= x, r >= -x
            ctx.add_constraint(AlgebraicConstraint::le(difference(x, r), 0.0))?;
            ctx.add_constraint(AlgebraicConstraint::le(LinTerms::from_pairs([(-1.0, x), (-1.0, r)]), 0.0))?;
        }
        if fc.context.has_positive() {
            let b = ctx.add_binary();
            ctx.add_constraint(IndicatorConstraint::new(b, true, Comparison::new(difference(r, x), CmpOp::Le, 0.0)))?;
            let neg = LinTerms::from_pairs([(1.0, r), (1.0, x)]);
            ctx.add_constraint(IndicatorConstraint::new(b, false, Comparison::new(neg, CmpOp::Le, 0.0)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, Context};
    use crate::context::ConverterState;
    use crate::link::LinkContext;
    use crate::var::VarType;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    fn state() -> ConverterState {
        ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended)
    }

    #[test]
    fn test_max_full_context() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 5.0, VarType::Continuous);
        let y = ctx.add_var(1.0, 3.0, VarType::Continuous);
        let r = ctx.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
        let con = st.model().keeper(ConstraintKind::Max).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        MaxMinConverter.convert(&mut ctx, &con, 0).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::LinLE).num_active(), 2);
        assert_eq!(m.keeper(ConstraintKind::LinEQ).num_active(), 1);
        assert_eq!(m.keeper(ConstraintKind::IndicatorLinLE).num_active(), 2);
        assert_eq!(con.result_var(), Some(r));
    }

    #[test]
    fn test_max_negative_context_needs_bounds_only() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 5.0, VarType::Continuous);
        let y = ctx.add_var(1.0, 3.0, VarType::Continuous);
        let r = ctx.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
        ctx.propagate_result(r, f64::NEG_INFINITY, 4.0, Context::Negative).unwrap();
        let con = st.model().keeper(ConstraintKind::Max).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        MaxMinConverter.convert(&mut ctx, &con, 0).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::LinLE).num_active(), 2);
        assert_eq!(m.keeper(ConstraintKind::IndicatorLinLE).num_active(), 0);
    }

    #[test]
    fn test_abs_of_nonnegative_is_identity() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(2.0, 5.0, VarType::Continuous);
        let r = ctx.assign_result_var(FuncExpr::Abs(x)).unwrap();
        let con = st.model().keeper(ConstraintKind::Abs).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        AbsConverter.convert(&mut ctx, &con, 0).unwrap();
        assert_eq!(st.model().keeper(ConstraintKind::LinEQ).num_active(), 1);
        assert_eq!(st.model().keeper(ConstraintKind::IndicatorLinLE).num_active(), 0);
        assert_eq!(con.result_var(), Some(r));
    }

    #[test]
    fn test_abs_mixed_sign() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(-2.0, 5.0, VarType::Continuous);
        ctx.assign_result_var(FuncExpr::Abs(x)).unwrap();
        let con = st.model().keeper(ConstraintKind::Abs).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        AbsConverter.convert(&mut ctx, &con, 0).unwrap();
        assert_eq!(st.model().keeper(ConstraintKind::LinLE).num_active(), 2);
        assert_eq!(st.model().keeper(ConstraintKind::IndicatorLinLE).num_active(), 2);
    }
}
