//! And, or, not, if-then-else and implication over binaries.

use super::{difference, expect_functional, sum_minus};
use crate::constraint::{AlgebraicConstraint, CmpOp, Comparison, Constraint, FuncExpr, IndicatorConstraint};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `r = and(x)`, `r = or(x)`, `r = not(x)`.
///
/// For `and`: `r <= x_i` keeps the true side, `r >= sum(x) - (n - 1)` the
/// false side. `or` is dual.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalConverter;

impl ConstraintConverter for LogicalConverter {
    fn name(&self) -> &'static str {
        "logical"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let (r, context) = (fc.result, fc.context);
        match &fc.expr {
            FuncExpr::And(args) => {
                if context.has_positive() {
                    for &x in args {
                        ctx.add_constraint(AlgebraicConstraint::le(difference(r, x), 0.0))?;
                    }
                }
                if context.has_negative() {
                    let n = args.len() as f64;
                    ctx.add_constraint(AlgebraicConstraint::le(sum_minus(args, r), n - 1.0))?;
                }
            }
            FuncExpr::Or(args) => {
                if context.has_negative() {
                    for &x in args {
                        ctx.add_constraint(AlgebraicConstraint::le(difference(x, r), 0.0))?;
                    }
                }
                if context.has_positive() {
                    ctx.add_constraint(AlgebraicConstraint::ge(sum_minus(args, r), 0.0))?;
                }
            }
            FuncExpr::Not(x) => {
                ctx.add_constraint(AlgebraicConstraint::eq(LinTerms::from_pairs([(1.0, r), (1.0, *x)]), 1.0))?;
            }
            other => {
                return Err(FlatError::invalid_operation(format!("logical converter received {}", other.kind())));
            }
        }
        Ok(())
    }
}

/// `r = cond ? a : b` via a pair of indicator equalities on `cond`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfThenConverter;

impl ConstraintConverter for IfThenConverter {
    fn name(&self) -> &'static str {
        "if-then"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let (cond, then_val, else_val) = match fc.expr {
            FuncExpr::IfThen {
                cond,
                then_val,
                else_val,
            }
            | FuncExpr::Implication {
                cond,
                then_val,
                else_val,
            } => (cond, then_val, else_val),
            ref other => {
                return Err(FlatError::invalid_operation(format!("if-then converter received {}", other.kind())));
            }
        };
        let r = fc.result;
        for (value, branch) in [(true, then_val), (false, else_val)] {
            let eq = Comparison::new(difference(r, branch), CmpOp::Eq, 0.0);
            ctx.add_constraint(IndicatorConstraint::new(cond, value, eq))?;
        }
        Ok(())
    }
}
