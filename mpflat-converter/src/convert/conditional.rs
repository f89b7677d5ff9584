//! Conditional comparisons into indicator constraints.

use super::expect_functional;
use crate::bounds;
use crate::constraint::{CmpOp, Comparison, Constraint, Context, FuncExpr, IndicatorConstraint};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `r = (body op rhs)`.
///
/// `r = 1 ==> body op rhs` is added when the true side is needed and
/// `r = 0 ==> not (body op rhs)` when the false side is. Strict comparisons
/// are tightened by 1 on integer data, by the comparison tolerance
/// otherwise. The negation of an equality is a disjunction of `<` and `>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalConverter;

impl ConstraintConverter for ConditionalConverter {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let FuncExpr::Conditional(cmp) = &fc.expr else {
            return Err(FlatError::invalid_operation(format!(
                "conditional converter received {}",
                fc.expr.kind()
            )));
        };
        let r = fc.result;
        let integral = cmp.rhs.fract() == 0.0 && bounds::body_is_integer(&cmp.body, ctx.model());
        let eps = if integral { 1.0 } else { ctx.config().comparison_eps };

        if fc.context.has_positive() {
            let (op, rhs) = non_strict(cmp.op, cmp.rhs, eps);
            ctx.add_constraint(IndicatorConstraint::new(r, true, Comparison::new(cmp.body.clone(), op, rhs)))?;
        }
        if fc.context.has_negative() {
            match cmp.op.complement() {
                Some(neg) => {
                    let (op, rhs) = non_strict(neg, cmp.rhs, eps);
                    ctx.add_constraint(IndicatorConstraint::new(
                        r,
                        false,
                        Comparison::new(cmp.body.clone(), op, rhs),
                    ))?;
                }
                None => {
                    let lt = Comparison::new(cmp.body.clone(), CmpOp::Lt, cmp.rhs);
                    let gt = Comparison::new(cmp.body.clone(), CmpOp::Gt, cmp.rhs);
                    let r_lt = ctx.assign_result_var(FuncExpr::Conditional(lt))?;
                    let r_gt = ctx.assign_result_var(FuncExpr::Conditional(gt))?;
                    for v in [r_lt, r_gt] {
                        ctx.propagate_result(v, f64::NEG_INFINITY, f64::INFINITY, Context::Positive)?;
                    }
                    let sum = LinTerms::from_pairs([(1.0, r), (1.0, r_lt), (1.0, r_gt)]);
                    ctx.add_algebraic(sum, 1.0, f64::INFINITY)?;
                }
            }
        }
        Ok(())
    }
}

fn non_strict(op: CmpOp, rhs: f64, eps: f64) -> (CmpOp, f64) {
    match op {
        CmpOp::Lt => (CmpOp::Le, rhs - eps),
        CmpOp::Gt => (CmpOp::Ge, rhs + eps),
        other => (other, rhs),
    }
}
