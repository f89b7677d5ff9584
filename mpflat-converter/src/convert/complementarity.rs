//! Complementarity into a logical disjunction.

use crate::constraint::{AlgebraicBody, CmpOp, Comparison, Constraint, FuncExpr};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `con ⟂ x` for a one-sided constraint and a one-sided variable.
///
/// With finite `con.lb` and `x.lb`: `x <= x.lb OR body <= con.lb`, plus the
/// constraint itself. The upper-bounded case is mirrored. An equality
/// constraint reduces to the constraint alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplementarityConverter;

impl ConstraintConverter for ComplementarityConverter {
    fn name(&self) -> &'static str {
        "complementarity"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let Constraint::Complementarity(cc) = con else {
            return Err(FlatError::invalid_operation(format!(
                "complementarity converter received {}",
                con.kind()
            )));
        };
        let (lb, ub) = (cc.con.lb, cc.con.ub);
        let (x_lb, x_ub) = ctx.bounds(cc.var);
        let x = cc.var;
        let body: AlgebraicBody = cc.con.body.clone();

        if lb == ub && lb.is_finite() {
            ctx.add_constraint(cc.con.clone())?;
            return Ok(());
        }
        let (var_side, body_side) = if lb.is_finite() && ub.is_infinite() && x_lb.is_finite() && x_ub.is_infinite() {
            (
                Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, x_lb),
                Comparison::new(body, CmpOp::Le, lb),
            )
        } else if ub.is_finite() && lb.is_infinite() && x_ub.is_finite() && x_lb.is_infinite() {
            let mut neg = body;
            neg.negate();
            (
                Comparison::new(LinTerms::single(-1.0, x), CmpOp::Le, -x_ub),
                Comparison::new(neg, CmpOp::Le, -ub),
            )
        } else {
            return Err(FlatError::conversion_failure(
                "ComplementarityBounds",
                format!(
                    "complementarity needs exactly one finite bound on the constraint \
                     [{lb}, {ub}] and the matching bound on {x} [{x_lb}, {x_ub}]"
                ),
            ));
        };
        let r1 = ctx.assign_result_var(FuncExpr::Conditional(var_side))?;
        let r2 = ctx.assign_result_var(FuncExpr::Conditional(body_side))?;
        let r = ctx.assign_result_var(FuncExpr::Or(vec![r1, r2]))?;
        ctx.fix_as_true(r)?;
        ctx.add_constraint(cc.con.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AlgebraicConstraint, ComplementarityConstraint, ConstraintKind};
    use crate::bounds::VarBounds;
    use crate::context::ConverterState;
    use crate::link::LinkContext;
    use crate::var::VarType;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    #[test]
    fn test_lower_bounded_complementarity() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, f64::INFINITY, VarType::Continuous);
        let y = ctx.add_var(-5.0, 5.0, VarType::Continuous);
        let cc = ComplementarityConstraint {
            con: AlgebraicConstraint::ge(LinTerms::single(1.0, y), 1.0),
            var: x,
        };
        ComplementarityConverter.convert(&mut ctx, &Constraint::Complementarity(cc), 0).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::CondLinLE).num_active(), 2);
        assert_eq!(m.keeper(ConstraintKind::Or).num_active(), 1);
        assert_eq!(m.keeper(ConstraintKind::LinGE).num_active(), 1);
        let (_, or) = m.keeper(ConstraintKind::Or).iter_active().next().unwrap();
        let r = or.result_var().unwrap();
        assert_eq!(m.lb(r), 1.0);
    }

    #[test]
    fn test_mismatched_bounds_fail() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 1.0, VarType::Continuous);
        let y = ctx.add_var(-5.0, 5.0, VarType::Continuous);
        let cc = ComplementarityConstraint {
            con: AlgebraicConstraint::ge(LinTerms::single(1.0, y), 1.0),
            var: x,
        };
        let err = ComplementarityConverter
            .convert(&mut ctx, &Constraint::Complementarity(cc), 0)
            .unwrap_err();
        assert_eq!(err.failure_key(), Some("ComplementarityBounds"));
    }
}
