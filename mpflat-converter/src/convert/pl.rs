//! Piecewise-linear functions via SOS2.

use super::expect_functional;
use crate::constraint::{AlgebraicConstraint, Constraint, FuncExpr, SosConstraint, SosOrder};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use crate::var::{VarId, VarType};
use mpflat_core::{FlatError, Result};

/// `r = pl(x)` as a convex combination of neighbouring breakpoints.
///
/// `lambda_k >= 0`, `sum lambda = 1`, `x = sum p_k lambda_k`,
/// `r = sum f(p_k) lambda_k`, and `lambda` is SOS2. An unbounded argument
/// is clipped to the approximation domain with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlConverter;

impl ConstraintConverter for PlConverter {
    fn name(&self) -> &'static str {
        "pl"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let FuncExpr::Pl { pl, arg } = &fc.expr else {
            return Err(FlatError::invalid_operation(format!("pl converter received {}", fc.expr.kind())));
        };
        let (x, r) = (*arg, fc.result);
        let (mut lb, mut ub) = ctx.bounds(x);
        let bound = ctx.config().pl_domain_bound;
        if lb.is_infinite() || ub.is_infinite() {
            lb = lb.max(-bound);
            ub = ub.min(bound);
            ctx.add_warning(
                "PLApproxDomain",
                format!("argument {x} of a piecewise-linear function restricted to [{lb}, {ub}]"),
            );
            ctx.narrow_var_bounds(x, lb, ub)?;
        }
        let points: Vec<f64> = std::iter::once(lb)
            .chain(pl.breakpoints.iter().copied().filter(|&b| b > lb && b < ub))
            .chain((ub > lb).then_some(ub))
            .collect();
        if points.len() == 1 {
            let y = pl.eval(lb);
            return ctx.narrow_var_bounds(r, y, y);
        }
        let lambdas: Vec<VarId> = (0..points.len()).map(|_| ctx.add_var(0.0, 1.0, VarType::Continuous)).collect();
        let sum = LinTerms::from_pairs(lambdas.iter().map(|&l| (1.0, l)));
        ctx.add_constraint(AlgebraicConstraint::eq(sum, 1.0))?;

        let mut xdef = LinTerms::from_pairs(points.iter().zip(&lambdas).map(|(&p, &l)| (p, l)));
        xdef.add_term(-1.0, x);
        ctx.add_constraint(AlgebraicConstraint::eq(xdef, 0.0))?;

        let mut rdef = LinTerms::from_pairs(points.iter().zip(&lambdas).map(|(&p, &l)| (pl.eval(p), l)));
        rdef.add_term(-1.0, r);
        ctx.add_constraint(AlgebraicConstraint::eq(rdef, 0.0))?;

        let weights = (1..=lambdas.len()).map(|k| k as f64).collect();
        ctx.add_constraint(SosConstraint::new(SosOrder::Two, lambdas, weights))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, PlFunction};
    use crate::context::ConverterState;
    use crate::link::LinkContext;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    #[test]
    fn test_pl_breakpoints_inside_domain() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(-1.0, 4.0, VarType::Continuous);
        // |x| with a kink at 0, plus an unused breakpoint at 10
        let pl = PlFunction::new(vec![-1.0, 1.0, 2.0], vec![0.0, 10.0]);
        ctx.assign_result_var(FuncExpr::Pl { pl, arg: x }).unwrap();
        let con = st.model().keeper(ConstraintKind::Pl).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        PlConverter.convert(&mut ctx, &con, 0).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::LinEQ).num_active(), 3);
        let (_, sos) = m.keeper(ConstraintKind::Sos2).iter_active().next().unwrap();
        let Constraint::Sos(sos) = sos else { panic!("expected SOS2") };
        assert_eq!(sos.vars.len(), 3);
        assert!(st.warnings.is_empty());
    }

    #[test]
    fn test_unbounded_argument_warns() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, f64::INFINITY, VarType::Continuous);
        let pl = PlFunction::new(vec![1.0, 0.5], vec![2.0]);
        ctx.assign_result_var(FuncExpr::Pl { pl, arg: x }).unwrap();
        let con = st.model().keeper(ConstraintKind::Pl).constraint(0).cloned().unwrap();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        PlConverter.convert(&mut ctx, &con, 0).unwrap();
        let bound = st.config.pl_domain_bound;
        assert_eq!(st.model().keeper(ConstraintKind::Sos2).num_active(), 1);
        assert_eq!(crate::bounds::VarBounds::ub(st.model(), x), bound);
        assert!(st.warnings.get("PLApproxDomain").is_some());
    }
}
