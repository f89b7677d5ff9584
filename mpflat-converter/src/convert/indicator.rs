//! Indicator constraints into big-M rows.

use crate::bounds;
use crate::constraint::{AlgebraicBody, AlgebraicConstraint, CmpOp, Constraint, ConstraintKind};
use crate::context::ConversionContext;
use crate::registry::ConstraintConverter;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// `b == v ==> body op rhs` via big-M.
///
/// `>=` is handled as `<=` on the negated body, `==` as both.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorConverter;

impl ConstraintConverter for IndicatorConverter {
    fn name(&self) -> &'static str {
        "indicator"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let Constraint::Indicator(ind) = con else {
            return Err(FlatError::invalid_operation(format!("indicator converter received {}", con.kind())));
        };
        let (b, val) = (ind.binvar, ind.binary_value);
        let body = &ind.con.body;
        let rhs = ind.con.rhs;
        let le_kind = if body.is_quadratic() { ConstraintKind::IndicatorQuadLE } else { ConstraintKind::IndicatorLinLE };
        let mut negated = body.clone();
        negated.negate();
        match ind.con.op {
            CmpOp::Le | CmpOp::Lt => big_m_le(ctx, b, val, body.clone(), rhs, le_kind),
            CmpOp::Ge | CmpOp::Gt => big_m_le(ctx, b, val, negated, -rhs, le_kind),
            CmpOp::Eq => {
                big_m_le(ctx, b, val, body.clone(), rhs, le_kind)?;
                big_m_le(ctx, b, val, negated, -rhs, le_kind)
            }
        }
    }
}

/// Linearize `b == val ==> body <= rhs`.
fn big_m_le(
    ctx: &mut ConversionContext<'_>,
    b: VarId,
    val: bool,
    mut body: AlgebraicBody,
    rhs: f64,
    kind: ConstraintKind,
) -> Result<()> {
    let (_, mut ub) = bounds::body_range(&body, ctx.model());
    if ub <= rhs {
        return Ok(());
    }
    if ctx.is_infinite(ub) {
        ub = ctx.config().big_m().ok_or_else(|| inf_bound_failure(kind))?;
    }
    let mut rhs = rhs;
    if val {
        body.lin_mut().add_term(ub - rhs, b);
        rhs = ub;
    } else {
        body.lin_mut().add_term(rhs - ub, b);
    }
    ctx.add_constraint(AlgebraicConstraint::le(body, rhs))?;
    Ok(())
}

fn inf_bound_failure(kind: ConstraintKind) -> FlatError {
    FlatError::conversion_failure(
        "IndicatorInfBound",
        format!(
            "Big-M reformulation of the indicator constraint \"b==0/1 ==> body<=rhs\" \
             failed: the body has no finite upper bound. \
             If the solver accepts indicator constraints they are passed to it natively, \
             otherwise this is fatal. Possible remedies:\n  \
             1. bound every variable that enters a logical expression;\n  \
             2. set cvt:mip:bigM to a default big-M value (use with care);\n  \
             3. set acc:{}=2 to request native handling if the solver supports it.",
            kind.option_name()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Comparison, IndicatorConstraint};
    use crate::context::ConverterState;
    use crate::expr::LinTerms;
    use crate::link::LinkContext;
    use crate::var::VarType;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    fn le_rows(st: &ConverterState) -> Vec<AlgebraicConstraint> {
        st.model()
            .keeper(ConstraintKind::LinLE)
            .iter_active()
            .filter_map(|(_, c)| match c {
                Constraint::Algebraic(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_big_m_when_true() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 10.0, VarType::Continuous);
        let b = ctx.add_binary();
        let ind = IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 4.0));
        IndicatorConverter.convert(&mut ctx, &ind.into(), 0).unwrap();
        let rows = le_rows(&st);
        assert_eq!(rows.len(), 1);
        // x + 6 b <= 10
        assert_eq!(rows[0].ub, 10.0);
        assert_eq!(rows[0].body.lin().iter().collect::<Vec<_>>(), vec![(1.0, x), (6.0, b)]);
    }

    #[test]
    fn test_big_m_when_false_ge() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 10.0, VarType::Continuous);
        let b = ctx.add_binary();
        // b == 0 ==> x >= 3, i.e. -x <= -3 with upper bound 0
        let ind = IndicatorConstraint::new(b, false, Comparison::new(LinTerms::single(1.0, x), CmpOp::Ge, 3.0));
        IndicatorConverter.convert(&mut ctx, &ind.into(), 0).unwrap();
        let rows = le_rows(&st);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ub, -3.0);
        assert_eq!(rows[0].body.lin().iter().collect::<Vec<_>>(), vec![(-1.0, x), (-3.0, b)]);
    }

    #[test]
    fn test_infinite_bound_needs_big_m() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, f64::INFINITY, VarType::Continuous);
        let b = ctx.add_binary();
        let ind: Constraint =
            IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 4.0)).into();
        let err = IndicatorConverter.convert(&mut ctx, &ind, 0).unwrap_err();
        assert_eq!(err.failure_key(), Some("IndicatorInfBound"));
        assert!(err.to_string().contains("cvt:mip:bigM"));
        assert!(err.to_string().contains("acc:indle=2"));

        let mut cfg = ConverterConfig::default();
        cfg.big_m_default = Some(100.0);
        let mut st = ConverterState::new(cfg, |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let _x = ctx.add_var(0.0, f64::INFINITY, VarType::Continuous);
        let _b = ctx.add_binary();
        IndicatorConverter.convert(&mut ctx, &ind, 0).unwrap();
        assert_eq!(le_rows(&st)[0].ub, 100.0);
    }

    #[test]
    fn test_redundant_indicator_skipped() {
        let mut st = ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended);
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, 2.0, VarType::Continuous);
        let b = ctx.add_binary();
        let ind = IndicatorConstraint::new(b, true, Comparison::new(LinTerms::single(1.0, x), CmpOp::Le, 4.0));
        IndicatorConverter.convert(&mut ctx, &ind.into(), 0).unwrap();
        assert!(le_rows(&st).is_empty());
    }
}
