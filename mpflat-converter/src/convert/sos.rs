//! SOS constraints with binaries.

use crate::constraint::{AlgebraicConstraint, Constraint, SosOrder};
use crate::context::ConversionContext;
use crate::expr::LinTerms;
use crate::registry::ConstraintConverter;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// SOS1: one binary per member, `lb_i b_i <= x_i <= ub_i b_i`,
/// `sum b <= 1`.
///
/// SOS2: one binary per adjacent pair, a member may be nonzero only if a
/// pair containing it is selected, `sum y = 1`. Members need finite bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SosConverter;

impl ConstraintConverter for SosConverter {
    fn name(&self) -> &'static str {
        "sos"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let Constraint::Sos(sos) = con else {
            return Err(FlatError::invalid_operation(format!("sos converter received {}", con.kind())));
        };
        for &x in &sos.vars {
            let (lb, ub) = ctx.bounds(x);
            if lb.is_infinite() || ub.is_infinite() {
                return Err(FlatError::conversion_failure(
                    "SOSInfBound",
                    format!("SOS member {x} needs finite bounds for the MIP reformulation, has [{lb}, {ub}]"),
                ));
            }
        }
        // SOS order follows the weights
        let mut members: Vec<(f64, VarId)> = sos.weights.iter().copied().zip(sos.vars.iter().copied()).collect();
        members.sort_by(|a, b| a.0.total_cmp(&b.0));
        let vars: Vec<VarId> = members.into_iter().map(|(_, v)| v).collect();

        match sos.order {
            SosOrder::One => {
                let flags: Vec<VarId> = vars.iter().map(|_| ctx.add_binary()).collect();
                for (&x, &b) in vars.iter().zip(&flags) {
                    link_to_flags(ctx, x, &[b])?;
                }
                let sum = LinTerms::from_pairs(flags.iter().map(|&b| (1.0, b)));
                ctx.add_constraint(AlgebraicConstraint::le(sum, 1.0))?;
            }
            SosOrder::Two => {
                if vars.len() < 2 {
                    return Ok(());
                }
                let pairs: Vec<VarId> = (0..vars.len() - 1).map(|_| ctx.add_binary()).collect();
                for (i, &x) in vars.iter().enumerate() {
                    let covering: Vec<VarId> = [i.checked_sub(1), (i < pairs.len()).then_some(i)]
                        .into_iter()
                        .flatten()
                        .map(|k| pairs[k])
                        .collect();
                    link_to_flags(ctx, x, &covering)?;
                }
                let sum = LinTerms::from_pairs(pairs.iter().map(|&b| (1.0, b)));
                ctx.add_constraint(AlgebraicConstraint::eq(sum, 1.0))?;
            }
        }
        Ok(())
    }
}

/// `lb * sum(flags) <= x <= ub * sum(flags)`; sides that hold trivially are
/// skipped.
fn link_to_flags(ctx: &mut ConversionContext<'_>, x: VarId, flags: &[VarId]) -> Result<()> {
    let (lb, ub) = ctx.bounds(x);
    if ub > 0.0 {
        let mut t = LinTerms::single(1.0, x);
        for &b in flags {
            t.add_term(-ub, b);
        }
        ctx.add_constraint(AlgebraicConstraint::le(t, 0.0))?;
    }
    if lb < 0.0 {
        let mut t = LinTerms::single(1.0, x);
        for &b in flags {
            t.add_term(-lb, b);
        }
        ctx.add_constraint(AlgebraicConstraint::ge(t, 0.0))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, SosConstraint};
    use crate::context::ConverterState;
    use crate::link::LinkContext;
    use crate::var::VarType;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    fn state() -> ConverterState {
        ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended)
    }

    #[test]
    fn test_sos1() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let xs = ctx.add_vars(3, 0.0, 4.0, VarType::Continuous);
        let sos: Constraint = SosConstraint::new(SosOrder::One, xs, vec![1.0, 2.0, 3.0]).into();
        SosConverter.convert(&mut ctx, &sos, 0).unwrap();
        // 3 linking rows plus the cardinality row
        assert_eq!(st.model().keeper(ConstraintKind::LinLE).num_active(), 4);
        assert_eq!(st.model().keeper(ConstraintKind::LinGE).num_active(), 0);
    }

    #[test]
    fn test_sos2() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let xs = ctx.add_vars(4, -1.0, 1.0, VarType::Continuous);
        let sos: Constraint = SosConstraint::new(SosOrder::Two, xs, vec![4.0, 3.0, 2.0, 1.0]).into();
        SosConverter.convert(&mut ctx, &sos, 0).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::LinLE).num_active(), 4);
        assert_eq!(m.keeper(ConstraintKind::LinGE).num_active(), 4);
        assert_eq!(m.keeper(ConstraintKind::LinEQ).num_active(), 1);
    }

    #[test]
    fn test_sos_needs_bounds() {
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let x = ctx.add_var(0.0, f64::INFINITY, VarType::Continuous);
        let y = ctx.add_var(0.0, 1.0, VarType::Continuous);
        let sos: Constraint = SosConstraint::new(SosOrder::One, vec![x, y], vec![1.0, 2.0]).into();
        let err = SosConverter.convert(&mut ctx, &sos, 0).unwrap_err();
        assert_eq!(err.failure_key(), Some("SOSInfBound"));
    }
}
