//! Two-sided rows into one-sided rows.

use crate::constraint::{AlgebraicConstraint, Constraint};
use crate::context::ConversionContext;
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `lb <= body <= ub` into `body >= lb` and `body <= ub`.
///
/// A row free on both sides is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeConverter;

impl ConstraintConverter for RangeConverter {
    fn name(&self) -> &'static str {
        "range"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let Constraint::Algebraic(c) = con else {
            return Err(FlatError::invalid_operation(format!("range converter received {}", con.kind())));
        };
        if c.is_free() {
            return Ok(());
        }
        if c.lb.is_finite() {
            ctx.add_constraint(AlgebraicConstraint::ge(c.body.clone(), c.lb))?;
        }
        if c.ub.is_finite() {
            ctx.add_constraint(AlgebraicConstraint::le(c.body.clone(), c.ub))?;
        }
        Ok(())
    }
}
