//! Second-order cones into quadratic rows.

use crate::constraint::{AlgebraicConstraint, ConeKind, Constraint};
use crate::context::ConversionContext;
use crate::expr::{LinTerms, QuadAndLinTerms, QuadTerms};
use crate::registry::ConstraintConverter;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// Quadratic and rotated quadratic cones.
///
/// `c0 x0 >= ||c_i x_i||` becomes `sum c_i^2 x_i^2 - c0^2 x0^2 <= 0` with
/// `c0 x0 >= 0`; the rotated cone `2 c0 x0 c1 x1 >= sum c_i^2 x_i^2`
/// becomes `sum c_i^2 x_i^2 - 2 c0 c1 x0 x1 <= 0` with both heads
/// nonnegative.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConeConverter;

impl ConstraintConverter for ConeConverter {
    fn name(&self) -> &'static str {
        "cone"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let Constraint::Cone(cone) = con else {
            return Err(FlatError::invalid_operation(format!("cone converter received {}", con.kind())));
        };
        let heads = match cone.kind {
            ConeKind::Quadratic => 1,
            ConeKind::RotatedQuadratic => 2,
            ConeKind::Power { .. } | ConeKind::Exponential => {
                return Err(FlatError::invalid_operation(format!("cone converter received {}", con.kind())));
            }
        };
        if cone.args.len() < heads {
            return Err(FlatError::invalid_operation(format!(
                "{} needs at least {heads} members",
                con.kind()
            )));
        }
        let mut quad = QuadTerms::new();
        for (&x, &c) in cone.args.iter().zip(&cone.coefs).skip(heads) {
            quad.add_term(c * c, x, x);
        }
        if heads == 1 {
            let (x0, c0) = (cone.args[0], cone.coefs[0]);
            quad.add_term(-c0 * c0, x0, x0);
            nonnegative_head(ctx, x0, c0)?;
        } else {
            let (x0, c0, x1, c1) = (cone.args[0], cone.coefs[0], cone.args[1], cone.coefs[1]);
            quad.add_term(-2.0 * c0 * c1, x0, x1);
            nonnegative_head(ctx, x0, c0)?;
            nonnegative_head(ctx, x1, c1)?;
        }
        ctx.add_constraint(AlgebraicConstraint::le(QuadAndLinTerms::new(LinTerms::new(), quad), 0.0))?;
        Ok(())
    }
}

/// `c * x >= 0`
fn nonnegative_head(ctx: &mut ConversionContext<'_>, x: VarId, c: f64) -> Result<()> {
    if c > 0.0 {
        ctx.narrow_var_bounds(x, 0.0, f64::INFINITY)
    } else if c < 0.0 {
        ctx.narrow_var_bounds(x, f64::NEG_INFINITY, 0.0)
    } else {
        Ok(())
    }
}
