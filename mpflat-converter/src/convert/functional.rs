//! Linear and quadratic definitions into equality rows.

use super::expect_functional;
use crate::constraint::{AlgebraicConstraint, Constraint, FuncExpr};
use crate::context::ConversionContext;
use crate::expr::QuadAndLinTerms;
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `r == a'x + b` into `a'x - r == -b`, and the quadratic analogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionalConverter;

impl ConstraintConverter for FunctionalConverter {
    fn name(&self) -> &'static str {
        "functional"
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        match &fc.expr {
            FuncExpr::Linear(e) => {
                let mut terms = e.terms.clone();
                terms.add_term(-1.0, fc.result);
                ctx.add_constraint(AlgebraicConstraint::eq(terms, -e.constant))?;
            }
            FuncExpr::Quadratic(e) => {
                let mut terms: QuadAndLinTerms = e.terms.clone();
                terms.lin.add_term(-1.0, fc.result);
                ctx.add_constraint(AlgebraicConstraint::eq(terms, -e.constant))?;
            }
            other => {
                return Err(FlatError::invalid_operation(format!(
                    "functional converter received {}",
                    other.kind()
                )));
            }
        }
        Ok(())
    }
}
