//! Integer powers with a linear or quadratic form.

use super::expect_functional;
use crate::constraint::{Constraint, FuncExpr};
use crate::context::ConversionContext;
use crate::expr::{AffineExpr, QuadAndLinTerms, QuadTerms, QuadraticExpr};
use crate::registry::ConstraintConverter;
use mpflat_core::{FlatError, Result};

/// `r = x^p` for `p` in `{0, 1, 2}`.
///
/// These are converted even when the target accepts `pow`, since a
/// quadratic or linear form is always preferable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowConverter;

fn exponent(con: &Constraint) -> Option<f64> {
    match con.as_functional().map(|fc| &fc.expr) {
        Some(FuncExpr::Pow { exponent, .. }) => Some(*exponent),
        _ => None,
    }
}

impl ConstraintConverter for PowConverter {
    fn name(&self) -> &'static str {
        "pow"
    }

    fn needs_conversion(&self, _ctx: &ConversionContext<'_>, con: &Constraint) -> bool {
        matches!(exponent(con), Some(p) if p == 0.0 || p == 1.0 || p == 2.0)
    }

    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, _index: usize) -> Result<()> {
        let fc = expect_functional(con, self.name())?;
        let FuncExpr::Pow { base, exponent } = fc.expr else {
            return Err(FlatError::invalid_operation(format!("pow converter received {}", fc.expr.kind())));
        };
        let r = fc.result;
        if exponent == 0.0 {
            ctx.narrow_var_bounds(r, 1.0, 1.0)
        } else if exponent == 1.0 {
            ctx.redefine_variable(r, FuncExpr::Linear(AffineExpr::variable(base)))
        } else if exponent == 2.0 {
            let terms = QuadAndLinTerms::new(Default::default(), QuadTerms::from_triples([(1.0, base, base)]));
            ctx.redefine_variable(r, FuncExpr::Quadratic(QuadraticExpr::new(terms, 0.0)))
        } else {
            Err(FlatError::conversion_failure(
                "PowExponent",
                format!("{base}^{exponent} has no linear or quadratic form"),
            ))
        }
    }
}
