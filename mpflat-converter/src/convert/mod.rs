//! Built-in constraint converters.
//!
//! Each converter rewrites one family of kinds into lower-level constraints.
//! The output re-enters the conversion loop, so a converter only needs to
//! go one step down.

pub mod complementarity;
pub mod cones;
pub mod conditional;
pub mod counting;
pub mod functional;
pub mod indicator;
pub mod logical;
pub mod maxmin;
pub mod pl;
pub mod pow;
pub mod range;
pub mod sos;

use crate::constraint::{Constraint, FunctionalConstraint};
use crate::expr::LinTerms;
use crate::var::VarId;
use mpflat_core::{FlatError, Result};

/// The functional constraint inside `con`.
pub(crate) fn expect_functional<'c>(con: &'c Constraint, converter: &str) -> Result<&'c FunctionalConstraint> {
    con.as_functional()
        .ok_or_else(|| FlatError::invalid_operation(format!("{converter} received {}", con.kind())))
}

/// `sum(args) - r`
pub(crate) fn sum_minus(args: &[VarId], r: VarId) -> LinTerms {
    let mut t = LinTerms::from_pairs(args.iter().map(|&v| (1.0, v)));
    t.add_term(-1.0, r);
    t
}

/// `a - b`
pub(crate) fn difference(a: VarId, b: VarId) -> LinTerms {
    LinTerms::from_pairs([(1.0, a), (-1.0, b)])
}
