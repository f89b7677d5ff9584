//! Flat constraints.
//!
//! Every constraint stored by the converter is a [`Constraint`] value. Its
//! [`ConstraintKind`] selects the keeper it lives in, the acceptance level
//! queried from the target and the converter applied to it.

mod algebraic;
mod functional;
mod kind;

pub use algebraic::{AlgebraicBody, AlgebraicConstraint, CmpOp, Comparison, IndicatorConstraint};
pub use functional::{Context, FuncExpr, FunctionalConstraint, MathFunc, PlFunction};
pub use kind::ConstraintKind;

use crate::var::VarId;

/// Order of a special ordered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SosOrder {
    /// At most one nonzero
    One,
    /// At most two adjacent nonzeros
    Two,
}

/// Special ordered set over weighted variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SosConstraint {
    /// Type 1 or 2
    pub order: SosOrder,
    /// Members
    pub vars: Vec<VarId>,
    /// Ordering weights, one per member
    pub weights: Vec<f64>,
}

impl SosConstraint {
    /// Create a set; weights must match the members.
    #[must_use]
    pub fn new(order: SosOrder, vars: Vec<VarId>, weights: Vec<f64>) -> Self {
        assert_eq!(vars.len(), weights.len(), "one weight per SOS member");
        Self {
            order,
            vars,
            weights,
        }
    }
}

/// `con` complementary to `var`: at the solution either `con` is active
/// at a finite bound or `var` is at its finite bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementarityConstraint {
    /// Algebraic side
    pub con: AlgebraicConstraint,
    /// Complementing variable
    pub var: VarId,
}

/// Shape of a cone constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConeKind {
    /// `c0*x0 >= sqrt(sum (c_i*x_i)^2)`
    Quadratic,
    /// `2*c0*x0*c1*x1 >= sum (c_i*x_i)^2`
    RotatedQuadratic,
    /// `x0^alpha * x1^(1-alpha) >= |x2|`
    Power {
        /// Exponent
        alpha: f64,
    },
    /// `x0 >= x1 * exp(x2 / x1)`
    Exponential,
}

/// Cone membership of scaled variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeConstraint {
    /// Cone shape
    pub kind: ConeKind,
    /// Members
    pub args: Vec<VarId>,
    /// Scaling factors, one per member
    pub coefs: Vec<f64>,
}

impl ConeConstraint {
    /// Create a cone constraint.
    #[must_use]
    pub fn new(kind: ConeKind, args: Vec<VarId>, coefs: Vec<f64>) -> Self {
        assert_eq!(args.len(), coefs.len(), "one coefficient per cone member");
        Self { kind, args, coefs }
    }
}

/// Any flat constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Linear or quadratic range
    Algebraic(AlgebraicConstraint),
    /// `r == f(x)`
    Functional(FunctionalConstraint),
    /// `b == v ==> comparison`
    Indicator(IndicatorConstraint),
    /// SOS1 or SOS2
    Sos(SosConstraint),
    /// Complementarity pair
    Complementarity(ComplementarityConstraint),
    /// Conic constraint
    Cone(ConeConstraint),
}

impl Constraint {
    /// Keeper kind of the constraint.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Algebraic(c) => c.kind(),
            Constraint::Functional(c) => c.kind(),
            Constraint::Indicator(c) => c.kind(),
            Constraint::Sos(c) => match c.order {
                SosOrder::One => ConstraintKind::Sos1,
                SosOrder::Two => ConstraintKind::Sos2,
            },
            Constraint::Complementarity(c) => {
                if c.con.body.is_quadratic() {
                    ConstraintKind::ComplementarityQuadratic
                } else {
                    ConstraintKind::ComplementarityLinear
                }
            }
            Constraint::Cone(c) => match c.kind {
                ConeKind::Quadratic => ConstraintKind::QuadraticCone,
                ConeKind::RotatedQuadratic => ConstraintKind::RotatedQuadraticCone,
                ConeKind::Power { .. } => ConstraintKind::PowerCone,
                ConeKind::Exponential => ConstraintKind::ExponentialCone,
            },
        }
    }

    /// Variables the constraint reads, with repetitions.
    ///
    /// The result variable of a functional constraint is not an argument.
    pub fn arguments(&self) -> Vec<VarId> {
        match self {
            Constraint::Algebraic(c) => c.body.vars(),
            Constraint::Functional(c) => c.expr.args(),
            Constraint::Indicator(c) => {
                let mut v = c.con.body.vars();
                v.push(c.binvar);
                v
            }
            Constraint::Sos(c) => c.vars.clone(),
            Constraint::Complementarity(c) => {
                let mut v = c.con.body.vars();
                v.push(c.var);
                v
            }
            Constraint::Cone(c) => c.args.clone(),
        }
    }

    /// Variable defined by a functional constraint.
    pub fn result_var(&self) -> Option<VarId> {
        match self {
            Constraint::Functional(c) => Some(c.result),
            _ => None,
        }
    }

    /// The functional constraint, if this is one.
    pub fn as_functional(&self) -> Option<&FunctionalConstraint> {
        match self {
            Constraint::Functional(c) => Some(c),
            _ => None,
        }
    }
}

macro_rules! constraint_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Constraint {
                fn from(c: $ty) -> Self {
                    Constraint::$variant(c)
                }
            }
        )+
    };
}

constraint_from!(
    Algebraic(AlgebraicConstraint),
    Functional(FunctionalConstraint),
    Indicator(IndicatorConstraint),
    Sos(SosConstraint),
    Complementarity(ComplementarityConstraint),
    Cone(ConeConstraint),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::LinTerms;

    fn x(i: usize) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn test_constraint_kind_dispatch() {
        let alg: Constraint = AlgebraicConstraint::le(LinTerms::single(1.0, x(0)), 1.0).into();
        assert_eq!(alg.kind(), ConstraintKind::LinLE);
        let sos: Constraint = SosConstraint::new(SosOrder::Two, vec![x(0), x(1)], vec![1.0, 2.0]).into();
        assert_eq!(sos.kind(), ConstraintKind::Sos2);
        let cone: Constraint = ConeConstraint::new(ConeKind::Quadratic, vec![x(0), x(1)], vec![1.0, 1.0]).into();
        assert_eq!(cone.kind(), ConstraintKind::QuadraticCone);
    }

    #[test]
    fn test_arguments_exclude_result() {
        let fc = FunctionalConstraint::new(x(5), FuncExpr::Max(vec![x(1), x(2)]));
        let c: Constraint = fc.into();
        assert_eq!(c.arguments(), vec![x(1), x(2)]);
        assert_eq!(c.result_var(), Some(x(5)));
        assert_eq!(c.kind(), ConstraintKind::Max);
    }

    #[test]
    fn test_indicator_arguments_include_binary() {
        let ind = IndicatorConstraint::new(
            x(3),
            true,
            Comparison::new(LinTerms::single(1.0, x(0)), CmpOp::Le, 2.0),
        );
        let c: Constraint = ind.into();
        assert_eq!(c.arguments(), vec![x(0), x(3)]);
        assert_eq!(c.kind(), ConstraintKind::IndicatorLinLE);
    }
}
