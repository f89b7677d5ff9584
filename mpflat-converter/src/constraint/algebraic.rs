//! Algebraic constraints, comparisons and indicators.

use super::kind::ConstraintKind;
use crate::expr::{hash_f64, LinTerms, QuadAndLinTerms};
use crate::var::VarId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Body of an algebraic constraint: linear or quadratic terms without a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlgebraicBody {
    /// `a'x`
    Linear(LinTerms),
    /// `x'Qx + a'x`
    Quadratic(QuadAndLinTerms),
}

impl From<LinTerms> for AlgebraicBody {
    fn from(t: LinTerms) -> Self {
        AlgebraicBody::Linear(t)
    }
}

impl From<QuadAndLinTerms> for AlgebraicBody {
    fn from(t: QuadAndLinTerms) -> Self {
        AlgebraicBody::Quadratic(t)
    }
}

impl AlgebraicBody {
    /// Whether the body has a quadratic part, even an empty one.
    pub fn is_quadratic(&self) -> bool {
        matches!(self, AlgebraicBody::Quadratic(_))
    }

    /// Linear part.
    pub fn lin(&self) -> &LinTerms {
        match self {
            AlgebraicBody::Linear(t) => t,
            AlgebraicBody::Quadratic(t) => &t.lin,
        }
    }

    /// Mutable linear part.
    pub fn lin_mut(&mut self) -> &mut LinTerms {
        match self {
            AlgebraicBody::Linear(t) => t,
            AlgebraicBody::Quadratic(t) => &mut t.lin,
        }
    }

    /// Variables of the body, with repetitions.
    pub fn vars(&self) -> Vec<VarId> {
        match self {
            AlgebraicBody::Linear(t) => t.vars().to_vec(),
            AlgebraicBody::Quadratic(t) => t.vars().collect(),
        }
    }

    /// Negate all coefficients.
    pub fn negate(&mut self) {
        match self {
            AlgebraicBody::Linear(t) => t.negate(),
            AlgebraicBody::Quadratic(t) => t.negate(),
        }
    }

    /// Sort, merge and drop zero terms.
    pub fn sort_terms(&mut self) {
        match self {
            AlgebraicBody::Linear(t) => t.sort_terms(),
            AlgebraicBody::Quadratic(t) => t.sort_terms(),
        }
    }

    /// Drop an empty quadratic part.
    #[must_use]
    pub fn simplified(self) -> Self {
        match self {
            AlgebraicBody::Quadratic(t) if t.quad.is_empty() => AlgebraicBody::Linear(t.lin),
            other => other,
        }
    }

    /// Value of the body under `value`.
    pub fn evaluate(&self, value: impl Fn(VarId) -> Option<f64>) -> Option<f64> {
        let mut sum = 0.0;
        for (c, v) in self.lin().iter() {
            sum += c * value(v)?;
        }
        if let AlgebraicBody::Quadratic(t) = self {
            for (c, a, b) in t.quad.iter() {
                sum += c * value(a)? * value(b)?;
            }
        }
        Some(sum)
    }
}

/// `lb <= body <= ub`. Missing sides are infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgebraicConstraint {
    /// Terms
    pub body: AlgebraicBody,
    /// Lower bound
    pub lb: f64,
    /// Upper bound
    pub ub: f64,
}

impl AlgebraicConstraint {
    /// `lb <= body <= ub`
    #[must_use]
    pub fn new(body: impl Into<AlgebraicBody>, lb: f64, ub: f64) -> Self {
        Self {
            body: body.into(),
            lb,
            ub,
        }
    }

    /// `body <= ub`
    #[must_use]
    pub fn le(body: impl Into<AlgebraicBody>, ub: f64) -> Self {
        Self::new(body, f64::NEG_INFINITY, ub)
    }

    /// `body >= lb`
    #[must_use]
    pub fn ge(body: impl Into<AlgebraicBody>, lb: f64) -> Self {
        Self::new(body, lb, f64::INFINITY)
    }

    /// `body == rhs`
    #[must_use]
    pub fn eq(body: impl Into<AlgebraicBody>, rhs: f64) -> Self {
        Self::new(body, rhs, rhs)
    }

    /// Keeper kind implied by the body and the finite sides.
    pub fn kind(&self) -> ConstraintKind {
        use ConstraintKind::*;
        let quad = self.body.is_quadratic();
        let (lb_inf, ub_inf) = (self.lb.is_infinite(), self.ub.is_infinite());
        match () {
            _ if self.lb == self.ub => pick(quad, LinEQ, QuadEQ),
            _ if lb_inf && ub_inf => pick(quad, LinRange, QuadRange),
            _ if lb_inf => pick(quad, LinLE, QuadLE),
            _ if ub_inf => pick(quad, LinGE, QuadGE),
            _ => pick(quad, LinRange, QuadRange),
        }
    }

    /// Whether both sides are infinite.
    pub fn is_free(&self) -> bool {
        self.lb == f64::NEG_INFINITY && self.ub == f64::INFINITY
    }

    /// Whether `body_value` satisfies the bounds within `tol`.
    pub fn is_satisfied(&self, body_value: f64, tol: f64) -> bool {
        body_value >= self.lb - tol && body_value <= self.ub + tol
    }
}

fn pick(quad: bool, lin: ConstraintKind, q: ConstraintKind) -> ConstraintKind {
    if quad { q } else { lin }
}

/// Comparison operator of a conditional or indicator constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl CmpOp {
    /// Operator after negating both sides.
    pub fn mirror(self) -> Self {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ge => CmpOp::Le,
            CmpOp::Gt => CmpOp::Lt,
        }
    }

    /// Logical complement, if it is a single comparison.
    pub fn complement(self) -> Option<Self> {
        match self {
            CmpOp::Lt => Some(CmpOp::Ge),
            CmpOp::Le => Some(CmpOp::Gt),
            CmpOp::Eq => None,
            CmpOp::Ge => Some(CmpOp::Lt),
            CmpOp::Gt => Some(CmpOp::Le),
        }
    }

    /// Whether the operator is `<` or `>`.
    pub fn is_strict(self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Gt)
    }

    /// Evaluate `lhs op rhs`.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
        })
    }
}

/// `body op rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Terms
    pub body: AlgebraicBody,
    /// Operator
    pub op: CmpOp,
    /// Right-hand side
    pub rhs: f64,
}

impl Eq for Comparison {}

impl Hash for Comparison {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.body.hash(state);
        self.op.hash(state);
        hash_f64(self.rhs, state);
    }
}

impl Comparison {
    /// `body op rhs`
    #[must_use]
    pub fn new(body: impl Into<AlgebraicBody>, op: CmpOp, rhs: f64) -> Self {
        Self {
            body: body.into(),
            op,
            rhs,
        }
    }

    /// Same comparison with the body negated.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut body = self.body.clone();
        body.negate();
        Self::new(body, self.op.mirror(), -self.rhs)
    }

    /// Conditional constraint kind.
    pub fn conditional_kind(&self) -> ConstraintKind {
        use ConstraintKind::*;
        let quad = self.body.is_quadratic();
        match self.op {
            CmpOp::Eq => pick(quad, CondLinEQ, CondQuadEQ),
            CmpOp::Le => pick(quad, CondLinLE, CondQuadLE),
            CmpOp::Lt => pick(quad, CondLinLT, CondQuadLT),
            CmpOp::Ge => pick(quad, CondLinGE, CondQuadGE),
            CmpOp::Gt => pick(quad, CondLinGT, CondQuadGT),
        }
    }

    /// The comparison as a plain algebraic constraint.
    ///
    /// Strict operators are tightened by `eps`.
    pub fn to_algebraic(&self, eps: f64) -> AlgebraicConstraint {
        let body = self.body.clone();
        match self.op {
            CmpOp::Lt => AlgebraicConstraint::le(body, self.rhs - eps),
            CmpOp::Le => AlgebraicConstraint::le(body, self.rhs),
            CmpOp::Eq => AlgebraicConstraint::eq(body, self.rhs),
            CmpOp::Ge => AlgebraicConstraint::ge(body, self.rhs),
            CmpOp::Gt => AlgebraicConstraint::ge(body, self.rhs + eps),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (c, v)) in self.body.lin().iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{c}*{v}")?;
        }
        if let AlgebraicBody::Quadratic(t) = &self.body {
            for (c, a, b) in t.quad.iter() {
                write!(f, " + {c}*{a}*{b}")?;
            }
        }
        write!(f, " {} {}", self.op, self.rhs)
    }
}

/// `binvar == binary_value ==> con`
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConstraint {
    /// Binary variable
    pub binvar: VarId,
    /// Value of the binary that activates `con`
    pub binary_value: bool,
    /// Implied comparison, never strict
    pub con: Comparison,
}

impl IndicatorConstraint {
    /// Create an indicator.
    #[must_use]
    pub fn new(binvar: VarId, binary_value: bool, con: Comparison) -> Self {
        assert!(!con.op.is_strict(), "indicator constraints take non-strict comparisons");
        Self {
            binvar,
            binary_value,
            con,
        }
    }

    /// Keeper kind.
    pub fn kind(&self) -> ConstraintKind {
        use ConstraintKind::*;
        let quad = self.con.body.is_quadratic();
        match self.con.op {
            CmpOp::Le | CmpOp::Lt => pick(quad, IndicatorLinLE, IndicatorQuadLE),
            CmpOp::Eq => pick(quad, IndicatorLinEQ, IndicatorQuadEQ),
            CmpOp::Ge | CmpOp::Gt => pick(quad, IndicatorLinGE, IndicatorQuadGE),
        }
    }
}
