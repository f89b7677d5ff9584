//! Interval bounds of terms and expressions.
//!
//! Products use the convention `0 * inf = 0`, so a fixed-zero variable
//! contributes nothing regardless of its partner's domain.

use crate::constraint::AlgebraicBody;
use crate::expr::{LinTerms, QuadAndLinTerms, QuadTerms};
use crate::var::VarId;

/// Read access to variable domains.
pub trait VarBounds {
    /// Lower bound of `v`.
    fn lb(&self, v: VarId) -> f64;

    /// Upper bound of `v`.
    fn ub(&self, v: VarId) -> f64;

    /// Whether `v` is integer.
    fn is_integer(&self, v: VarId) -> bool;

    /// Both bounds of `v`.
    fn bounds(&self, v: VarId) -> (f64, f64) {
        (self.lb(v), self.ub(v))
    }

    /// Value of `v` if it is fixed.
    fn fixed_value(&self, v: VarId) -> Option<f64> {
        let (lb, ub) = self.bounds(v);
        (lb == ub).then_some(lb)
    }

    /// Whether `v` is an integer variable within `[0, 1]`.
    fn is_binary(&self, v: VarId) -> bool {
        self.is_integer(v) && self.lb(v) >= 0.0 && self.ub(v) <= 1.0
    }
}

#[inline]
fn mul(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

/// Interval `c * [lb, ub]`.
pub fn scale_range(c: f64, (lb, ub): (f64, f64)) -> (f64, f64) {
    let (p, q) = (mul(c, lb), mul(c, ub));
    (p.min(q), p.max(q))
}

/// Interval product `[a] * [b]`.
pub fn product_range(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let cands = [mul(a.0, b.0), mul(a.0, b.1), mul(a.1, b.0), mul(a.1, b.1)];
    let lo = cands.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = cands.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

/// Interval `[a]^2`.
pub fn square_range((lb, ub): (f64, f64)) -> (f64, f64) {
    if lb >= 0.0 {
        (mul(lb, lb), mul(ub, ub))
    } else if ub <= 0.0 {
        (mul(ub, ub), mul(lb, lb))
    } else {
        (0.0, mul(lb, lb).max(mul(ub, ub)))
    }
}

fn add_range(acc: &mut (f64, f64), r: (f64, f64)) {
    acc.0 += r.0;
    acc.1 += r.1;
}

/// Bounds of `a'x`.
pub fn lin_range(terms: &LinTerms, b: &impl VarBounds) -> (f64, f64) {
    let mut acc = (0.0, 0.0);
    for (c, v) in terms.iter() {
        add_range(&mut acc, scale_range(c, b.bounds(v)));
    }
    acc
}

/// Bounds of `x'Qx`.
pub fn quad_range(terms: &QuadTerms, b: &impl VarBounds) -> (f64, f64) {
    let mut acc = (0.0, 0.0);
    for (c, v1, v2) in terms.iter() {
        let r = if v1 == v2 {
            square_range(b.bounds(v1))
        } else {
            product_range(b.bounds(v1), b.bounds(v2))
        };
        add_range(&mut acc, scale_range(c, r));
    }
    acc
}

/// Bounds of linear plus quadratic terms.
pub fn quad_and_lin_range(terms: &QuadAndLinTerms, b: &impl VarBounds) -> (f64, f64) {
    let mut acc = lin_range(&terms.lin, b);
    add_range(&mut acc, quad_range(&terms.quad, b));
    acc
}

/// Bounds of an algebraic body.
pub fn body_range(body: &AlgebraicBody, b: &impl VarBounds) -> (f64, f64) {
    match body {
        AlgebraicBody::Linear(t) => lin_range(t, b),
        AlgebraicBody::Quadratic(t) => quad_and_lin_range(t, b),
    }
}

fn is_int_value(x: f64) -> bool {
    x.fract() == 0.0
}

/// Whether `a'x + c` is integer whenever its variables are.
pub fn lin_is_integer(terms: &LinTerms, constant: f64, b: &impl VarBounds) -> bool {
    is_int_value(constant) && terms.iter().all(|(c, v)| is_int_value(c) && b.is_integer(v))
}

/// Whether an algebraic body is integer-valued.
pub fn body_is_integer(body: &AlgebraicBody, b: &impl VarBounds) -> bool {
    let lin_ok = lin_is_integer(body.lin(), 0.0, b);
    match body {
        AlgebraicBody::Linear(_) => lin_ok,
        AlgebraicBody::Quadratic(t) => {
            lin_ok
                && t.quad
                    .iter()
                    .all(|(c, v1, v2)| is_int_value(c) && b.is_integer(v1) && b.is_integer(v2))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::VarBounds;
    use crate::var::VarId;

    /// Plain arrays of bounds for unit tests.
    pub(crate) struct Domains(pub Vec<(f64, f64, bool)>);

    impl VarBounds for Domains {
        fn lb(&self, v: VarId) -> f64 {
            self.0[v.index()].0
        }
        fn ub(&self, v: VarId) -> f64 {
            self.0[v.index()].1
        }
        fn is_integer(&self, v: VarId) -> bool {
            self.0[v.index()].2
        }
    }
}
