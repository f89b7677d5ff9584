//! Functional constraints `r == f(args)`.
//!
//! A [`FuncExpr`] is the right-hand side and doubles as the deduplication
//! key: two functional constraints with equal expressions define the same
//! value, so the second one reuses the first one's result variable.

use super::algebraic::Comparison;
use super::kind::ConstraintKind;
use crate::bounds::{self, VarBounds};
use crate::expr::{hash_f64, AffineExpr, QuadraticExpr};
use crate::var::VarId;
use std::f64::consts::FRAC_PI_2;
use std::hash::{Hash, Hasher};
use std::mem;

/// How the value of an expression is used by its consumers.
///
/// `Positive` means only large (true) values matter to the consumers,
/// `Negative` only small (false) ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Context {
    /// No consumer known yet
    #[default]
    None,
    /// Used monotonically increasing
    Positive,
    /// Used monotonically decreasing
    Negative,
    /// Used both ways
    Mixed,
}

impl Context {
    /// Context seen through a negation.
    pub fn negate(self) -> Self {
        match self {
            Context::Positive => Context::Negative,
            Context::Negative => Context::Positive,
            other => other,
        }
    }

    /// Least context covering both.
    pub fn merge(self, other: Context) -> Self {
        match (self, other) {
            (Context::None, c) | (c, Context::None) => c,
            (a, b) if a == b => a,
            _ => Context::Mixed,
        }
    }

    /// Whether the true side of a logical result is needed.
    ///
    /// `None` means no use has been recorded yet and counts as both sides.
    pub fn has_positive(self) -> bool {
        matches!(self, Context::Positive | Context::Mixed | Context::None)
    }

    /// Whether the false side of a logical result is needed.
    ///
    /// `None` counts as both sides, as in [`has_positive`](Self::has_positive).
    pub fn has_negative(self) -> bool {
        matches!(self, Context::Negative | Context::Mixed | Context::None)
    }
}

/// Univariate elementary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFunc {
    /// `e^x`
    Exp,
    /// `ln x`
    Log,
    /// `sin x`
    Sin,
    /// `cos x`
    Cos,
    /// `tan x`
    Tan,
    /// `asin x`
    Asin,
    /// `acos x`
    Acos,
    /// `atan x`
    Atan,
    /// `sinh x`
    Sinh,
    /// `cosh x`
    Cosh,
    /// `tanh x`
    Tanh,
    /// `asinh x`
    Asinh,
    /// `acosh x`
    Acosh,
    /// `atanh x`
    Atanh,
}

impl MathFunc {
    /// Constraint kind defining this function.
    pub fn kind(self) -> ConstraintKind {
        use ConstraintKind as K;
        match self {
            MathFunc::Exp => K::Exp,
            MathFunc::Log => K::Log,
            MathFunc::Sin => K::Sin,
            MathFunc::Cos => K::Cos,
            MathFunc::Tan => K::Tan,
            MathFunc::Asin => K::Asin,
            MathFunc::Acos => K::Acos,
            MathFunc::Atan => K::Atan,
            MathFunc::Sinh => K::Sinh,
            MathFunc::Cosh => K::Cosh,
            MathFunc::Tanh => K::Tanh,
            MathFunc::Asinh => K::Asinh,
            MathFunc::Acosh => K::Acosh,
            MathFunc::Atanh => K::Atanh,
        }
    }

    /// Evaluate at `x`.
    pub fn eval(self, x: f64) -> f64 {
        match self {
            MathFunc::Exp => x.exp(),
            MathFunc::Log => x.ln(),
            MathFunc::Sin => x.sin(),
            MathFunc::Cos => x.cos(),
            MathFunc::Tan => x.tan(),
            MathFunc::Asin => x.asin(),
            MathFunc::Acos => x.acos(),
            MathFunc::Atan => x.atan(),
            MathFunc::Sinh => x.sinh(),
            MathFunc::Cosh => x.cosh(),
            MathFunc::Tanh => x.tanh(),
            MathFunc::Asinh => x.asinh(),
            MathFunc::Acosh => x.acosh(),
            MathFunc::Atanh => x.atanh(),
        }
    }

    fn range(self, (lb, ub): (f64, f64)) -> (f64, f64) {
        use std::f64::consts::PI;
        match self {
            MathFunc::Exp => (lb.exp(), ub.exp()),
            MathFunc::Log => (
                if lb > 0.0 { lb.ln() } else { f64::NEG_INFINITY },
                if ub > 0.0 { ub.ln() } else { f64::NEG_INFINITY },
            ),
            MathFunc::Sin | MathFunc::Cos | MathFunc::Tanh => (-1.0, 1.0),
            MathFunc::Atan | MathFunc::Asin => (-FRAC_PI_2, FRAC_PI_2),
            MathFunc::Acos => (0.0, PI),
            MathFunc::Cosh => (1.0, f64::INFINITY),
            MathFunc::Acosh => (0.0, f64::INFINITY),
            MathFunc::Sinh | MathFunc::Asinh => (self.eval(lb), self.eval(ub)),
            MathFunc::Tan | MathFunc::Atanh => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// Piecewise-linear function with `f(0) == 0`.
///
/// `slopes.len() == breakpoints.len() + 1`; slope `k` applies between
/// breakpoints `k - 1` and `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlFunction {
    /// Slopes, one more than breakpoints
    pub slopes: Vec<f64>,
    /// Increasing breakpoints
    pub breakpoints: Vec<f64>,
}

impl PlFunction {
    /// Create from slopes and breakpoints.
    #[must_use]
    pub fn new(slopes: Vec<f64>, breakpoints: Vec<f64>) -> Self {
        assert_eq!(slopes.len(), breakpoints.len() + 1, "pl function needs one more slope than breakpoints");
        Self {
            slopes,
            breakpoints,
        }
    }

    fn segment(&self, k: usize) -> (f64, f64) {
        let lo = if k == 0 { f64::NEG_INFINITY } else { self.breakpoints[k - 1] };
        let hi = self.breakpoints.get(k).copied().unwrap_or(f64::INFINITY);
        (lo, hi)
    }

    /// Evaluate at `x` by integrating the slopes from zero.
    pub fn eval(&self, x: f64) -> f64 {
        let mut sum = 0.0;
        for (k, &s) in self.slopes.iter().enumerate() {
            let (lo, hi) = self.segment(k);
            let len = if x >= 0.0 {
                (x.min(hi) - lo.max(0.0)).max(0.0)
            } else {
                -(hi.min(0.0) - lo.max(x)).max(0.0)
            };
            if len != 0.0 {
                sum += s * len;
            }
        }
        sum
    }

    /// Range of the function over `[lb, ub]`.
    pub fn range(&self, (lb, ub): (f64, f64)) -> (f64, f64) {
        if lb.is_infinite() || ub.is_infinite() {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        let points = std::iter::once(lb)
            .chain(self.breakpoints.iter().copied().filter(|&b| b > lb && b < ub))
            .chain(std::iter::once(ub));
        points.map(|p| self.eval(p)).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        })
    }
}

/// Right-hand side of a functional constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum FuncExpr {
    /// `a'x + b`
    Linear(AffineExpr),
    /// Quadratic expression
    Quadratic(QuadraticExpr),
    /// `max(args)`
    Max(Vec<VarId>),
    /// `min(args)`
    Min(Vec<VarId>),
    /// `|x|`
    Abs(VarId),
    /// Conjunction of binaries
    And(Vec<VarId>),
    /// Disjunction of binaries
    Or(Vec<VarId>),
    /// Negation of a binary
    Not(VarId),
    /// `x / y`
    Div(VarId, VarId),
    /// Numeric if-then-else on a binary condition
    IfThen {
        /// Condition binary
        cond: VarId,
        /// Value if true
        then_val: VarId,
        /// Value if false
        else_val: VarId,
    },
    /// Logical if-then-else on binaries
    Implication {
        /// Condition binary
        cond: VarId,
        /// Value if true
        then_val: VarId,
        /// Value if false
        else_val: VarId,
    },
    /// All arguments take different values
    AllDiff(Vec<VarId>),
    /// Number of arguments equal to a constant
    NumberofConst {
        /// Value counted
        value: f64,
        /// Arguments
        args: Vec<VarId>,
    },
    /// Number of arguments equal to a variable
    NumberofVar {
        /// Value counted
        value: VarId,
        /// Arguments
        args: Vec<VarId>,
    },
    /// Number of true binaries
    Count(Vec<VarId>),
    /// Elementary function
    Math(MathFunc, VarId),
    /// `base^x`
    ExpA {
        /// Constant base
        base: f64,
        /// Exponent variable
        arg: VarId,
    },
    /// `log_base(x)`
    LogA {
        /// Constant base
        base: f64,
        /// Argument
        arg: VarId,
    },
    /// `x^exponent`
    Pow {
        /// Base variable
        base: VarId,
        /// Constant exponent
        exponent: f64,
    },
    /// Truth value of a comparison
    Conditional(Comparison),
    /// Piecewise-linear function of one variable
    Pl {
        /// The function
        pl: PlFunction,
        /// Argument
        arg: VarId,
    },
}

impl Eq for FuncExpr {}

impl Hash for FuncExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            FuncExpr::Linear(e) => e.hash(state),
            FuncExpr::Quadratic(e) => e.hash(state),
            FuncExpr::Max(a)
            | FuncExpr::Min(a)
            | FuncExpr::And(a)
            | FuncExpr::Or(a)
            | FuncExpr::AllDiff(a)
            | FuncExpr::Count(a) => a.hash(state),
            FuncExpr::Abs(v) | FuncExpr::Not(v) => v.hash(state),
            FuncExpr::Div(a, b) => {
                a.hash(state);
                b.hash(state);
            }
            FuncExpr::IfThen {
                cond,
                then_val,
                else_val,
            }
            | FuncExpr::Implication {
                cond,
                then_val,
                else_val,
            } => {
                cond.hash(state);
                then_val.hash(state);
                else_val.hash(state);
            }
            FuncExpr::NumberofConst { value, args } => {
                hash_f64(*value, state);
                args.hash(state);
            }
            FuncExpr::NumberofVar { value, args } => {
                value.hash(state);
                args.hash(state);
            }
            FuncExpr::Math(f, v) => {
                f.hash(state);
                v.hash(state);
            }
            FuncExpr::ExpA { base, arg } | FuncExpr::LogA { base, arg } => {
                hash_f64(*base, state);
                arg.hash(state);
            }
            FuncExpr::Pow { base, exponent } => {
                base.hash(state);
                hash_f64(*exponent, state);
            }
            FuncExpr::Conditional(c) => c.hash(state),
            FuncExpr::Pl { pl, arg } => {
                for &s in &pl.slopes {
                    hash_f64(s, state);
                }
                for &b in &pl.breakpoints {
                    hash_f64(b, state);
                }
                arg.hash(state);
            }
        }
    }
}

fn fold_range(args: &[VarId], b: &impl VarBounds, pick: fn(f64, f64) -> f64) -> (f64, f64) {
    let mut it = args.iter().map(|&v| b.bounds(v));
    let first = it.next().unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
    it.fold(first, |acc, r| (pick(acc.0, r.0), pick(acc.1, r.1)))
}

impl FuncExpr {
    /// Keeper kind.
    pub fn kind(&self) -> ConstraintKind {
        use ConstraintKind as K;
        match self {
            FuncExpr::Linear(_) => K::LinearFunctional,
            FuncExpr::Quadratic(_) => K::QuadraticFunctional,
            FuncExpr::Max(_) => K::Max,
            FuncExpr::Min(_) => K::Min,
            FuncExpr::Abs(_) => K::Abs,
            FuncExpr::And(_) => K::And,
            FuncExpr::Or(_) => K::Or,
            FuncExpr::Not(_) => K::Not,
            FuncExpr::Div(..) => K::Div,
            FuncExpr::IfThen { .. } => K::IfThen,
            FuncExpr::Implication { .. } => K::Implication,
            FuncExpr::AllDiff(_) => K::AllDiff,
            FuncExpr::NumberofConst { .. } => K::NumberofConst,
            FuncExpr::NumberofVar { .. } => K::NumberofVar,
            FuncExpr::Count(_) => K::Count,
            FuncExpr::Math(f, _) => f.kind(),
            FuncExpr::ExpA { .. } => K::ExpA,
            FuncExpr::LogA { .. } => K::LogA,
            FuncExpr::Pow { .. } => K::Pow,
            FuncExpr::Conditional(c) => c.conditional_kind(),
            FuncExpr::Pl { .. } => K::Pl,
        }
    }

    /// Argument variables, with repetitions.
    pub fn args(&self) -> Vec<VarId> {
        match self {
            FuncExpr::Linear(e) => e.terms.vars().to_vec(),
            FuncExpr::Quadratic(e) => e.terms.vars().collect(),
            FuncExpr::Max(a)
            | FuncExpr::Min(a)
            | FuncExpr::And(a)
            | FuncExpr::Or(a)
            | FuncExpr::AllDiff(a)
            | FuncExpr::Count(a)
            | FuncExpr::NumberofConst { args: a, .. } => a.clone(),
            FuncExpr::Abs(v) | FuncExpr::Not(v) | FuncExpr::Math(_, v) => vec![*v],
            FuncExpr::Div(a, b) => vec![*a, *b],
            FuncExpr::IfThen {
                cond,
                then_val,
                else_val,
            }
            | FuncExpr::Implication {
                cond,
                then_val,
                else_val,
            } => vec![*cond, *then_val, *else_val],
            FuncExpr::NumberofVar { value, args } => {
                let mut v = Vec::with_capacity(args.len() + 1);
                v.push(*value);
                v.extend_from_slice(args);
                v
            }
            FuncExpr::ExpA { arg, .. } | FuncExpr::LogA { arg, .. } | FuncExpr::Pl { arg, .. } => vec![*arg],
            FuncExpr::Pow { base, .. } => vec![*base],
            FuncExpr::Conditional(c) => c.body.vars(),
        }
    }

    /// Whether the result is a truth value.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            FuncExpr::And(_)
                | FuncExpr::Or(_)
                | FuncExpr::Not(_)
                | FuncExpr::Implication { .. }
                | FuncExpr::AllDiff(_)
                | FuncExpr::Conditional(_)
        )
    }

    /// Value of the expression when every argument is known.
    pub fn evaluate(&self, value: impl Fn(VarId) -> Option<f64>) -> Option<f64> {
        let val = |v: &VarId| value(*v);
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        let vals = |a: &[VarId]| a.iter().map(val).collect::<Option<Vec<f64>>>();
        let r = match self {
            FuncExpr::Linear(e) => {
                let mut s = e.constant;
                for (c, v) in e.terms.iter() {
                    s += c * value(v)?;
                }
                s
            }
            FuncExpr::Quadratic(e) => {
                let mut s = e.constant;
                for (c, v) in e.terms.lin.iter() {
                    s += c * value(v)?;
                }
                for (c, a, b) in e.terms.quad.iter() {
                    s += c * value(a)? * value(b)?;
                }
                s
            }
            FuncExpr::Max(a) => vals(a)?.into_iter().fold(f64::NEG_INFINITY, f64::max),
            FuncExpr::Min(a) => vals(a)?.into_iter().fold(f64::INFINITY, f64::min),
            FuncExpr::Abs(v) => val(v)?.abs(),
            FuncExpr::And(a) => truth(vals(a)?.iter().all(|&x| x != 0.0)),
            FuncExpr::Or(a) => truth(vals(a)?.iter().any(|&x| x != 0.0)),
            FuncExpr::Not(v) => truth(val(v)? == 0.0),
            FuncExpr::Div(a, b) => {
                let d = val(b)?;
                if d == 0.0 {
                    return None;
                }
                val(a)? / d
            }
            FuncExpr::IfThen {
                cond,
                then_val,
                else_val,
            }
            | FuncExpr::Implication {
                cond,
                then_val,
                else_val,
            } => {
                if val(cond)? != 0.0 {
                    val(then_val)?
                } else {
                    val(else_val)?
                }
            }
            FuncExpr::AllDiff(a) => {
                let mut xs = vals(a)?;
                xs.sort_by(f64::total_cmp);
                truth(xs.windows(2).all(|w| w[0] != w[1]))
            }
            FuncExpr::NumberofConst { value: k, args } => {
                vals(args)?.iter().filter(|&&x| x == *k).count() as f64
            }
            FuncExpr::NumberofVar { value: k, args } => {
                let k = val(k)?;
                vals(args)?.iter().filter(|&&x| x == k).count() as f64
            }
            FuncExpr::Count(a) => vals(a)?.iter().filter(|&&x| x != 0.0).count() as f64,
            FuncExpr::Math(f, v) => f.eval(val(v)?),
            FuncExpr::ExpA { base, arg } => base.powf(val(arg)?),
            FuncExpr::LogA { base, arg } => val(arg)?.log(*base),
            FuncExpr::Pow { base, exponent } => val(base)?.powf(*exponent),
            FuncExpr::Conditional(c) => truth(c.op.holds(c.body.evaluate(&value)?, c.rhs)),
            FuncExpr::Pl { pl, arg } => pl.eval(val(arg)?),
        };
        r.is_finite().then_some(r)
    }

    /// Bounds of the result implied by the argument domains.
    pub fn result_bounds(&self, b: &impl VarBounds) -> (f64, f64) {
        const FREE: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
        let n = |a: &[VarId]| a.len() as f64;
        match self {
            FuncExpr::Linear(e) => {
                let (lo, hi) = bounds::lin_range(&e.terms, b);
                (lo + e.constant, hi + e.constant)
            }
            FuncExpr::Quadratic(e) => {
                let (lo, hi) = bounds::quad_and_lin_range(&e.terms, b);
                (lo + e.constant, hi + e.constant)
            }
            FuncExpr::Max(a) => fold_range(a, b, f64::max),
            FuncExpr::Min(a) => fold_range(a, b, f64::min),
            FuncExpr::Abs(v) => {
                let (lb, ub) = b.bounds(*v);
                if lb >= 0.0 {
                    (lb, ub)
                } else if ub <= 0.0 {
                    (-ub, -lb)
                } else {
                    (0.0, (-lb).max(ub))
                }
            }
            FuncExpr::And(a) => {
                let lo = if a.iter().all(|&v| b.lb(v) >= 1.0) { 1.0 } else { 0.0 };
                let hi = if a.iter().any(|&v| b.ub(v) <= 0.0) { 0.0 } else { 1.0 };
                (lo, hi)
            }
            FuncExpr::Or(a) => {
                let lo = if a.iter().any(|&v| b.lb(v) >= 1.0) { 1.0 } else { 0.0 };
                let hi = if a.iter().all(|&v| b.ub(v) <= 0.0) { 0.0 } else { 1.0 };
                (lo, hi)
            }
            FuncExpr::Not(v) => {
                let (lb, ub) = b.bounds(*v);
                ((1.0 - ub).max(0.0), (1.0 - lb).min(1.0))
            }
            FuncExpr::Implication { .. } | FuncExpr::AllDiff(_) | FuncExpr::Conditional(_) => (0.0, 1.0),
            FuncExpr::Div(..) | FuncExpr::LogA { .. } => FREE,
            FuncExpr::IfThen {
                then_val, else_val, ..
            } => {
                let (t, e) = (b.bounds(*then_val), b.bounds(*else_val));
                (t.0.min(e.0), t.1.max(e.1))
            }
            FuncExpr::NumberofConst { args, .. }
            | FuncExpr::NumberofVar { args, .. }
            | FuncExpr::Count(args) => (0.0, n(args)),
            FuncExpr::Math(f, v) => f.range(b.bounds(*v)),
            FuncExpr::ExpA { .. } => (0.0, f64::INFINITY),
            FuncExpr::Pow { base, exponent } => {
                let p = *exponent;
                let r = b.bounds(*base);
                if p == 0.0 {
                    (1.0, 1.0)
                } else if p == 2.0 {
                    bounds::square_range(r)
                } else if p > 0.0 && p.fract() == 0.0 && (p as i64) % 2 == 0 {
                    let (lo, hi) = bounds::square_range(r);
                    (lo.powf(p / 2.0), hi.powf(p / 2.0))
                } else if p > 0.0 && r.0 >= 0.0 {
                    (r.0.powf(p), r.1.powf(p))
                } else {
                    FREE
                }
            }
            FuncExpr::Pl { pl, arg } => pl.range(b.bounds(*arg)),
        }
    }

    /// Whether the result is integer whenever the arguments are.
    pub fn result_is_integer(&self, b: &impl VarBounds) -> bool {
        let all_int = |a: &[VarId]| a.iter().all(|&v| b.is_integer(v));
        match self {
            FuncExpr::Linear(e) => bounds::lin_is_integer(&e.terms, e.constant, b),
            FuncExpr::Quadratic(e) => {
                bounds::lin_is_integer(&e.terms.lin, e.constant, b)
                    && e.terms.quad.iter().all(|(c, x, y)| {
                        c.fract() == 0.0 && b.is_integer(x) && b.is_integer(y)
                    })
            }
            FuncExpr::Max(a) | FuncExpr::Min(a) => all_int(a),
            FuncExpr::Abs(v) => b.is_integer(*v),
            FuncExpr::IfThen {
                then_val, else_val, ..
            } => b.is_integer(*then_val) && b.is_integer(*else_val),
            FuncExpr::Pow { base, exponent } => {
                b.is_integer(*base) && *exponent >= 0.0 && exponent.fract() == 0.0
            }
            FuncExpr::And(_)
            | FuncExpr::Or(_)
            | FuncExpr::Not(_)
            | FuncExpr::Implication { .. }
            | FuncExpr::AllDiff(_)
            | FuncExpr::Conditional(_)
            | FuncExpr::NumberofConst { .. }
            | FuncExpr::NumberofVar { .. }
            | FuncExpr::Count(_) => true,
            FuncExpr::Div(..)
            | FuncExpr::Math(..)
            | FuncExpr::ExpA { .. }
            | FuncExpr::LogA { .. }
            | FuncExpr::Pl { .. } => false,
        }
    }

    /// Bring linear and quadratic terms to canonical order.
    pub fn canonicalize(&mut self) {
        match self {
            FuncExpr::Linear(e) => e.sort_terms(),
            FuncExpr::Quadratic(e) => e.sort_terms(),
            FuncExpr::Conditional(c) => c.body.sort_terms(),
            _ => {}
        }
    }
}

/// `result == expr`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionalConstraint {
    /// Variable defined by the constraint
    pub result: VarId,
    /// Defining expression
    pub expr: FuncExpr,
    /// Usage context of the result
    pub context: Context,
}

impl FunctionalConstraint {
    /// Create with an empty context.
    #[must_use]
    pub fn new(result: VarId, expr: FuncExpr) -> Self {
        Self {
            result,
            expr,
            context: Context::None,
        }
    }

    /// Keeper kind.
    pub fn kind(&self) -> ConstraintKind {
        self.expr.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::testing::Domains;
    use crate::expr::LinTerms;
    use rustc_hash::FxHashMap;

    fn x(i: usize) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn test_context_merge() {
        assert_eq!(Context::None.merge(Context::Positive), Context::Positive);
        assert_eq!(Context::Positive.merge(Context::Negative), Context::Mixed);
        assert_eq!(Context::Negative.negate(), Context::Positive);
        assert!(Context::Positive.has_positive());
        assert!(!Context::Positive.has_negative());
    }

    #[test]
    fn test_unrecorded_context_needs_both_sides() {
        assert!(Context::None.has_positive());
        assert!(Context::None.has_negative());
        assert!(!Context::Negative.has_positive());
    }

    #[test]
    fn test_pl_eval_integrates_from_zero() {
        // slope -1 below 0, slope 2 on [0, 1], slope 0 above 1
        let pl = PlFunction::new(vec![-1.0, 2.0, 0.0], vec![0.0, 1.0]);
        assert_eq!(pl.eval(0.0), 0.0);
        assert_eq!(pl.eval(-3.0), 3.0);
        assert_eq!(pl.eval(0.5), 1.0);
        assert_eq!(pl.eval(5.0), 2.0);
        assert_eq!(pl.range((-1.0, 2.0)), (0.0, 2.0));
    }

    #[test]
    fn test_dedup_key_ignores_negative_zero() {
        let a = FuncExpr::NumberofConst {
            value: 0.0,
            args: vec![x(0), x(1)],
        };
        let b = FuncExpr::NumberofConst {
            value: -0.0,
            args: vec![x(0), x(1)],
        };
        let mut map = FxHashMap::default();
        map.insert(a, 7usize);
        assert_eq!(map.get(&b), Some(&7));
    }

    #[test]
    fn test_evaluate_requires_all_args() {
        let e = FuncExpr::Max(vec![x(0), x(1)]);
        assert_eq!(e.evaluate(|v| Some(v.index() as f64)), Some(1.0));
        assert_eq!(e.evaluate(|v| (v == x(0)).then_some(1.0)), None);
        let d = FuncExpr::Div(x(0), x(1));
        assert_eq!(d.evaluate(|_| Some(0.0)), None);
    }

    #[test]
    fn test_result_bounds() {
        let d = Domains(vec![(-2.0, 1.0, true), (0.0, 3.0, true), (0.0, 1.0, true)]);
        assert_eq!(FuncExpr::Max(vec![x(0), x(1)]).result_bounds(&d), (0.0, 3.0));
        assert_eq!(FuncExpr::Min(vec![x(0), x(1)]).result_bounds(&d), (-2.0, 1.0));
        assert_eq!(FuncExpr::Abs(x(0)).result_bounds(&d), (0.0, 2.0));
        assert_eq!(FuncExpr::Count(vec![x(2), x(2)]).result_bounds(&d), (0.0, 2.0));
        let lin = FuncExpr::Linear(AffineExpr::new(LinTerms::single(2.0, x(1)), 1.0));
        assert_eq!(lin.result_bounds(&d), (1.0, 7.0));
        assert!(lin.result_is_integer(&d));
        let p = FuncExpr::Pow {
            base: x(0),
            exponent: 2.0,
        };
        assert_eq!(p.result_bounds(&d), (0.0, 4.0));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(FuncExpr::Math(MathFunc::Cosh, x(0)).kind(), ConstraintKind::Cosh);
        assert_eq!(
            FuncExpr::NumberofVar {
                value: x(0),
                args: vec![x(1)]
            }
            .args(),
            vec![x(0), x(1)]
        );
    }
}
