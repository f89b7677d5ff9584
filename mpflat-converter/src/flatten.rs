//! Expression trees into flat constraints.
//!
//! [`ExprFlattener`] walks expressions built with an
//! [`ExprFactory`](mpflat_core::ExprFactory). Numeric subtrees become
//! affine or quadratic expressions where possible, and result variables
//! defined by functional constraints otherwise. Logical subtrees become
//! binary result variables; at the root of a logical constraint, conjunctions
//! and plain comparisons are added as constraints directly.
//!
//! Variable references are resolved through the table given at
//! construction. Common expressions are flattened once into a variable and
//! shared by every reference.

use crate::bounds;
use crate::constraint::{AlgebraicBody, CmpOp, Comparison, FuncExpr, MathFunc, PlFunction};
use crate::context::{ConversionContext, VarOrConst};
use crate::converter::FlatConverter;
use crate::expr::{AffineExpr, LinTerms, QuadraticExpr};
use crate::objective::{LinearObjective, ObjSense, QuadraticObjective};
use crate::solver::SolverCapabilities;
use crate::var::VarId;
use mpflat_core::expr::{
    BinaryExpr, BinaryLogicalExpr, CountExpr, IfExpr, ImplicationExpr, IteratedExpr, IteratedLogicalExpr,
    LogicalConstant, LogicalCountExpr, NotExpr, NumericConstant, PairwiseExpr, PlTerm, Reference, RelationalExpr,
    UnaryExpr,
};
use mpflat_core::{ExprFactory, FlatError, Kind, LogicalExpr, NumericExpr, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

const TARGET: &str = "expression flattener";

/// Walks factory expressions and adds their flat form to a converter.
#[derive(Debug)]
pub struct ExprFlattener<'f> {
    factory: &'f ExprFactory,
    vars: Vec<VarId>,
    common_exprs: Vec<NumericExpr>,
    common_vars: FxHashMap<usize, VarId>,
}

impl<'f> ExprFlattener<'f> {
    /// Flattener over `factory`; reference `i` denotes `vars[i]`.
    #[must_use]
    pub fn new(factory: &'f ExprFactory, vars: Vec<VarId>) -> Self {
        Self {
            factory,
            vars,
            common_exprs: Vec::new(),
            common_vars: FxHashMap::default(),
        }
    }

    /// Definitions of the common expressions, by index.
    #[must_use]
    pub fn with_common_exprs(mut self, exprs: Vec<NumericExpr>) -> Self {
        self.common_exprs = exprs;
        self
    }

    /// Add an objective given as an expression.
    ///
    /// A constant term is carried by a variable fixed to one.
    pub fn add_objective<S: SolverCapabilities>(
        &mut self,
        converter: &mut FlatConverter<S>,
        sense: ObjSense,
        expr: NumericExpr,
        name: &str,
    ) -> Result<usize> {
        let q = converter.with_source("objective_expr", |ctx| {
            let mut q = self.flatten_numeric(ctx, expr)?;
            if q.constant != 0.0 {
                let one = ctx.make_fixed_var(1.0);
                q.terms.lin.add_term(q.constant, one);
                q.constant = 0.0;
            }
            Ok(q)
        })?;
        let lin = LinearObjective::new(sense, q.terms.lin, name);
        converter.add_objective(QuadraticObjective::new(lin, q.terms.quad))
    }

    /// Add `lb <= expr <= ub`.
    pub fn add_algebraic_constraint<S: SolverCapabilities>(
        &mut self,
        converter: &mut FlatConverter<S>,
        expr: NumericExpr,
        lb: f64,
        ub: f64,
    ) -> Result<()> {
        converter.with_source("algebraic_expr", |ctx| {
            let q = self.flatten_numeric(ctx, expr)?;
            add_range(ctx, q, lb, ub)
        })
    }

    /// Add a logical constraint: `expr` must hold.
    pub fn add_logical_constraint<S: SolverCapabilities>(
        &mut self,
        converter: &mut FlatConverter<S>,
        expr: LogicalExpr,
    ) -> Result<()> {
        converter.with_source("logical_expr", |ctx| self.assert_logical(ctx, expr))
    }

    /// Require `expr` to be true.
    ///
    /// Conjunctions are split, and `<=`, `==` and `>=` comparisons become
    /// algebraic constraints. Anything else is flattened into a binary that
    /// is fixed to one.
    pub fn assert_logical(&mut self, ctx: &mut ConversionContext<'_>, expr: LogicalExpr) -> Result<()> {
        let f = self.factory;
        match f.kind(expr) {
            Kind::Bool => {
                if f.cast_unchecked::<LogicalConstant>(expr).value(f) {
                    Ok(())
                } else {
                    Err(FlatError::infeasible("logical constraint is constant false"))
                }
            }
            Kind::And => {
                let e = f.cast_unchecked::<BinaryLogicalExpr>(expr);
                self.assert_logical(ctx, e.lhs(f))?;
                self.assert_logical(ctx, e.rhs(f))
            }
            Kind::Forall => {
                for arg in f.cast_unchecked::<IteratedLogicalExpr>(expr).args(f) {
                    self.assert_logical(ctx, arg)?;
                }
                Ok(())
            }
            kind @ (Kind::Le | Kind::Eq | Kind::Ge) => {
                let e = f.cast_unchecked::<RelationalExpr>(expr);
                let diff = self.difference(ctx, e.lhs(f), e.rhs(f))?;
                let (lb, ub) = match kind {
                    Kind::Le => (f64::NEG_INFINITY, 0.0),
                    Kind::Ge => (0.0, f64::INFINITY),
                    _ => (0.0, 0.0),
                };
                add_range(ctx, diff, lb, ub)
            }
            _ => {
                let b = self.flatten_logical(ctx, expr)?;
                ctx.fix_as_true(b)
            }
        }
    }

    /// Flatten a numeric expression into an affine or quadratic form over
    /// flat variables.
    pub fn flatten_numeric(&mut self, ctx: &mut ConversionContext<'_>, expr: NumericExpr) -> Result<QuadraticExpr> {
        let f = self.factory;
        let kind = f.kind(expr);
        match kind {
            Kind::Number => Ok(constant(f.cast_unchecked::<NumericConstant>(expr).value(f))),
            Kind::Variable => {
                let index = f.cast_unchecked::<Reference>(expr).index(f);
                let v = self.vars.get(index).copied().ok_or_else(|| {
                    FlatError::invalid_operation(format!(
                        "variable reference {index} out of range ({} variables)",
                        self.vars.len()
                    ))
                })?;
                Ok(variable(v))
            }
            Kind::CommonExpr => {
                let index = f.cast_unchecked::<Reference>(expr).index(f);
                Ok(variable(self.common_expr_var(ctx, index)?))
            }
            Kind::Minus => {
                let mut q = self.flatten_numeric(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                q.negate();
                Ok(q)
            }
            Kind::Abs => {
                let x = self.numeric_var(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                self.result(ctx, FuncExpr::Abs(x))
            }
            Kind::Pow2 => {
                let base = self.flatten_numeric(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                self.power(ctx, base, 2.0)
            }
            Kind::Sqrt => {
                let base = self.flatten_numeric(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                self.power(ctx, base, 0.5)
            }
            Kind::Floor | Kind::Ceil => {
                let q = self.flatten_numeric(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                if let Some(c) = as_constant(&q) {
                    return Ok(constant(if kind == Kind::Floor { c.floor() } else { c.ceil() }));
                }
                if q.is_affine() && bounds::lin_is_integer(&q.terms.lin, q.constant, ctx.model()) {
                    return Ok(q);
                }
                Err(FlatError::unsupported(format!("{} of a non-integer expression", kind.name()), TARGET))
            }
            Kind::Log10 => {
                let x = self.numeric_var(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                self.result(ctx, FuncExpr::LogA { base: 10.0, arg: x })
            }
            k if Kind::UNARY.contains(k) => {
                let func = math_func(k).ok_or_else(|| FlatError::unsupported(k.name(), TARGET))?;
                let q = self.flatten_numeric(ctx, f.cast_unchecked::<UnaryExpr>(expr).arg(f))?;
                if let Some(c) = as_constant(&q) {
                    return Ok(constant(func.eval(c)));
                }
                let x = ctx.convert_to_var(q)?;
                self.result(ctx, FuncExpr::Math(func, x))
            }
            k if Kind::BINARY.contains(k) => self.binary(ctx, f.cast_unchecked::<BinaryExpr>(expr)),
            Kind::If => {
                let e = f.cast_unchecked::<IfExpr>(expr);
                let cond = self.flatten_logical(ctx, e.condition(f))?;
                let then_val = self.numeric_var(ctx, e.then_expr(f))?;
                let else_val = self.numeric_var(ctx, e.else_expr(f))?;
                self.result(
                    ctx,
                    FuncExpr::IfThen {
                        cond,
                        then_val,
                        else_val,
                    },
                )
            }
            Kind::PlTerm => {
                let e = f.cast_unchecked::<PlTerm>(expr);
                let pl = PlFunction::new(e.slopes(f), e.breakpoints(f));
                let arg = self.numeric_var(ctx, e.arg(f).into())?;
                self.result(ctx, FuncExpr::Pl { pl, arg })
            }
            Kind::Sum => {
                let mut sum = QuadraticExpr::default();
                for arg in f.cast_unchecked::<IteratedExpr>(expr).args(f) {
                    sum.add(&self.flatten_numeric(ctx, arg)?);
                }
                Ok(sum)
            }
            Kind::Min | Kind::Max => {
                let e = f.cast_unchecked::<IteratedExpr>(expr);
                if e.num_args(f) == 0 {
                    return Err(FlatError::invalid_operation(format!("{} of no arguments", kind.name())));
                }
                let args = e.args(f).map(|a| self.numeric_var(ctx, a)).collect::<Result<Vec<_>>>()?;
                let fe = if kind == Kind::Min { FuncExpr::Min(args) } else { FuncExpr::Max(args) };
                self.result(ctx, fe)
            }
            Kind::NumberOf => {
                let e = f.cast_unchecked::<IteratedExpr>(expr);
                let value = self.flatten_numeric(ctx, e.arg(f, 0))?;
                let args = e.args(f).skip(1).map(|a| self.numeric_var(ctx, a)).collect::<Result<Vec<_>>>()?;
                let fe = match as_constant(&value) {
                    Some(value) => FuncExpr::NumberofConst { value, args },
                    None => FuncExpr::NumberofVar {
                        value: ctx.convert_to_var(value)?,
                        args,
                    },
                };
                self.result(ctx, fe)
            }
            Kind::Count => {
                let args = self.logical_args(ctx, f.cast_unchecked::<CountExpr>(expr))?;
                self.result(ctx, FuncExpr::Count(args))
            }
            other => Err(FlatError::unsupported(other.name(), TARGET)),
        }
    }

    /// Flatten a numeric expression into a single variable.
    pub fn numeric_var(&mut self, ctx: &mut ConversionContext<'_>, expr: NumericExpr) -> Result<VarId> {
        let q = self.flatten_numeric(ctx, expr)?;
        ctx.convert_to_var(q)
    }

    /// Flatten a logical expression into a binary variable holding its value.
    pub fn flatten_logical(&mut self, ctx: &mut ConversionContext<'_>, expr: LogicalExpr) -> Result<VarId> {
        let f = self.factory;
        let kind = f.kind(expr);
        let fe = match kind {
            Kind::Bool => {
                let value = f.cast_unchecked::<LogicalConstant>(expr).value(f);
                return Ok(ctx.make_fixed_var(if value { 1.0 } else { 0.0 }));
            }
            Kind::Not => FuncExpr::Not(self.flatten_logical(ctx, f.cast_unchecked::<NotExpr>(expr).arg(f))?),
            Kind::Or | Kind::And | Kind::Iff => {
                let e = f.cast_unchecked::<BinaryLogicalExpr>(expr);
                let a = self.flatten_logical(ctx, e.lhs(f))?;
                let b = self.flatten_logical(ctx, e.rhs(f))?;
                match kind {
                    Kind::Or => FuncExpr::Or(vec![a, b]),
                    Kind::And => FuncExpr::And(vec![a, b]),
                    _ => {
                        let diff = QuadraticExpr::from(AffineExpr::new(LinTerms::from_pairs([(1.0, a), (-1.0, b)]), 0.0));
                        comparison(diff, CmpOp::Eq)
                    }
                }
            }
            k if Kind::RELATIONAL.contains(k) => {
                let e = f.cast_unchecked::<RelationalExpr>(expr);
                let diff = self.difference(ctx, e.lhs(f), e.rhs(f))?;
                match relational_op(k) {
                    Some(op) => comparison(diff, op),
                    None => {
                        let eq = ctx.assign_result_var(comparison(diff, CmpOp::Eq))?;
                        FuncExpr::Not(eq)
                    }
                }
            }
            k if Kind::LOGICAL_COUNT.contains(k) => {
                let e = f.cast_unchecked::<LogicalCountExpr>(expr);
                let bound = self.flatten_numeric(ctx, e.lhs(f))?;
                let args = self.logical_args(ctx, e.rhs(f))?;
                let count = ctx.assign_result_var(FuncExpr::Count(args))?;
                let mut diff = variable(count);
                let mut neg = bound;
                neg.negate();
                diff.add(&neg);
                let (op, negated) = match k {
                    Kind::AtLeast => (CmpOp::Ge, false),
                    Kind::AtMost => (CmpOp::Le, false),
                    Kind::Exactly => (CmpOp::Eq, false),
                    Kind::NotAtLeast => (CmpOp::Lt, false),
                    Kind::NotAtMost => (CmpOp::Gt, false),
                    _ => (CmpOp::Eq, true),
                };
                if negated {
                    FuncExpr::Not(ctx.assign_result_var(comparison(diff, op))?)
                } else {
                    comparison(diff, op)
                }
            }
            Kind::Implication => {
                let e = f.cast_unchecked::<ImplicationExpr>(expr);
                FuncExpr::Implication {
                    cond: self.flatten_logical(ctx, e.condition(f))?,
                    then_val: self.flatten_logical(ctx, e.then_expr(f))?,
                    else_val: self.flatten_logical(ctx, e.else_expr(f))?,
                }
            }
            Kind::Exists | Kind::Forall => {
                let e = f.cast_unchecked::<IteratedLogicalExpr>(expr);
                let args = e.args(f).map(|a| self.flatten_logical(ctx, a)).collect::<Result<Vec<_>>>()?;
                if args.is_empty() {
                    return Ok(ctx.make_fixed_var(if kind == Kind::Forall { 1.0 } else { 0.0 }));
                }
                if kind == Kind::Forall { FuncExpr::And(args) } else { FuncExpr::Or(args) }
            }
            Kind::AllDiff | Kind::NotAllDiff => {
                let e = f.cast_unchecked::<PairwiseExpr>(expr);
                let args = e.args(f).map(|a| self.numeric_var(ctx, a)).collect::<Result<Vec<_>>>()?;
                if kind == Kind::AllDiff {
                    FuncExpr::AllDiff(args)
                } else {
                    FuncExpr::Not(ctx.assign_result_var(FuncExpr::AllDiff(args))?)
                }
            }
            other => return Err(FlatError::unsupported(other.name(), TARGET)),
        };
        ctx.assign_result_var(fe)
    }

    fn binary(&mut self, ctx: &mut ConversionContext<'_>, e: BinaryExpr) -> Result<QuadraticExpr> {
        let f = self.factory;
        let kind = f.kind(e);
        let mut lhs = self.flatten_numeric(ctx, e.lhs(f))?;
        let mut rhs = self.flatten_numeric(ctx, e.rhs(f))?;
        if let (Some(a), Some(b)) = (as_constant(&lhs), as_constant(&rhs)) {
            if let Some(c) = eval_binary(kind, a, b) {
                return Ok(constant(c));
            }
        }
        match kind {
            Kind::Add => {
                lhs.add(&rhs);
                Ok(lhs)
            }
            Kind::Sub => {
                rhs.negate();
                lhs.add(&rhs);
                Ok(lhs)
            }
            Kind::Mul => self.product(ctx, lhs, rhs),
            Kind::Div => match as_constant(&rhs) {
                Some(c) if c == 0.0 => Err(FlatError::invalid_operation("division by the constant zero")),
                Some(c) => {
                    lhs.scale(1.0 / c);
                    Ok(lhs)
                }
                None => {
                    let x = ctx.convert_to_var(lhs)?;
                    let y = ctx.convert_to_var(rhs)?;
                    self.result(ctx, FuncExpr::Div(x, y))
                }
            },
            Kind::Pow | Kind::PowConstExp | Kind::PowConstBase => match (as_constant(&lhs), as_constant(&rhs)) {
                (_, Some(p)) => self.power(ctx, lhs, p),
                (Some(base), None) => {
                    let arg = ctx.convert_to_var(rhs)?;
                    self.result(ctx, FuncExpr::ExpA { base, arg })
                }
                (None, None) => Err(FlatError::unsupported("power with a variable base and exponent", TARGET)),
            },
            Kind::Less => {
                rhs.negate();
                lhs.add(&rhs);
                let d = ctx.convert_to_var(lhs)?;
                let zero = ctx.make_fixed_var(0.0);
                self.result(ctx, FuncExpr::Max(vec![d, zero]))
            }
            other => Err(FlatError::unsupported(
                format!("expression '{}' with non-constant arguments", other.name()),
                TARGET,
            )),
        }
    }

    fn product(&mut self, ctx: &mut ConversionContext<'_>, mut a: QuadraticExpr, mut b: QuadraticExpr) -> Result<QuadraticExpr> {
        if let Some(c) = as_constant(&a) {
            b.scale(c);
            return Ok(b);
        }
        if let Some(c) = as_constant(&b) {
            a.scale(c);
            return Ok(a);
        }
        let a = affine_or_var(ctx, a)?;
        let b = affine_or_var(ctx, b)?;
        Ok(QuadraticExpr::product(&a, &b))
    }

    fn power(&mut self, ctx: &mut ConversionContext<'_>, base: QuadraticExpr, p: f64) -> Result<QuadraticExpr> {
        if let Some(c) = as_constant(&base) {
            return Ok(constant(c.powf(p)));
        }
        if p == 0.0 {
            return Ok(constant(1.0));
        }
        if p == 1.0 {
            return Ok(base);
        }
        if p == 2.0 {
            let a = affine_or_var(ctx, base)?;
            return Ok(QuadraticExpr::product(&a, &a));
        }
        let x = ctx.convert_to_var(base)?;
        self.result(ctx, FuncExpr::Pow { base: x, exponent: p })
    }

    fn difference(
        &mut self,
        ctx: &mut ConversionContext<'_>,
        lhs: NumericExpr,
        rhs: NumericExpr,
    ) -> Result<QuadraticExpr> {
        let mut diff = self.flatten_numeric(ctx, lhs)?;
        let mut r = self.flatten_numeric(ctx, rhs)?;
        r.negate();
        diff.add(&r);
        Ok(diff)
    }

    fn logical_args(&mut self, ctx: &mut ConversionContext<'_>, e: CountExpr) -> Result<Vec<VarId>> {
        let f = self.factory;
        e.args(f).map(|a| self.flatten_logical(ctx, a)).collect()
    }

    fn common_expr_var(&mut self, ctx: &mut ConversionContext<'_>, index: usize) -> Result<VarId> {
        if let Some(&v) = self.common_vars.get(&index) {
            return Ok(v);
        }
        let expr = self.common_exprs.get(index).copied().ok_or_else(|| {
            FlatError::invalid_operation(format!(
                "common expression {index} out of range ({} defined)",
                self.common_exprs.len()
            ))
        })?;
        let v = self.numeric_var(ctx, expr)?;
        debug!("common expression {} flattened into {}", index, v);
        self.common_vars.insert(index, v);
        Ok(v)
    }

    fn result(&mut self, ctx: &mut ConversionContext<'_>, expr: FuncExpr) -> Result<QuadraticExpr> {
        Ok(match ctx.assign_result(expr)? {
            VarOrConst::Var(v) => variable(v),
            VarOrConst::Const(c) => constant(c),
        })
    }
}

fn add_range(ctx: &mut ConversionContext<'_>, q: QuadraticExpr, lb: f64, ub: f64) -> Result<()> {
    if let Some(c) = as_constant(&q) {
        if c < lb || c > ub {
            return Err(FlatError::infeasible(format!("constant {c} outside [{lb}, {ub}]")));
        }
        return Ok(());
    }
    let (body, c) = split(q);
    ctx.add_algebraic_as_root(body, lb - c, ub - c)?;
    Ok(())
}

fn comparison(diff: QuadraticExpr, op: CmpOp) -> FuncExpr {
    let (body, c) = split(diff);
    FuncExpr::Conditional(Comparison::new(body, op, -c))
}

fn split(q: QuadraticExpr) -> (AlgebraicBody, f64) {
    if q.is_affine() {
        (AlgebraicBody::Linear(q.terms.lin), q.constant)
    } else {
        (AlgebraicBody::Quadratic(q.terms), q.constant)
    }
}

fn constant(c: f64) -> QuadraticExpr {
    AffineExpr::constant(c).into()
}

fn variable(v: VarId) -> QuadraticExpr {
    AffineExpr::variable(v).into()
}

fn as_constant(q: &QuadraticExpr) -> Option<f64> {
    (q.terms.lin.coefs().iter().all(|&c| c == 0.0) && q.terms.quad.iter().all(|(c, _, _)| c == 0.0))
        .then_some(q.constant)
}

fn affine_or_var(ctx: &mut ConversionContext<'_>, q: QuadraticExpr) -> Result<AffineExpr> {
    match q.into_affine() {
        Ok(a) => Ok(a),
        Err(q) => Ok(AffineExpr::variable(ctx.convert_to_var(q)?)),
    }
}

fn relational_op(kind: Kind) -> Option<CmpOp> {
    match kind {
        Kind::Lt => Some(CmpOp::Lt),
        Kind::Le => Some(CmpOp::Le),
        Kind::Eq => Some(CmpOp::Eq),
        Kind::Ge => Some(CmpOp::Ge),
        Kind::Gt => Some(CmpOp::Gt),
        _ => None,
    }
}

fn math_func(kind: Kind) -> Option<MathFunc> {
    Some(match kind {
        Kind::Exp => MathFunc::Exp,
        Kind::Log => MathFunc::Log,
        Kind::Sin => MathFunc::Sin,
        Kind::Cos => MathFunc::Cos,
        Kind::Tan => MathFunc::Tan,
        Kind::Asin => MathFunc::Asin,
        Kind::Acos => MathFunc::Acos,
        Kind::Atan => MathFunc::Atan,
        Kind::Sinh => MathFunc::Sinh,
        Kind::Cosh => MathFunc::Cosh,
        Kind::Tanh => MathFunc::Tanh,
        Kind::Asinh => MathFunc::Asinh,
        Kind::Acosh => MathFunc::Acosh,
        Kind::Atanh => MathFunc::Atanh,
        _ => return None,
    })
}

fn eval_binary(kind: Kind, a: f64, b: f64) -> Option<f64> {
    Some(match kind {
        Kind::Add => a + b,
        Kind::Sub => a - b,
        Kind::Less => (a - b).max(0.0),
        Kind::Mul => a * b,
        Kind::Div if b != 0.0 => a / b,
        Kind::TruncDiv if b != 0.0 => (a / b).trunc(),
        Kind::Mod if b != 0.0 => a % b,
        Kind::Pow | Kind::PowConstBase | Kind::PowConstExp => a.powf(b),
        Kind::Atan2 => a.atan2(b),
        Kind::Round | Kind::Precision | Kind::Trunc => {
            let scale = 10f64.powi(b as i32);
            match kind {
                Kind::Round => (a * scale).round() / scale,
                Kind::Trunc => (a * scale).trunc() / scale,
                _ if a == 0.0 => 0.0,
                _ => {
                    let digits = b as i32 - 1 - a.abs().log10().floor() as i32;
                    let s = 10f64.powi(digits);
                    (a * s).round() / s
                }
            }
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintKind;
    use crate::context::ConverterState;
    use crate::link::LinkContext;
    use crate::var::VarType;
    use mpflat_core::{AcceptanceLevel, ConverterConfig};

    fn state() -> ConverterState {
        ConverterState::new(ConverterConfig::default(), |_| AcceptanceLevel::Recommended)
    }

    #[test]
    fn test_linear_expression_stays_affine() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let y = f.make_variable(1);
        let three = f.make_numeric_constant(3.0);
        let prod = f.make_binary(Kind::Mul, three, x);
        let sum = f.make_binary(Kind::Add, prod, y);
        let e = f.make_binary(Kind::Sub, sum, three);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(2, 0.0, 1.0, VarType::Continuous);
        let mut fl = ExprFlattener::new(&f, vars.clone());
        let q = fl.flatten_numeric(&mut ctx, e.into()).unwrap();
        assert!(q.is_affine());
        assert_eq!(q.constant, -3.0);
        assert_eq!(q.terms.lin.iter().collect::<Vec<_>>(), vec![(3.0, vars[0]), (1.0, vars[1])]);
        assert_eq!(st.model().num_active_constraints(), 0);
    }

    #[test]
    fn test_product_of_variables_is_quadratic() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let y = f.make_variable(1);
        let e = f.make_binary(Kind::Mul, x, y);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(2, -1.0, 1.0, VarType::Continuous);
        let q = ExprFlattener::new(&f, vars).flatten_numeric(&mut ctx, e.into()).unwrap();
        assert_eq!(q.terms.quad.len(), 1);
    }

    #[test]
    fn test_constant_subtree_folded() {
        let mut f = ExprFactory::new();
        let two = f.make_numeric_constant(2.0);
        let three = f.make_numeric_constant(3.0);
        let p = f.make_binary(Kind::Pow, two, three);
        let e = f.make_unary(Kind::Minus, p);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let q = ExprFlattener::new(&f, Vec::new()).flatten_numeric(&mut ctx, e.into()).unwrap();
        assert_eq!(as_constant(&q), Some(-8.0));
    }

    #[test]
    fn test_max_shared_between_occurrences() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let y = f.make_variable(1);
        let m1 = f.make_iterated(Kind::Max, &[x.into(), y.into()]);
        let m2 = f.make_iterated(Kind::Max, &[x.into(), y.into()]);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(2, 0.0, 5.0, VarType::Continuous);
        let mut fl = ExprFlattener::new(&f, vars);
        let r1 = fl.numeric_var(&mut ctx, m1.into()).unwrap();
        let r2 = fl.numeric_var(&mut ctx, m2.into()).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(st.model().keeper(ConstraintKind::Max).len(), 1);
    }

    #[test]
    fn test_common_expression_flattened_once() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let ex = f.make_unary(Kind::Exp, x);
        let c = f.make_common_expr(0);
        let sum = f.make_iterated(Kind::Sum, &[c.into(), c.into()]);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(1, 0.0, 1.0, VarType::Continuous);
        let mut fl = ExprFlattener::new(&f, vars).with_common_exprs(vec![ex.into()]);
        let q = fl.flatten_numeric(&mut ctx, sum.into()).unwrap();
        assert_eq!(q.terms.lin.len(), 2);
        assert_eq!(q.terms.lin.vars()[0], q.terms.lin.vars()[1]);
        assert_eq!(st.model().keeper(ConstraintKind::Exp).len(), 1);
    }

    #[test]
    fn test_root_comparison_becomes_row() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let y = f.make_variable(1);
        let four = f.make_numeric_constant(4.0);
        let sum = f.make_binary(Kind::Add, x, y);
        let le = f.make_relational(Kind::Le, sum, four);
        let ge = f.make_relational(Kind::Ge, x, y);
        let both = f.make_binary_logical(Kind::And, le, ge);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(2, 0.0, 10.0, VarType::Continuous);
        ExprFlattener::new(&f, vars).assert_logical(&mut ctx, both.into()).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::LinLE).num_active(), 1);
        assert_eq!(m.keeper(ConstraintKind::LinGE).num_active(), 1);
        assert_eq!(m.keeper(ConstraintKind::Or).len(), 0);
    }

    #[test]
    fn test_root_disjunction_fixed_true() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(0);
        let one = f.make_numeric_constant(1.0);
        let eight = f.make_numeric_constant(8.0);
        let a = f.make_relational(Kind::Le, x, one);
        let b = f.make_relational(Kind::Ge, x, eight);
        let or = f.make_binary_logical(Kind::Or, a, b);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(1, 0.0, 10.0, VarType::Integer);
        ExprFlattener::new(&f, vars).assert_logical(&mut ctx, or.into()).unwrap();
        let m = st.model();
        assert_eq!(m.keeper(ConstraintKind::Or).len(), 1);
        assert_eq!(m.keeper(ConstraintKind::CondLinLE).len(), 1);
        assert_eq!(m.keeper(ConstraintKind::CondLinGE).len(), 1);
        let (_, or) = m.keeper(ConstraintKind::Or).iter_active().next().unwrap();
        let r = or.result_var().unwrap();
        assert_eq!(crate::bounds::VarBounds::bounds(m, r), (1.0, 1.0));
    }

    #[test]
    fn test_false_constraint_is_infeasible() {
        let mut f = ExprFactory::new();
        let no = f.make_logical_constant(false);
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let err = ExprFlattener::new(&f, Vec::new()).assert_logical(&mut ctx, no.into()).unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_call_is_unsupported() {
        let mut f = ExprFactory::new();
        let func = f.add_function("myfunc", 1, mpflat_core::expr::FunctionType::Numeric);
        let x = f.make_variable(0);
        let mut b = f.begin_call(func, 1);
        b.add_arg(x);
        let call = f.end_call(b);

        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let vars = ctx.add_vars(1, 0.0, 1.0, VarType::Continuous);
        let err = ExprFlattener::new(&f, vars).flatten_numeric(&mut ctx, call.into()).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_unknown_variable_reference() {
        let mut f = ExprFactory::new();
        let x = f.make_variable(3);
        let mut st = state();
        let mut ctx = ConversionContext::new(&mut st, LinkContext::inactive());
        let err = ExprFlattener::new(&f, Vec::new()).flatten_numeric(&mut ctx, x.into()).unwrap_err();
        assert!(matches!(err, FlatError::InvalidOperation(_)));
    }
}
