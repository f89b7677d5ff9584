//! Model-building operations shared by the converter and every conversion.
//!
//! [`ConversionContext`] pairs the converter state with the [`LinkContext`]
//! of the current step. Everything created through it is recorded as a
//! target of the active link source.

use crate::bounds::{self, VarBounds};
use crate::constraint::{
    AlgebraicBody, AlgebraicConstraint, CmpOp, Constraint, ConstraintKind, Context, FuncExpr, FunctionalConstraint,
};
use crate::expr::{AffineExpr, LinTerms, QuadraticExpr};
use crate::keeper::{ConstraintRef, ConstraintStatus};
use crate::link::LinkContext;
use crate::model::FlatModel;
use crate::stats::ConversionStats;
use crate::var::{VarId, VarType};
use mpflat_core::{AcceptanceLevel, ConverterConfig, FlatError, Result, WarningLog};
use mpflat_presolve::{GraphExporter, NodeId, NodeRange, ValueKind, ValuePresolver};
use rustc_hash::FxHashMap;
use tracing::debug;

const NEG_INF: f64 = f64::NEG_INFINITY;
const INF: f64 = f64::INFINITY;

/// Result of a functional-constraint assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarOrConst {
    /// Value held by a variable
    Var(VarId),
    /// Value known at conversion time
    Const(f64),
}

impl VarOrConst {
    /// The variable, if any.
    pub fn as_var(self) -> Option<VarId> {
        match self {
            VarOrConst::Var(v) => Some(v),
            VarOrConst::Const(_) => None,
        }
    }

    /// The constant, if any.
    pub fn as_const(self) -> Option<f64> {
        match self {
            VarOrConst::Var(_) => None,
            VarOrConst::Const(c) => Some(c),
        }
    }
}

/// Everything owned by one converter instance except the target and the
/// converter registry.
#[derive(Debug)]
pub struct ConverterState {
    pub(crate) config: ConverterConfig,
    pub(crate) model: FlatModel,
    pub(crate) presolver: ValuePresolver,
    pub(crate) var_node: NodeId,
    init_exprs: Vec<Option<ConstraintRef>>,
    usage: Vec<u32>,
    fixed_vars: FxHashMap<u64, VarId>,
    pub(crate) warnings: WarningLog,
    pub(crate) stats: ConversionStats,
    pub(crate) reconvert: Vec<ConstraintRef>,
}

impl ConverterState {
    /// Create the state with per-kind acceptance already resolved.
    pub fn new(config: ConverterConfig, acceptance: impl Fn(ConstraintKind) -> AcceptanceLevel) -> Self {
        Self::with_exporter(config, acceptance, None)
    }

    /// Like [`new`](Self::new), exporting the value graph from the first node on.
    pub fn with_exporter(
        config: ConverterConfig,
        acceptance: impl Fn(ConstraintKind) -> AcceptanceLevel,
        exporter: Option<GraphExporter>,
    ) -> Self {
        let mut presolver = ValuePresolver::new();
        if let Some(ex) = exporter {
            presolver.set_exporter(ex);
        }
        let var_node = presolver.add_node("vars", ValueKind::Primal);
        let model = FlatModel::new(&mut presolver, acceptance);
        Self {
            config,
            model,
            presolver,
            var_node,
            init_exprs: Vec::new(),
            usage: Vec::new(),
            fixed_vars: FxHashMap::default(),
            warnings: WarningLog::new(),
            stats: ConversionStats::default(),
            reconvert: Vec::new(),
        }
    }

    /// The flat model.
    pub fn model(&self) -> &FlatModel {
        &self.model
    }

    /// The value presolver.
    pub fn presolver(&self) -> &ValuePresolver {
        &self.presolver
    }

    /// Counters gathered so far.
    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    /// Number of live consumers of `v`.
    pub fn usage(&self, v: VarId) -> u32 {
        self.usage[v.index()]
    }

    /// Constraint defining `v`.
    pub fn init_expr(&self, v: VarId) -> Option<ConstraintRef> {
        self.init_exprs[v.index()]
    }

    /// Value slot of constraint `r`.
    pub fn constraint_slot(&self, r: ConstraintRef) -> NodeRange {
        NodeRange::single(self.model.keeper(r.kind).value_node(), r.index)
    }
}

/// Converter state plus the link scope of the current step.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    state: &'a mut ConverterState,
    link: LinkContext,
}

impl<'a> ConversionContext<'a> {
    /// Open a step with the given link scope.
    pub fn new(state: &'a mut ConverterState, link: LinkContext) -> Self {
        Self { state, link }
    }

    /// Close the step and hand back its link scope.
    pub fn into_link(self) -> LinkContext {
        self.link
    }

    /// Link scope of the step.
    pub fn link(&self) -> &LinkContext {
        &self.link
    }

    /// Converter configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.state.config
    }

    /// The flat model.
    pub fn model(&self) -> &FlatModel {
        &self.state.model
    }

    /// Read-only converter state.
    pub fn state(&self) -> &ConverterState {
        &*self.state
    }

    /// Acceptance of `kind` after overrides.
    pub fn acceptance(&self, kind: ConstraintKind) -> AcceptanceLevel {
        self.state.model.keeper(kind).acceptance()
    }

    /// Lower bound of `v`.
    pub fn lb(&self, v: VarId) -> f64 {
        self.state.model.lb(v)
    }

    /// Upper bound of `v`.
    pub fn ub(&self, v: VarId) -> f64 {
        self.state.model.ub(v)
    }

    /// Both bounds of `v`.
    pub fn bounds(&self, v: VarId) -> (f64, f64) {
        self.state.model.bounds(v)
    }

    /// Type of `v`.
    pub fn var_type(&self, v: VarId) -> VarType {
        self.state.model.var_type(v)
    }

    /// Whether `v` is integer.
    pub fn is_integer(&self, v: VarId) -> bool {
        self.state.model.is_integer(v)
    }

    /// Whether `v` is a binary.
    pub fn is_binary(&self, v: VarId) -> bool {
        self.state.model.is_binary(v)
    }

    /// Value of `v` if its bounds coincide.
    pub fn fixed_value(&self, v: VarId) -> Option<f64> {
        self.state.model.fixed_value(v)
    }

    /// Whether `x` counts as infinite.
    pub fn is_infinite(&self, x: f64) -> bool {
        self.state.config.is_infinite(x)
    }

    /// Constraint defining `v`.
    pub fn init_expr(&self, v: VarId) -> Option<ConstraintRef> {
        self.state.init_expr(v)
    }

    /// Number of live consumers of `v`.
    pub fn usage(&self, v: VarId) -> u32 {
        self.state.usage(v)
    }

    /// Record a warning.
    pub fn add_warning(&mut self, key: &str, message: impl Into<String>) {
        self.state.warnings.add(key, message);
    }

    fn normalize_bound(&self, x: f64) -> f64 {
        if self.is_infinite(x) { x.signum() * INF } else { x }
    }

    /// Append a variable without shortcuts.
    pub(crate) fn push_var(&mut self, lb: f64, ub: f64, ty: VarType) -> VarId {
        let (lb, ub) = (self.normalize_bound(lb), self.normalize_bound(ub));
        let v = self.state.model.push_var(lb, ub, ty);
        self.state.init_exprs.push(None);
        self.state.usage.push(0);
        let slot = self.state.presolver.add_slots(self.state.var_node, 1);
        debug_assert_eq!(slot.range.beg, v.index());
        self.link.auto_link(slot);
        v
    }

    /// Add an auxiliary variable. Fixed domains reuse a cached variable.
    pub fn add_var(&mut self, lb: f64, ub: f64, ty: VarType) -> VarId {
        if lb == ub && self.state.config.preprocess_anything {
            return self.make_fixed_var(lb);
        }
        self.state.stats.vars_created += 1;
        self.push_var(lb, ub, ty)
    }

    /// Add `n` auxiliary variables with equal domains.
    pub fn add_vars(&mut self, n: usize, lb: f64, ub: f64, ty: VarType) -> Vec<VarId> {
        (0..n).map(|_| self.add_var(lb, ub, ty)).collect()
    }

    /// Add a binary variable.
    pub fn add_binary(&mut self) -> VarId {
        self.add_var(0.0, 1.0, VarType::Integer)
    }

    /// Variable fixed to `value`, shared by all requests for the same value.
    pub fn make_fixed_var(&mut self, value: f64) -> VarId {
        let key = if value == 0.0 { 0u64 } else { value.to_bits() };
        if let Some(&v) = self.state.fixed_vars.get(&key) {
            self.state.stats.fixed_var_hits += 1;
            return v;
        }
        let ty = if value.fract() == 0.0 { VarType::Integer } else { VarType::Continuous };
        let v = self.push_var(value, value, ty);
        self.state.stats.vars_created += 1;
        self.state.fixed_vars.insert(key, v);
        v
    }

    /// Intersect the domain of `v` with `[lb, ub]`.
    pub fn narrow_var_bounds(&mut self, v: VarId, lb: f64, ub: f64) -> Result<()> {
        let (old_lb, old_ub) = self.bounds(v);
        let (new_lb, new_ub) = (old_lb.max(lb), old_ub.min(ub));
        if new_lb > new_ub {
            return Err(FlatError::infeasible(format!(
                "empty domain for {v}: [{old_lb}, {old_ub}] narrowed by [{lb}, {ub}]"
            )));
        }
        self.state.model.set_lb(v, new_lb);
        self.state.model.set_ub(v, new_ub);
        Ok(())
    }

    /// Register one more consumer of `v`.
    pub fn increment_usage(&mut self, v: VarId) {
        self.state.usage[v.index()] += 1;
    }

    /// Drop one consumer of `v`; an unused defined variable loses its
    /// defining constraint.
    pub fn decrement_usage(&mut self, v: VarId) {
        let u = &mut self.state.usage[v.index()];
        debug_assert!(*u > 0, "usage of {v} dropped below zero");
        *u = u.saturating_sub(1);
        if *u == 0 {
            if let Some(r) = self.state.init_exprs[v.index()] {
                if self.state.model.keeper(r.kind).status(r.index) == ConstraintStatus::Active {
                    self.state.stats.init_exprs_eliminated += 1;
                    debug!(var = %v, constraint = %r, "eliminating unused definition");
                }
                self.mark_as_deleted(r);
            }
        }
    }

    /// Store a constraint.
    ///
    /// Argument usage is counted, a value slot is created and auto-linked.
    /// A functional constraint is entered into its keeper map and becomes the
    /// definition of its result variable if it has none yet.
    pub fn add_constraint(&mut self, con: impl Into<Constraint>) -> Result<ConstraintRef> {
        let mut con = con.into();
        self.normalize_sides(&mut con);
        match &mut con {
            Constraint::Functional(fc) => fc.expr.canonicalize(),
            Constraint::Algebraic(c) => c.body.sort_terms(),
            _ => {}
        }
        for v in con.arguments() {
            self.increment_usage(v);
        }
        let functional = con.as_functional().map(|fc| (fc.result, fc.expr.clone()));
        let r = self.state.model.push_constraint(con);
        let node = self.state.model.keeper(r.kind).value_node();
        let slot = self.state.presolver.add_slots(node, 1);
        debug_assert_eq!(slot.range.beg, r.index);
        self.link.auto_link(slot);
        if let Some((result, expr)) = functional {
            self.state.model.keeper_mut(r.kind).map_insert(expr, r.index)?;
            let init = &mut self.state.init_exprs[result.index()];
            if init.is_none() {
                *init = Some(r);
            }
        }
        debug!(constraint = %r, "added");
        Ok(r)
    }

    /// Store a constraint asserted at model level.
    ///
    /// Each result variable it uses first receives the context the
    /// constraint puts it in.
    pub fn add_constraint_as_root(&mut self, con: impl Into<Constraint>) -> Result<ConstraintRef> {
        let mut con = con.into();
        self.normalize_sides(&mut con);
        for (v, c) in root_contexts(&con) {
            self.propagate_result(v, NEG_INF, INF, c)?;
        }
        self.add_constraint(con)
    }

    /// Add `lb <= body <= ub`, dropping it if both sides are infinite.
    pub fn add_algebraic(&mut self, body: impl Into<AlgebraicBody>, lb: f64, ub: f64) -> Result<Option<ConstraintRef>> {
        match self.algebraic_row(body.into(), lb, ub) {
            Some(con) => self.add_constraint(con).map(Some),
            None => Ok(None),
        }
    }

    /// [`add_algebraic`](Self::add_algebraic) for a row asserted at model level.
    pub fn add_algebraic_as_root(
        &mut self,
        body: impl Into<AlgebraicBody>,
        lb: f64,
        ub: f64,
    ) -> Result<Option<ConstraintRef>> {
        match self.algebraic_row(body.into(), lb, ub) {
            Some(con) => self.add_constraint_as_root(con).map(Some),
            None => Ok(None),
        }
    }

    fn algebraic_row(&self, body: AlgebraicBody, lb: f64, ub: f64) -> Option<AlgebraicConstraint> {
        let mut con = AlgebraicConstraint::new(body.simplified(), lb, ub);
        self.normalize_row(&mut con);
        (!con.is_free()).then_some(con)
    }

    /// Map practically infinite constraint sides to true infinities.
    pub(crate) fn normalize_sides(&self, con: &mut Constraint) {
        match con {
            Constraint::Algebraic(c) => self.normalize_row(c),
            Constraint::Complementarity(c) => self.normalize_row(&mut c.con),
            _ => {}
        }
    }

    fn normalize_row(&self, con: &mut AlgebraicConstraint) {
        con.lb = self.normalize_bound(con.lb);
        con.ub = self.normalize_bound(con.ub);
    }

    /// Find or create the value of `expr`.
    ///
    /// Constants and identities are folded, equal expressions share one
    /// result variable, and a new result variable gets the bounds and
    /// integrality implied by the arguments.
    pub fn assign_result(&mut self, expr: FuncExpr) -> Result<VarOrConst> {
        let mut expr = expr;
        expr.canonicalize();
        if self.state.config.preprocess_anything {
            if let Some(c) = expr.evaluate(|v| self.fixed_value(v)) {
                return Ok(VarOrConst::Const(c));
            }
            if let Some(r) = self.simplify(&expr)? {
                return Ok(r);
            }
        }
        let kind = expr.kind();
        if let Some(i) = self.state.model.keeper(kind).map_find(&expr) {
            self.state.stats.map_hits += 1;
            if let Some(Constraint::Functional(fc)) = self.state.model.keeper(kind).constraint(i) {
                return Ok(VarOrConst::Var(fc.result));
            }
        }
        let (lb, ub) = expr.result_bounds(&self.state.model);
        if lb == ub && lb.is_finite() && self.state.config.preprocess_anything {
            return Ok(VarOrConst::Const(lb));
        }
        let ty = if expr.result_is_integer(&self.state.model) { VarType::Integer } else { VarType::Continuous };
        self.state.stats.vars_created += 1;
        let r = self.push_var(lb, ub, ty);
        self.add_constraint(FunctionalConstraint::new(r, expr))?;
        Ok(VarOrConst::Var(r))
    }

    /// [`assign_result`](Self::assign_result), constants as fixed variables.
    pub fn assign_result_var(&mut self, expr: FuncExpr) -> Result<VarId> {
        Ok(match self.assign_result(expr)? {
            VarOrConst::Var(v) => v,
            VarOrConst::Const(c) => self.make_fixed_var(c),
        })
    }

    /// Variable holding the value of an affine or quadratic expression.
    pub fn convert_to_var(&mut self, expr: QuadraticExpr) -> Result<VarId> {
        match expr.into_affine() {
            Ok(a) => self.assign_result_var(FuncExpr::Linear(a)),
            Err(q) => self.assign_result_var(FuncExpr::Quadratic(q)),
        }
    }

    fn simplify(&mut self, expr: &FuncExpr) -> Result<Option<VarOrConst>> {
        let cfg = &self.state.config;
        let (eqbinary, eqresult) = (cfg.preprocess_equality_binary, cfg.preprocess_equality_result);
        let out = match expr {
            FuncExpr::Linear(e) => e.as_variable().map(VarOrConst::Var),
            FuncExpr::Quadratic(e) if e.is_affine() => {
                let a = AffineExpr::new(e.terms.lin.clone(), e.constant);
                Some(self.assign_result(FuncExpr::Linear(a))?)
            }
            FuncExpr::Max(a) | FuncExpr::Min(a) if a.len() == 1 => Some(VarOrConst::Var(a[0])),
            FuncExpr::And(a) | FuncExpr::Or(a) if a.len() == 1 && self.is_binary(a[0]) => {
                Some(VarOrConst::Var(a[0]))
            }
            FuncExpr::Conditional(c) => {
                let (lo, hi) = bounds::body_range(&c.body, &self.state.model);
                let always = match c.op {
                    CmpOp::Eq => lo == hi && lo == c.rhs,
                    op => op.holds(hi, c.rhs) && op.holds(lo, c.rhs),
                };
                let never = match c.op {
                    CmpOp::Eq => c.rhs < lo || c.rhs > hi,
                    op => !op.holds(lo, c.rhs) && !op.holds(hi, c.rhs),
                };
                let lin = c.body.lin();
                let single_binary = !c.body.is_quadratic()
                    && lin.len() == 1
                    && lin.coefs()[0] != 0.0
                    && self.is_binary(lin.vars()[0]);
                if always {
                    Some(VarOrConst::Const(1.0))
                } else if never {
                    Some(VarOrConst::Const(0.0))
                } else if eqresult
                    && c.op == CmpOp::Eq
                    && c.rhs.fract() != 0.0
                    && bounds::body_is_integer(&c.body, &self.state.model)
                {
                    Some(VarOrConst::Const(0.0))
                } else if eqbinary && c.op == CmpOp::Eq && single_binary {
                    let (b, val) = (lin.vars()[0], c.rhs / lin.coefs()[0]);
                    if val == 1.0 {
                        Some(VarOrConst::Var(b))
                    } else if val == 0.0 {
                        Some(VarOrConst::Var(self.make_complement_var(b)?))
                    } else {
                        Some(VarOrConst::Const(0.0))
                    }
                } else {
                    None
                }
            }
            _ => None,
        };
        Ok(out)
    }

    /// The variable `1 - b` for a variable with domain within `[0, 1]`.
    pub fn make_complement_var(&mut self, b: VarId) -> Result<VarId> {
        let (lb, ub) = self.bounds(b);
        if lb < 0.0 || ub > 1.0 {
            return Err(FlatError::invalid_operation(format!(
                "complement of {b} requires bounds within [0, 1], got [{lb}, {ub}]"
            )));
        }
        self.assign_result_var(FuncExpr::Linear(AffineExpr::new(LinTerms::single(-1.0, b), 1.0)))
    }

    /// Force a logical result to true: it gets a consumer and the value is
    /// propagated into its definition.
    pub fn fix_as_true(&mut self, v: VarId) -> Result<()> {
        self.increment_usage(v);
        self.propagate_result(v, 1.0, 1.0, Context::Positive)
    }

    /// Narrow `v` to `[lb, ub]` and push bounds and `ctx` into the
    /// constraint defining it.
    pub fn propagate_result(&mut self, v: VarId, lb: f64, ub: f64, ctx: Context) -> Result<()> {
        let before = self.bounds(v);
        self.narrow_var_bounds(v, lb, ub)?;
        let bounds_changed = self.bounds(v) != before;
        let Some(r) = self.init_expr(v) else {
            return Ok(());
        };
        let status = self.state.model.keeper(r.kind).status(r.index);
        let Some(fc) = self.state.model.keeper_mut(r.kind).functional_mut(r.index) else {
            return Ok(());
        };
        if fc.result != v {
            return Ok(());
        }
        let old_ctx = fc.context;
        let new_ctx = old_ctx.merge(ctx);
        fc.context = new_ctx;
        let expr = fc.expr.clone();
        let ctx_changed = new_ctx != old_ctx;
        if !bounds_changed && !ctx_changed {
            return Ok(());
        }
        if status == ConstraintStatus::Bridged && ctx_changed && old_ctx != Context::None {
            self.reactivate(r);
        }
        let (lb, ub) = self.bounds(v);
        self.propagate_into_args(&expr, lb, ub, new_ctx)
    }

    fn propagate_into_args(&mut self, expr: &FuncExpr, lb: f64, ub: f64, ctx: Context) -> Result<()> {
        match expr {
            FuncExpr::And(args) => {
                let lo = if lb >= 1.0 { 1.0 } else { NEG_INF };
                for &a in args {
                    self.propagate_result(a, lo, INF, ctx)?;
                }
            }
            FuncExpr::Or(args) => {
                let (lo, hi) = if ub <= 0.0 {
                    (NEG_INF, 0.0)
                } else if lb >= 1.0 && args.len() == 1 {
                    (1.0, INF)
                } else {
                    (NEG_INF, INF)
                };
                for &a in args {
                    self.propagate_result(a, lo, hi, ctx)?;
                }
            }
            FuncExpr::Not(a) => self.propagate_result(*a, 1.0 - ub, 1.0 - lb, ctx.negate())?,
            FuncExpr::Max(args) => {
                for &a in args {
                    self.propagate_result(a, NEG_INF, ub, ctx)?;
                }
            }
            FuncExpr::Min(args) => {
                for &a in args {
                    self.propagate_result(a, lb, INF, ctx)?;
                }
            }
            FuncExpr::Count(args) => {
                let (lo, hi) = if ub <= 0.0 {
                    (NEG_INF, 0.0)
                } else if lb >= args.len() as f64 {
                    (1.0, INF)
                } else {
                    (NEG_INF, INF)
                };
                for &a in args {
                    self.propagate_result(a, lo, hi, ctx)?;
                }
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
                self.propagate_result(*cond, NEG_INF, INF, Context::Mixed)?;
                self.propagate_result(*then_val, NEG_INF, INF, ctx)?;
                self.propagate_result(*else_val, NEG_INF, INF, ctx)?;
            }
            FuncExpr::Linear(e) => {
                for (c, a) in e.terms.iter() {
                    let actx = if c >= 0.0 { ctx } else { ctx.negate() };
                    self.propagate_result(a, NEG_INF, INF, actx)?;
                }
            }
            FuncExpr::NumberofConst { .. } | FuncExpr::NumberofVar { .. } | FuncExpr::Conditional(_) => {}
            other => {
                for a in other.args() {
                    self.propagate_result(a, NEG_INF, INF, Context::Mixed)?;
                }
            }
        }
        Ok(())
    }

    /// Put a bridged constraint back into the conversion queue.
    fn reactivate(&mut self, r: ConstraintRef) {
        let args = match self.state.model.keeper(r.kind).constraint(r.index) {
            Some(c) => c.arguments(),
            None => return,
        };
        for a in args {
            self.increment_usage(a);
        }
        self.state.model.keeper_mut(r.kind).set_status(r.index, ConstraintStatus::Active);
        self.state.reconvert.push(r);
        debug!(constraint = %r, "context widened, converting again");
    }

    /// Remove a constraint. Live constraints release their arguments.
    pub fn mark_as_deleted(&mut self, r: ConstraintRef) {
        let keeper = self.state.model.keeper_mut(r.kind);
        match keeper.status(r.index) {
            ConstraintStatus::Deleted => {}
            ConstraintStatus::Bridged => keeper.set_status(r.index, ConstraintStatus::Deleted),
            ConstraintStatus::Active => {
                let args = keeper.constraint(r.index).map(Constraint::arguments).unwrap_or_default();
                keeper.set_status(r.index, ConstraintStatus::Deleted);
                for a in args {
                    self.decrement_usage(a);
                }
            }
        }
    }

    /// Mark an active constraint as replaced; it releases its arguments.
    pub fn mark_as_bridged(&mut self, r: ConstraintRef) {
        let keeper = self.state.model.keeper_mut(r.kind);
        if keeper.status(r.index) != ConstraintStatus::Active {
            return;
        }
        let args = keeper.constraint(r.index).map(Constraint::arguments).unwrap_or_default();
        keeper.set_status(r.index, ConstraintStatus::Bridged);
        for a in args {
            self.decrement_usage(a);
        }
    }

    /// Give `v` a new definition; the previous one is deleted.
    ///
    /// If an equal expression already defines another variable, `v` is tied
    /// to it by a linear equality instead.
    pub fn redefine_variable(&mut self, v: VarId, expr: FuncExpr) -> Result<()> {
        let mut expr = expr;
        expr.canonicalize();
        let kind = expr.kind();
        let old = self.init_expr(v);
        let existing = self
            .state
            .model
            .keeper(kind)
            .map_find(&expr)
            .and_then(|i| self.state.model.keeper(kind).constraint(i))
            .and_then(Constraint::result_var);
        match existing {
            Some(s) if s == v => return Ok(()),
            Some(s) => {
                let body = LinTerms::from_pairs([(1.0, v), (-1.0, s)]);
                self.add_constraint(AlgebraicConstraint::eq(body, 0.0))?;
                self.state.init_exprs[v.index()] = None;
            }
            None => {
                self.state.init_exprs[v.index()] = None;
                self.add_constraint(FunctionalConstraint::new(v, expr))?;
            }
        }
        if let Some(old) = old {
            self.mark_as_deleted(old);
        }
        Ok(())
    }

    /// Delete unused definitions and fix their results to zero.
    ///
    /// Returns the number of variables fixed.
    pub(crate) fn fix_unused_defined_vars(&mut self) -> usize {
        let n = self.state.model.num_vars();
        for i in (0..n).rev() {
            let v = VarId::new(i);
            if self.usage(v) != 0 {
                continue;
            }
            if let Some(r) = self.init_expr(v) {
                if self.state.model.keeper(r.kind).status(r.index) == ConstraintStatus::Active {
                    self.state.stats.init_exprs_eliminated += 1;
                    self.mark_as_deleted(r);
                }
            }
        }
        let mut fixed = 0;
        for i in 0..n {
            let v = VarId::new(i);
            let deleted = self
                .init_expr(v)
                .is_some_and(|r| self.state.model.keeper(r.kind).status(r.index) == ConstraintStatus::Deleted);
            if deleted && self.usage(v) == 0 {
                self.state.model.set_lb(v, 0.0);
                self.state.model.set_ub(v, 0.0);
                fixed += 1;
            }
        }
        fixed
    }
}

/// Context of every result variable a root constraint uses.
fn root_contexts(con: &Constraint) -> Vec<(VarId, Context)> {
    match con {
        Constraint::Algebraic(c) => side_contexts(&c.body, c.lb > NEG_INF, c.ub < INF),
        Constraint::Indicator(ic) => {
            let (lower, upper) = match ic.con.op {
                CmpOp::Lt | CmpOp::Le => (false, true),
                CmpOp::Gt | CmpOp::Ge => (true, false),
                CmpOp::Eq => (true, true),
            };
            let mut out = side_contexts(&ic.con.body, lower, upper);
            out.push((ic.binvar, Context::Mixed));
            out
        }
        Constraint::Functional(_) => Vec::new(),
        other => other.arguments().into_iter().map(|v| (v, Context::Mixed)).collect(),
    }
}

/// Context of each term of a row with the given finite sides.
///
/// A lower bound keeps the sign of the coefficient and an upper bound flips
/// it. Rows bounded on both sides make every term mixed.
fn side_contexts(body: &AlgebraicBody, lower: bool, upper: bool) -> Vec<(VarId, Context)> {
    let by_sign = |c: f64| match (lower, upper) {
        (true, true) => Context::Mixed,
        (true, false) if c >= 0.0 => Context::Positive,
        (true, false) => Context::Negative,
        (false, true) if c >= 0.0 => Context::Negative,
        (false, true) => Context::Positive,
        (false, false) => Context::None,
    };
    let mut out: Vec<_> = body.lin().iter().map(|(c, v)| (v, by_sign(c))).collect();
    if let AlgebraicBody::Quadratic(q) = body {
        out.extend(q.quad.vars().map(|v| (v, Context::Mixed)));
    }
    out
}
