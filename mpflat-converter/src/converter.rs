//! The flat converter: model input, conversion loop, solver push and
//! solution mapping.
//!
//! The life cycle is
//!
//! 1. input: [`add_var`](FlatConverter::add_var),
//!    [`add_constraint`](FlatConverter::add_constraint),
//!    [`add_objective`](FlatConverter::add_objective), or the flattener
//!    working through [`with_source`](FlatConverter::with_source);
//! 2. [`finish_model_input`](FlatConverter::finish_model_input), which
//!    converts every constraint the target cannot take and pushes the result;
//! 3. any number of presolve/postsolve calls mapping values between the
//!    input model and the target's model.

use crate::constraint::{AlgebraicBody, ConeConstraint, ConeKind, Constraint, ConstraintKind, Context, FuncExpr};
use crate::context::{ConversionContext, ConverterState};
use crate::expr::{LinTerms, QuadAndLinTerms, QuadraticExpr};
use crate::keeper::ConstraintRef;
use crate::link::LinkContext;
use crate::model::FlatModel;
use crate::objective::{ObjSense, QuadraticObjective};
use crate::registry::{ConstraintConverter, ConverterRegistry};
use crate::solver::{ModelValues, SolverCapabilities, SolverValues};
use crate::stats::ConversionReport;
use crate::var::{VarId, VarType};
use mpflat_core::{AcceptanceLevel, ConverterConfig, FlatError, Result};
use mpflat_presolve::{GraphExporter, IndexRange, NodeId, NodeRange, SlotValue, ValueKind, ValuePresolver};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Per-kind acceptance after option overrides, plus the warnings raised
/// while resolving them.
fn resolve_acceptance(
    solver: &impl SolverCapabilities,
    config: &ConverterConfig,
) -> Result<(Vec<AcceptanceLevel>, Vec<(String, String)>)> {
    let mut levels: Vec<AcceptanceLevel> = ConstraintKind::ALL
        .iter()
        .map(|&kind| {
            let native = solver.acceptance_level(kind);
            if (config.pass_quad_con == Some(false) && kind.is_quadratic())
                || (config.pass_socp_cones == Some(false) && kind.is_socp_cone())
            {
                AcceptanceLevel::NotAccepted
            } else {
                native
            }
        })
        .collect();
    let mut warnings = Vec::new();
    for (name, &level) in &config.acceptance_overrides {
        let kind = ConstraintKind::from_option_name(name)
            .ok_or_else(|| FlatError::invalid_option(format!("acc:{name}"), "unknown constraint kind"))?;
        let native = solver.acceptance_level(kind);
        if level > native {
            warnings.push((
                "AcceptanceOverride".to_string(),
                format!(
                    "acc:{name}={} exceeds what {} supports ({native}), using {}",
                    level.level(),
                    solver.name(),
                    native.level()
                ),
            ));
            levels[kind.index()] = native;
        } else {
            levels[kind.index()] = level;
        }
    }
    Ok((levels, warnings))
}

/// Converts a model into the constraint kinds a target solver accepts.
#[derive(Debug)]
pub struct FlatConverter<S: SolverCapabilities> {
    state: ConverterState,
    solver: S,
    registry: ConverterRegistry,
    src_vars: NodeId,
    src_objs: NodeId,
    flat_objs: NodeId,
    src_groups: BTreeMap<String, NodeId>,
    pushed: BTreeMap<ConstraintKind, Vec<usize>>,
    deferred: Vec<ConstraintRef>,
    finished: bool,
}

impl<S: SolverCapabilities> FlatConverter<S> {
    /// Create a converter for `solver` with the built-in converters.
    ///
    /// Fails on unknown `acc:` overrides or if the graph export file cannot
    /// be created.
    pub fn new(solver: S, config: ConverterConfig) -> Result<Self> {
        Self::with_registry(solver, config, ConverterRegistry::with_default_converters())
    }

    /// Create a converter with a custom registry.
    pub fn with_registry(solver: S, config: ConverterConfig, registry: ConverterRegistry) -> Result<Self> {
        let (levels, warnings) = resolve_acceptance(&solver, &config)?;
        let exporter = config.graph_export_file.as_ref().map(GraphExporter::create).transpose()?;
        let mut state = ConverterState::with_exporter(config, |k| levels[k.index()], exporter);
        for (key, msg) in warnings {
            warn!("{}: {}", key, msg);
            state.warnings.add(key, msg);
        }
        let src_vars = state.presolver.add_node("src_vars", ValueKind::Primal);
        let src_objs = state.presolver.add_node("src_objs", ValueKind::Primal);
        let flat_objs = state.presolver.add_node("objs", ValueKind::Primal);
        debug!("converter created for {}", solver.name());
        Ok(Self {
            state,
            solver,
            registry,
            src_vars,
            src_objs,
            flat_objs,
            src_groups: BTreeMap::new(),
            pushed: BTreeMap::new(),
            deferred: Vec::new(),
            finished: false,
        })
    }

    /// The flat model.
    pub fn model(&self) -> &FlatModel {
        &self.state.model
    }

    /// The converter state.
    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    /// The target solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Consume the converter and return the target.
    pub fn into_solver(self) -> S {
        self.solver
    }

    /// The configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.state.config
    }

    /// Mutable access to the converter registry.
    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    /// The value presolver.
    pub fn presolver(&self) -> &ValuePresolver {
        &self.state.presolver
    }

    fn ensure_input(&self) -> Result<()> {
        if self.finished {
            return Err(FlatError::invalid_operation("model input is already finished"));
        }
        Ok(())
    }

    /// Add an input variable.
    ///
    /// Input variables keep their index: the `i`-th call returns variable
    /// `i` as long as no auxiliary variables were created in between.
    pub fn add_var(&mut self, lb: f64, ub: f64, ty: VarType) -> Result<VarId> {
        self.ensure_input()?;
        let src = self.state.presolver.add_slots(self.src_vars, 1);
        let v = ConversionContext::new(&mut self.state, LinkContext::inactive()).push_var(lb, ub, ty);
        let dst = NodeRange::single(self.state.var_node, v.index());
        self.state.presolver.add_copy_link(src, dst);
        Ok(v)
    }

    /// Add input variables from bound and type arrays.
    pub fn add_vars(&mut self, lbs: &[f64], ubs: &[f64], types: &[VarType]) -> Result<Vec<VarId>> {
        if lbs.len() != ubs.len() || lbs.len() != types.len() {
            return Err(FlatError::invalid_operation(format!(
                "variable arrays differ in length: {} lbs, {} ubs, {} types",
                lbs.len(),
                ubs.len(),
                types.len()
            )));
        }
        lbs.iter()
            .zip(ubs)
            .zip(types)
            .map(|((&lb, &ub), &ty)| self.add_var(lb, ub, ty))
            .collect()
    }

    /// Add an input constraint. Its values are reported under its kind name.
    pub fn add_constraint(&mut self, con: impl Into<Constraint>) -> Result<ConstraintRef> {
        let mut con = con.into();
        self.context().normalize_sides(&mut con);
        let group = con.kind().name();
        self.with_source(group, |ctx| ctx.add_constraint_as_root(con))
    }

    /// Run `f` on a context whose additions all stem from one new input
    /// item of `group`.
    pub fn with_source<R>(
        &mut self,
        group: &str,
        f: impl FnOnce(&mut ConversionContext<'_>) -> Result<R>,
    ) -> Result<R> {
        self.ensure_input()?;
        let node = self.source_node(group);
        let slot = self.state.presolver.add_slots(node, 1);
        let mut ctx = ConversionContext::new(&mut self.state, LinkContext::with_source(slot));
        let out = f(&mut ctx);
        let mut link = ctx.into_link();
        link.commit(&mut self.state.presolver);
        out
    }

    fn source_node(&mut self, group: &str) -> NodeId {
        if let Some(&node) = self.src_groups.get(group) {
            return node;
        }
        let node = self.state.presolver.add_node(format!("src_{group}"), ValueKind::Dual);
        self.src_groups.insert(group.to_string(), node);
        node
    }

    /// Context for model building outside any input item.
    pub fn context(&mut self) -> ConversionContext<'_> {
        ConversionContext::new(&mut self.state, LinkContext::inactive())
    }

    /// Add an objective; its variables count as used.
    pub fn add_objective(&mut self, obj: impl Into<QuadraticObjective>) -> Result<usize> {
        self.ensure_input()?;
        let obj = obj.into();
        {
            let mut ctx = self.context();
            for v in obj.vars().collect::<Vec<_>>() {
                ctx.increment_usage(v);
            }
            for (c, v) in obj.lin.terms.iter() {
                let down = (c >= 0.0) == (obj.lin.sense == ObjSense::Minimize);
                let vctx = if down { Context::Negative } else { Context::Positive };
                ctx.propagate_result(v, f64::NEG_INFINITY, f64::INFINITY, vctx)?;
            }
            for v in obj.quad.vars() {
                ctx.propagate_result(v, f64::NEG_INFINITY, f64::INFINITY, Context::Mixed)?;
            }
        }
        let src = self.state.presolver.add_slots(self.src_objs, 1);
        let dst = self.state.presolver.add_slots(self.flat_objs, 1);
        self.state.presolver.add_copy_link(src, dst);
        let objectives = self.state.model.objectives_mut();
        objectives.push(obj);
        Ok(objectives.len() - 1)
    }

    /// Find or create the result variable of `expr`.
    pub fn assign_result_var(&mut self, expr: FuncExpr) -> Result<VarId> {
        self.ensure_input()?;
        self.context().assign_result_var(expr)
    }

    /// Assert a logical result variable.
    pub fn fix_as_true(&mut self, v: VarId) -> Result<()> {
        self.ensure_input()?;
        self.context().fix_as_true(v)
    }

    /// Convert everything the target cannot take and push the model.
    pub fn finish_model_input(&mut self) -> Result<ConversionReport> {
        self.ensure_input()?;
        self.finished = true;
        self.prepare()?;
        self.convert_all()?;
        self.windup()
    }

    fn prepare(&mut self) -> Result<()> {
        self.move_quadratic_objectives()?;
        let socp = self.state.config.pass_socp_cones.unwrap_or(true);
        if socp && self.state.model.keeper(ConstraintKind::QuadraticCone).acceptance().is_accepted() {
            self.recognize_cones()?;
        }
        Ok(())
    }

    /// Replace quadratic objective terms by an auxiliary variable when the
    /// target does not take them.
    fn move_quadratic_objectives(&mut self) -> Result<()> {
        let pass = self
            .state
            .config
            .pass_quad_obj
            .unwrap_or_else(|| self.solver.accepts_quadratic_objective());
        if pass {
            return Ok(());
        }
        for i in 0..self.state.model.objectives().len() {
            if self.state.model.objectives()[i].is_linear() {
                continue;
            }
            let quad = std::mem::take(&mut self.state.model.objectives_mut()[i].quad);
            let expr = QuadraticExpr::new(QuadAndLinTerms::new(LinTerms::new(), quad), 0.0);
            let r = {
                let mut ctx = self.context();
                let r = ctx.assign_result_var(FuncExpr::Quadratic(expr))?;
                ctx.increment_usage(r);
                r
            };
            self.state.model.objectives_mut()[i].lin.terms.add_term(1.0, r);
            debug!("quadratic part of objective {} moved to {}", i, r);
        }
        Ok(())
    }

    /// Rewrite `sum a_i x_i^2 - a_0 y^2 <= 0` and `sum a_i x_i^2 - a y z <= 0`
    /// with nonnegative heads into cone constraints.
    fn recognize_cones(&mut self) -> Result<()> {
        let rotated_ok = self.state.model.keeper(ConstraintKind::RotatedQuadraticCone).acceptance().is_accepted();
        let candidates: Vec<(usize, ConeConstraint)> = self
            .state
            .model
            .keeper(ConstraintKind::QuadLE)
            .iter_active()
            .filter_map(|(i, con)| match con {
                Constraint::Algebraic(c) if c.ub == 0.0 => match &c.body {
                    AlgebraicBody::Quadratic(q) if q.lin.is_empty() => {
                        as_cone(q, &self.state.model, rotated_ok).map(|cone| (i, cone))
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect();
        for (i, cone) in candidates {
            let r = ConstraintRef::new(ConstraintKind::QuadLE, i);
            let slot = self.state.constraint_slot(r);
            let mut ctx = ConversionContext::new(&mut self.state, LinkContext::with_source(slot));
            ctx.add_constraint(cone)?;
            ctx.mark_as_bridged(r);
            let mut link = ctx.into_link();
            link.commit(&mut self.state.presolver);
            self.state.stats.converted += 1;
            debug!("{} recognized as a cone", r);
        }
        Ok(())
    }

    /// Sweep all keepers until no constraint is left unvisited.
    ///
    /// Definitions whose result has no consumer are set aside; they are
    /// converted only if a consumer appears later, otherwise windup deletes
    /// them.
    fn convert_all(&mut self) -> Result<()> {
        loop {
            let mut progress = false;
            for &kind in ConstraintKind::ALL {
                while let Some(i) = self.state.model.keeper_mut(kind).next_unvisited() {
                    let r = ConstraintRef::new(kind, i);
                    if self.is_unused_definition(r) {
                        self.deferred.push(r);
                    } else {
                        self.process(r)?;
                    }
                    progress = true;
                }
            }
            for r in std::mem::take(&mut self.state.reconvert) {
                self.process(r)?;
                progress = true;
            }
            if progress {
                continue;
            }
            let (unused, revived): (Vec<_>, Vec<_>) =
                std::mem::take(&mut self.deferred).into_iter().partition(|&r| self.is_unused_definition(r));
            self.deferred = unused;
            if revived.is_empty() {
                return Ok(());
            }
            for r in revived {
                self.process(r)?;
            }
        }
    }

    fn is_unused_definition(&self, r: ConstraintRef) -> bool {
        self.state
            .model
            .keeper(r.kind)
            .active(r.index)
            .and_then(Constraint::result_var)
            .is_some_and(|v| self.state.usage(v) == 0 && self.state.init_expr(v) == Some(r))
    }

    fn process(&mut self, r: ConstraintRef) -> Result<()> {
        let keeper = self.state.model.keeper(r.kind);
        let Some(con) = keeper.active(r.index).cloned() else {
            return Ok(());
        };
        let level = keeper.acceptance();
        let converter = self.registry.get(r.kind);
        match (level, converter) {
            (AcceptanceLevel::NotAccepted, None) => Err(FlatError::unsupported(r.kind.name(), self.solver.name())),
            (AcceptanceLevel::NotAccepted, Some(c)) => run_converter(&mut self.state, c, &con, r),
            (AcceptanceLevel::AcceptedButNotRecommended, Some(c)) => {
                match run_converter(&mut self.state, c, &con, r) {
                    Err(e) if e.is_conversion_failure() => {
                        let key = e.failure_key().unwrap_or("ConversionFailure").to_string();
                        warn!("{} kept as is: {}", r, e);
                        self.state.warnings.add(key, e.to_string());
                        Ok(())
                    }
                    other => other,
                }
            }
            (AcceptanceLevel::Recommended, Some(c)) => {
                let needed = {
                    let ctx = ConversionContext::new(&mut self.state, LinkContext::inactive());
                    c.needs_conversion(&ctx, &con)
                };
                if needed {
                    run_converter(&mut self.state, c, &con, r)
                } else {
                    Ok(())
                }
            }
            (_, None) => Ok(()),
        }
    }

    fn windup(&mut self) -> Result<ConversionReport> {
        if self.state.config.relax_integrality {
            self.state.model.relax_integrality();
        }
        let fixed = self.context().fix_unused_defined_vars();
        if fixed > 0 {
            debug!("{} unused defined variables fixed to 0", fixed);
        }

        self.solver.add_variables(self.state.model.variables())?;
        for keeper in self.state.model.keepers() {
            for (i, con) in keeper.iter_active() {
                self.solver.add_constraint(con)?;
                self.pushed.entry(keeper.kind()).or_default().push(i);
                self.state.stats.kept += 1;
            }
        }
        for (i, obj) in self.state.model.objectives().iter().enumerate() {
            if obj.is_linear() {
                self.solver.set_linear_objective(i, &obj.lin)?;
            } else {
                self.solver.set_quadratic_objective(i, obj)?;
            }
        }
        self.solver.finish_problem_modification()?;
        let graph_records = self.state.presolver.finish_export()?;

        let stats = self.state.stats.clone();
        info!(
            "flat model for {}: {} vars, {} constraints ({})",
            self.solver.name(),
            self.state.model.num_vars(),
            stats.kept,
            stats
        );
        for w in self.state.warnings.iter() {
            warn!("{}", w);
        }
        Ok(ConversionReport {
            stats,
            warnings: self.state.warnings.clone(),
            graph_records,
        })
    }

    fn ensure_finished(&self) -> Result<()> {
        if !self.finished {
            return Err(FlatError::invalid_operation("values can only be mapped after finish_model_input"));
        }
        Ok(())
    }

    /// Map a solver solution back to the input model.
    pub fn postsolve_solution(&mut self, sol: &SolverValues<f64>) -> Result<ModelValues<f64>> {
        self.postsolve(sol, ValuePresolver::postsolve_solution)
    }

    /// Map solver basis statuses back to the input model.
    pub fn postsolve_basis(&mut self, basis: &SolverValues<i32>) -> Result<ModelValues<i32>> {
        self.postsolve(basis, ValuePresolver::postsolve_basis)
    }

    /// Map an input-model warm start into the solver's model.
    pub fn presolve_solution(&mut self, values: &ModelValues<f64>) -> Result<SolverValues<f64>> {
        self.presolve(values, ValuePresolver::presolve_solution)
    }

    /// Map input-model basis statuses into the solver's model.
    pub fn presolve_basis(&mut self, values: &ModelValues<i32>) -> Result<SolverValues<i32>> {
        self.presolve(values, ValuePresolver::presolve_basis)
    }

    fn postsolve<T: SlotValue>(
        &mut self,
        vals: &SolverValues<T>,
        pass: fn(&mut ValuePresolver, IndexRange),
    ) -> Result<ModelValues<T>> {
        self.ensure_finished()?;
        let p = &mut self.state.presolver;
        p.clear_values();
        load(p, self.state.var_node, &vals.primal, "variable")?;
        load(p, self.flat_objs, &vals.objs, "objective")?;
        for (&kind, rows) in &vals.duals {
            let pushed = self.pushed.get(&kind).map(Vec::as_slice).unwrap_or_default();
            if rows.len() != pushed.len() {
                return Err(FlatError::invalid_operation(format!(
                    "{} values for {} {} rows",
                    rows.len(),
                    pushed.len(),
                    kind
                )));
            }
            let node = self.state.model.keeper(kind).value_node();
            let mut full: Vec<T> = vec![T::default(); p.node(node).len()];
            for (&i, &v) in pushed.iter().zip(rows) {
                full[i] = v;
            }
            p.set_values(node, &full);
        }
        let range = p.full_range();
        pass(p, range);
        Ok(ModelValues {
            vars: p.values(self.src_vars),
            cons: self.src_groups.iter().map(|(g, &node)| (g.clone(), p.values(node))).collect(),
            objs: p.values(self.src_objs),
        })
    }

    fn presolve<T: SlotValue>(
        &mut self,
        vals: &ModelValues<T>,
        pass: fn(&mut ValuePresolver, IndexRange),
    ) -> Result<SolverValues<T>> {
        self.ensure_finished()?;
        let p = &mut self.state.presolver;
        p.clear_values();
        load(p, self.src_vars, &vals.vars, "variable")?;
        load(p, self.src_objs, &vals.objs, "objective")?;
        for (group, values) in &vals.cons {
            let node = self
                .src_groups
                .get(group)
                .copied()
                .ok_or_else(|| FlatError::invalid_operation(format!("unknown constraint group '{group}'")))?;
            load(p, node, values, group)?;
        }
        let range = p.full_range();
        pass(p, range);
        let mut duals = BTreeMap::new();
        for (&kind, pushed) in &self.pushed {
            let all: Vec<T> = p.values(self.state.model.keeper(kind).value_node());
            duals.insert(kind, pushed.iter().map(|&i| all[i]).collect());
        }
        Ok(SolverValues {
            primal: p.values(self.state.var_node),
            duals,
            objs: p.values(self.flat_objs),
        })
    }
}

/// Store `values` in the leading slots of `node`.
fn load<T: SlotValue>(p: &mut ValuePresolver, node: NodeId, values: &[T], what: &str) -> Result<()> {
    let size = p.node(node).len();
    if values.len() > size {
        return Err(FlatError::invalid_operation(format!(
            "{} {what} values for {size} slots",
            values.len()
        )));
    }
    p.set_values(node, values);
    Ok(())
}

/// Apply `converter` to the active constraint `r` and bridge it.
fn run_converter(
    state: &mut ConverterState,
    converter: &dyn ConstraintConverter,
    con: &Constraint,
    r: ConstraintRef,
) -> Result<()> {
    let slot = state.constraint_slot(r);
    let mut ctx = ConversionContext::new(state, LinkContext::with_source(slot));
    converter.convert(&mut ctx, con, r.index)?;
    ctx.mark_as_bridged(r);
    let mut link = ctx.into_link();
    link.commit(&mut state.presolver);
    state.stats.converted += 1;
    debug!("{} converted by {}", r, converter.name());
    Ok(())
}

/// Cone form of a quadratic body with no linear part, if it has one.
fn as_cone(q: &QuadAndLinTerms, model: &FlatModel, rotated_ok: bool) -> Option<ConeConstraint> {
    use crate::bounds::VarBounds;
    let mut head: Option<(VarId, VarId, f64)> = None;
    let mut tail: Vec<(VarId, f64)> = Vec::new();
    for (c, x, y) in q.quad.iter() {
        if c < 0.0 {
            if head.is_some() {
                return None;
            }
            head = Some((x, y, -c));
        } else if c > 0.0 && x == y {
            tail.push((x, c.sqrt()));
        } else if c != 0.0 {
            return None;
        }
    }
    let (x, y, c) = head?;
    if tail.is_empty() || model.lb(x) < 0.0 || model.lb(y) < 0.0 {
        return None;
    }
    let (kind, mut args, mut coefs) = if x == y {
        (ConeKind::Quadratic, vec![x], vec![c.sqrt()])
    } else if rotated_ok {
        (ConeKind::RotatedQuadratic, vec![x, y], vec![c / 2.0, 1.0])
    } else {
        return None;
    };
    for (v, s) in tail {
        args.push(v);
        coefs.push(s);
    }
    Some(ConeConstraint::new(kind, args, coefs))
}
