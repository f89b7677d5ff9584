//! Target solver interface and solution containers.
//!
//! The converter only needs to know which constraint kinds a target takes
//! and how to push the final model into it. [`CollectingSolver`] is an
//! in-memory target used by tests and benchmarks.

use crate::constraint::{Constraint, ConstraintKind};
use crate::objective::{LinearObjective, QuadraticObjective};
use crate::var::{VarType, VariableArrays};
use mpflat_core::{AcceptanceLevel, FlatError, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Capabilities and push API of a target solver.
pub trait SolverCapabilities {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// How well the target handles `kind`.
    fn acceptance_level(&self, kind: ConstraintKind) -> AcceptanceLevel;

    /// Whether quadratic objectives can be passed.
    fn accepts_quadratic_objective(&self) -> bool {
        false
    }

    /// Receive all variables at once.
    fn add_variables(&mut self, vars: VariableArrays<'_>) -> Result<()>;

    /// Receive one constraint of an accepted kind.
    fn add_constraint(&mut self, con: &Constraint) -> Result<()>;

    /// Receive objective `index`.
    fn set_linear_objective(&mut self, index: usize, obj: &LinearObjective) -> Result<()>;

    /// Receive objective `index` with quadratic terms.
    fn set_quadratic_objective(&mut self, index: usize, obj: &QuadraticObjective) -> Result<()> {
        let _ = (index, obj);
        Err(FlatError::unsupported("QuadraticObjective", self.name()))
    }

    /// Called once after the whole model was pushed.
    fn finish_problem_modification(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Target that accepts a configurable set of kinds and records what it receives.
#[derive(Debug, Clone, Default)]
pub struct CollectingSolver {
    name: String,
    acceptance: FxHashMap<ConstraintKind, AcceptanceLevel>,
    quadratic_objective: bool,
    /// Variable lower bounds received
    pub lbs: Vec<f64>,
    /// Variable upper bounds received
    pub ubs: Vec<f64>,
    /// Variable types received
    pub types: Vec<VarType>,
    /// Constraints received, in push order
    pub constraints: Vec<Constraint>,
    /// Objectives received
    pub objectives: Vec<QuadraticObjective>,
    /// Whether the push was finished
    pub finished: bool,
}

impl CollectingSolver {
    /// A target accepting nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An LP target: linear rows and ranges.
    #[must_use]
    pub fn linear() -> Self {
        use ConstraintKind::*;
        let mut s = Self::new("linear");
        for k in [LinRange, LinLE, LinEQ, LinGE] {
            s = s.accept(k, AcceptanceLevel::Recommended);
        }
        s
    }

    /// A MIP target: linear rows, SOS and linear indicators.
    #[must_use]
    pub fn mip() -> Self {
        use ConstraintKind::*;
        let mut s = Self::linear();
        s.name = "mip".to_string();
        for k in [Sos1, Sos2, IndicatorLinLE, IndicatorLinEQ, IndicatorLinGE] {
            s = s.accept(k, AcceptanceLevel::Recommended);
        }
        s
    }

    /// Set the acceptance level of `kind`.
    #[must_use]
    pub fn accept(mut self, kind: ConstraintKind, level: AcceptanceLevel) -> Self {
        self.acceptance.insert(kind, level);
        self
    }

    /// Accept quadratic objectives.
    #[must_use]
    pub fn with_quadratic_objective(mut self) -> Self {
        self.quadratic_objective = true;
        self
    }

    /// Number of received constraints of `kind`.
    pub fn count(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.kind() == kind).count()
    }
}

impl SolverCapabilities for CollectingSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn acceptance_level(&self, kind: ConstraintKind) -> AcceptanceLevel {
        self.acceptance.get(&kind).copied().unwrap_or_default()
    }

    fn accepts_quadratic_objective(&self) -> bool {
        self.quadratic_objective
    }

    fn add_variables(&mut self, vars: VariableArrays<'_>) -> Result<()> {
        self.lbs = vars.lbs.to_vec();
        self.ubs = vars.ubs.to_vec();
        self.types = vars.types.to_vec();
        Ok(())
    }

    fn add_constraint(&mut self, con: &Constraint) -> Result<()> {
        let kind = con.kind();
        if !self.acceptance_level(kind).is_accepted() {
            return Err(FlatError::unsupported(kind.name(), self.name.clone()));
        }
        self.constraints.push(con.clone());
        Ok(())
    }

    fn set_linear_objective(&mut self, index: usize, obj: &LinearObjective) -> Result<()> {
        self.set_objective(index, obj.clone().into());
        Ok(())
    }

    fn set_quadratic_objective(&mut self, index: usize, obj: &QuadraticObjective) -> Result<()> {
        if !self.quadratic_objective {
            return Err(FlatError::unsupported("QuadraticObjective", self.name.clone()));
        }
        self.set_objective(index, obj.clone());
        Ok(())
    }

    fn finish_problem_modification(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

impl CollectingSolver {
    fn set_objective(&mut self, index: usize, obj: QuadraticObjective) {
        if self.objectives.len() <= index {
            self.objectives.resize(index + 1, QuadraticObjective::default());
        }
        self.objectives[index] = obj;
    }
}

/// Values in the solver's view: variables, rows per kind, objectives.
///
/// Row values of a kind follow the order in which the constraints were
/// pushed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverValues<T> {
    /// One value per flat variable
    pub primal: Vec<T>,
    /// Row values per constraint kind
    pub duals: BTreeMap<ConstraintKind, Vec<T>>,
    /// One value per objective
    pub objs: Vec<T>,
}

/// Primal and dual solution in the solver's view.
pub type SolverSolution = SolverValues<f64>;

/// Basis statuses in the solver's view.
pub type SolverBasis = SolverValues<i32>;

/// Values in the original model's view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelValues<T> {
    /// One value per input variable
    pub vars: Vec<T>,
    /// Constraint values per input group, e.g. `LinConLE`
    pub cons: BTreeMap<String, Vec<T>>,
    /// One value per objective
    pub objs: Vec<T>,
}
