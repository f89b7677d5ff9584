//! Objectives.

use crate::expr::{LinTerms, QuadTerms};
use crate::var::VarId;
use serde::{Deserialize, Serialize};

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjSense {
    /// Minimize the objective
    #[default]
    Minimize,
    /// Maximize the objective
    Maximize,
}

/// Linear objective `a'x`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearObjective {
    /// Direction
    pub sense: ObjSense,
    /// Terms
    pub terms: LinTerms,
    /// Name, possibly empty
    pub name: String,
}

impl LinearObjective {
    /// Create an objective.
    #[must_use]
    pub fn new(sense: ObjSense, terms: LinTerms, name: impl Into<String>) -> Self {
        Self {
            sense,
            terms,
            name: name.into(),
        }
    }
}

/// Objective with optional quadratic terms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuadraticObjective {
    /// Linear part, sense and name
    pub lin: LinearObjective,
    /// Quadratic part, sorted
    pub quad: QuadTerms,
}

impl QuadraticObjective {
    /// Create an objective; quadratic terms are brought to canonical order.
    #[must_use]
    pub fn new(lin: LinearObjective, mut quad: QuadTerms) -> Self {
        quad.sort_terms();
        Self { lin, quad }
    }

    /// Whether there are no quadratic terms.
    pub fn is_linear(&self) -> bool {
        self.quad.is_empty()
    }

    /// Every variable appearing, with repetitions.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.lin.terms.vars().iter().copied().chain(self.quad.vars())
    }
}

impl From<LinearObjective> for QuadraticObjective {
    fn from(lin: LinearObjective) -> Self {
        Self {
            lin,
            quad: QuadTerms::new(),
        }
    }
}
