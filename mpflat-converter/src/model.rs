//! The flat model: variables, one keeper per constraint kind, objectives.

use crate::bounds::VarBounds;
use crate::constraint::{Constraint, ConstraintKind};
use crate::keeper::{ConstraintKeeper, ConstraintRef};
use crate::objective::QuadraticObjective;
use crate::var::{VarId, VarType, VariableArrays};
use mpflat_core::AcceptanceLevel;
use mpflat_presolve::{ValueKind, ValuePresolver};

/// Variables, constraints and objectives after flattening.
#[derive(Debug)]
pub struct FlatModel {
    lbs: Vec<f64>,
    ubs: Vec<f64>,
    types: Vec<VarType>,
    keepers: Vec<ConstraintKeeper>,
    objectives: Vec<QuadraticObjective>,
}

impl FlatModel {
    /// Create an empty model with one keeper per kind.
    ///
    /// Each keeper gets a dual value node in `presolver` named after its kind.
    pub fn new(presolver: &mut ValuePresolver, acceptance: impl Fn(ConstraintKind) -> AcceptanceLevel) -> Self {
        let keepers = ConstraintKind::ALL
            .iter()
            .map(|&kind| {
                let node = presolver.add_node(kind.name(), ValueKind::Dual);
                ConstraintKeeper::new(kind, node, acceptance(kind))
            })
            .collect();
        Self {
            lbs: Vec::new(),
            ubs: Vec::new(),
            types: Vec::new(),
            keepers,
            objectives: Vec::new(),
        }
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.lbs.len()
    }

    /// Append a variable.
    pub fn push_var(&mut self, lb: f64, ub: f64, ty: VarType) -> VarId {
        let id = VarId::new(self.lbs.len());
        self.lbs.push(lb);
        self.ubs.push(ub);
        self.types.push(ty);
        id
    }

    /// Set the lower bound of `v`.
    pub fn set_lb(&mut self, v: VarId, lb: f64) {
        self.lbs[v.index()] = lb;
    }

    /// Set the upper bound of `v`.
    pub fn set_ub(&mut self, v: VarId, ub: f64) {
        self.ubs[v.index()] = ub;
    }

    /// Type of `v`.
    pub fn var_type(&self, v: VarId) -> VarType {
        self.types[v.index()]
    }

    /// Make every variable continuous.
    pub fn relax_integrality(&mut self) {
        self.types.fill(VarType::Continuous);
    }

    /// Borrowed variable arrays.
    pub fn variables(&self) -> VariableArrays<'_> {
        VariableArrays {
            lbs: &self.lbs,
            ubs: &self.ubs,
            types: &self.types,
        }
    }

    /// Keeper of `kind`.
    pub fn keeper(&self, kind: ConstraintKind) -> &ConstraintKeeper {
        &self.keepers[kind.index()]
    }

    /// Mutable keeper of `kind`.
    pub fn keeper_mut(&mut self, kind: ConstraintKind) -> &mut ConstraintKeeper {
        &mut self.keepers[kind.index()]
    }

    /// All keepers in kind order.
    pub fn keepers(&self) -> impl Iterator<Item = &ConstraintKeeper> {
        self.keepers.iter()
    }

    /// Append a constraint to its keeper.
    pub fn push_constraint(&mut self, con: Constraint) -> ConstraintRef {
        let kind = con.kind();
        let index = self.keeper_mut(kind).add(con);
        ConstraintRef::new(kind, index)
    }

    /// Constraint unless deleted.
    pub fn constraint(&self, r: ConstraintRef) -> Option<&Constraint> {
        self.keeper(r.kind).constraint(r.index)
    }

    /// Number of active constraints over all kinds.
    pub fn num_active_constraints(&self) -> usize {
        self.keepers.iter().map(ConstraintKeeper::num_active).sum()
    }

    /// Objectives.
    pub fn objectives(&self) -> &[QuadraticObjective] {
        &self.objectives
    }

    /// Mutable objectives.
    pub fn objectives_mut(&mut self) -> &mut Vec<QuadraticObjective> {
        &mut self.objectives
    }
}

impl VarBounds for FlatModel {
    fn lb(&self, v: VarId) -> f64 {
        self.lbs[v.index()]
    }

    fn ub(&self, v: VarId) -> f64 {
        self.ubs[v.index()]
    }

    fn is_integer(&self, v: VarId) -> bool {
        self.types[v.index()] == VarType::Integer
    }
}
