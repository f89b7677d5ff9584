//! Constraint keepers: append-only per-kind storage with tombstones.
//!
//! Indices are stable for the lifetime of the converter. Value-node slot `i`
//! of a keeper belongs to constraint `i`, so bridges can address constraints
//! by index.

use crate::constraint::{Constraint, ConstraintKind, FuncExpr, FunctionalConstraint};
use mpflat_core::{AcceptanceLevel, FlatError, Result};
use mpflat_presolve::NodeId;
use rustc_hash::FxHashMap;
use std::fmt;

/// Lifecycle state of a stored constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintStatus {
    /// Stored and not yet replaced
    Active,
    /// Replaced by other constraints; still defines its result variable
    Bridged,
    /// Logically removed
    Deleted,
}

/// Reference to a stored constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintRef {
    /// Keeper
    pub kind: ConstraintKind,
    /// Index inside the keeper
    pub index: usize,
}

impl ConstraintRef {
    /// Create a reference.
    #[must_use]
    pub fn new(kind: ConstraintKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.index)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    con: Constraint,
    status: ConstraintStatus,
}

/// Storage for the constraints of one kind.
#[derive(Debug)]
pub struct ConstraintKeeper {
    kind: ConstraintKind,
    entries: Vec<Entry>,
    map: FxHashMap<FuncExpr, usize>,
    value_node: NodeId,
    acceptance: AcceptanceLevel,
    converted_upto: usize,
}

impl ConstraintKeeper {
    /// Create an empty keeper whose values live in `value_node`.
    #[must_use]
    pub fn new(kind: ConstraintKind, value_node: NodeId, acceptance: AcceptanceLevel) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            map: FxHashMap::default(),
            value_node,
            acceptance,
            converted_upto: 0,
        }
    }

    /// Kind stored.
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Number of stored constraints, deleted ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was ever stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value node of the keeper.
    pub fn value_node(&self) -> NodeId {
        self.value_node
    }

    /// Acceptance of the kind by the target.
    pub fn acceptance(&self) -> AcceptanceLevel {
        self.acceptance
    }

    /// Change the acceptance level.
    pub fn set_acceptance(&mut self, level: AcceptanceLevel) {
        self.acceptance = level;
    }

    /// Append a constraint and return its index.
    pub fn add(&mut self, con: Constraint) -> usize {
        debug_assert_eq!(con.kind(), self.kind, "constraint stored in a foreign keeper");
        self.entries.push(Entry {
            con,
            status: ConstraintStatus::Active,
        });
        self.entries.len() - 1
    }

    /// Constraint `i` unless it was deleted.
    pub fn constraint(&self, i: usize) -> Option<&Constraint> {
        let e = &self.entries[i];
        (e.status != ConstraintStatus::Deleted).then_some(&e.con)
    }

    /// Constraint `i` if it is still active.
    pub fn active(&self, i: usize) -> Option<&Constraint> {
        let e = &self.entries[i];
        (e.status == ConstraintStatus::Active).then_some(&e.con)
    }

    /// Mutable functional constraint `i` unless deleted.
    pub fn functional_mut(&mut self, i: usize) -> Option<&mut FunctionalConstraint> {
        let e = &mut self.entries[i];
        match (&mut e.con, e.status) {
            (_, ConstraintStatus::Deleted) => None,
            (Constraint::Functional(fc), _) => Some(fc),
            _ => None,
        }
    }

    /// Status of constraint `i`.
    pub fn status(&self, i: usize) -> ConstraintStatus {
        self.entries[i].status
    }

    /// Set the status of constraint `i`.
    ///
    /// Deleting a functional constraint drops its map entry.
    pub fn set_status(&mut self, i: usize, status: ConstraintStatus) {
        let e = &mut self.entries[i];
        if status == ConstraintStatus::Deleted {
            if let Constraint::Functional(fc) = &e.con {
                if self.map.get(&fc.expr) == Some(&i) {
                    self.map.remove(&fc.expr);
                }
            }
        }
        e.status = status;
    }

    /// Index of an equal functional expression.
    pub fn map_find(&self, expr: &FuncExpr) -> Option<usize> {
        self.map.get(expr).copied()
    }

    /// Register `expr` as defined by constraint `i`.
    ///
    /// Inserting a key twice is an internal error: callers look up first.
    pub fn map_insert(&mut self, expr: FuncExpr, i: usize) -> Result<()> {
        if self.map.contains_key(&expr) {
            return Err(FlatError::DuplicateMapEntry(format!(
                "{}: expression already defined by another constraint",
                self.kind
            )));
        }
        self.map.insert(expr, i);
        Ok(())
    }

    /// Number of map entries.
    pub fn map_len(&self) -> usize {
        self.map.len()
    }

    /// Iterate over `(index, constraint)` of active constraints.
    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &Constraint)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == ConstraintStatus::Active)
            .map(|(i, e)| (i, &e.con))
    }

    /// Number of active constraints.
    pub fn num_active(&self) -> usize {
        self.entries.iter().filter(|e| e.status == ConstraintStatus::Active).count()
    }

    /// Index of the first constraint not yet visited by the conversion loop.
    pub fn converted_upto(&self) -> usize {
        self.converted_upto
    }

    /// Take the next unvisited index.
    pub fn next_unvisited(&mut self) -> Option<usize> {
        (self.converted_upto < self.entries.len()).then(|| {
            self.converted_upto += 1;
            self.converted_upto - 1
        })
    }
}
