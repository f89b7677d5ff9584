//! Variable identifiers and types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense index of a variable in the flat model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub(crate) u32);

impl VarId {
    /// Wrap a dense index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "variable index overflow");
        VarId(index as u32)
    }

    /// Position of the variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Variable domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarType {
    /// Real-valued
    #[default]
    Continuous,
    /// Integer-valued
    Integer,
}

/// Borrowed view of the variable arrays pushed to a solver.
#[derive(Debug, Clone, Copy)]
pub struct VariableArrays<'a> {
    /// Lower bounds
    pub lbs: &'a [f64],
    /// Upper bounds
    pub ubs: &'a [f64],
    /// Types
    pub types: &'a [VarType],
}

impl VariableArrays<'_> {
    /// Number of variables.
    pub fn len(&self) -> usize {
        self.lbs.len()
    }

    /// Whether there are no variables.
    pub fn is_empty(&self) -> bool {
        self.lbs.is_empty()
    }
}
