//! Value nodes and index ranges.
//!
//! A value node is a named array of slots holding one semantic group of
//! values, e.g. all variable values of the source model or all duals of the
//! linear `<=` rows of the target model. Bridges refer to slices of a node by
//! [`NodeRange`].

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Half-open range of slot indices `[beg, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct IndexRange {
    /// First index
    pub beg: usize,
    /// One past the last index
    pub end: usize,
}

impl IndexRange {
    /// Create a range. Panics if `beg > end`.
    #[must_use]
    pub fn new(beg: usize, end: usize) -> Self {
        assert!(beg <= end, "invalid index range [{beg}, {end})");
        Self { beg, end }
    }

    /// Range holding exactly `index`.
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self {
            beg: index,
            end: index + 1,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.end - self.beg
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.beg == self.end
    }

    /// Whether the range holds exactly one index.
    pub fn is_single_index(&self) -> bool {
        self.end == self.beg + 1
    }

    /// Append `other` if it starts where `self` ends.
    pub fn try_extend(&mut self, other: IndexRange) -> bool {
        if self.end == other.beg {
            self.end = other.end;
            true
        } else {
            false
        }
    }

    /// Iterate over the indices.
    pub fn iter(&self) -> Range<usize> {
        self.beg..self.end
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.beg, self.end)
    }
}

/// Identifier of a value node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in its arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A slice of one value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRange {
    /// Node holding the slots
    pub node: NodeId,
    /// Slot indices
    pub range: IndexRange,
}

impl NodeRange {
    /// Range over a single slot.
    #[must_use]
    pub fn single(node: NodeId, index: usize) -> Self {
        Self {
            node,
            range: IndexRange::single(index),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Whether the range covers exactly one slot.
    pub fn is_single_index(&self) -> bool {
        self.range.is_single_index()
    }

    /// Append `other` if it is on the same node and contiguous.
    pub fn try_extend_by(&mut self, other: NodeRange) -> bool {
        self.node == other.node && self.range.try_extend(other.range)
    }
}

/// What the slots of a node represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueKind {
    /// Variable values and variable basis statuses
    Primal,
    /// Constraint duals and constraint basis statuses
    Dual,
}

/// Named slot array.
#[derive(Debug, Clone)]
pub struct ValueNode {
    name: String,
    kind: ValueKind,
    size: usize,
    solution: Vec<f64>,
    basis: Vec<i32>,
}

impl ValueNode {
    pub(crate) fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: 0,
            solution: Vec::new(),
            basis: Vec::new(),
        }
    }

    /// Name of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value kind of every slot.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the node has no slots.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Append `n` slots and return their range.
    pub fn add_slots(&mut self, n: usize) -> IndexRange {
        let range = IndexRange::new(self.size, self.size + n);
        self.size += n;
        range
    }

    /// Value at `index`; slots never written read as the default.
    pub fn value<T: SlotValue>(&self, index: usize) -> T {
        assert!(index < self.size, "slot {index} out of range in node {}", self.name);
        T::slots(self).get(index).copied().unwrap_or_default()
    }

    /// Set the value at `index`.
    pub fn set_value<T: SlotValue>(&mut self, index: usize, value: T) {
        assert!(index < self.size, "slot {index} out of range in node {}", self.name);
        let size = self.size;
        let slots = T::slots_mut(self);
        if slots.len() < size {
            slots.resize(size, T::default());
        }
        slots[index] = value;
    }

    /// All values, padded with defaults up to the node size.
    pub fn values<T: SlotValue>(&self) -> Vec<T> {
        let mut out = T::slots(self).to_vec();
        out.resize(self.size, T::default());
        out
    }

    /// Overwrite the leading slots with `values`.
    pub fn set_values<T: SlotValue>(&mut self, values: &[T]) {
        assert!(
            values.len() <= self.size,
            "{} values for node {} of size {}",
            values.len(),
            self.name,
            self.size
        );
        let size = self.size;
        let slots = T::slots_mut(self);
        slots.resize(size, T::default());
        slots[..values.len()].copy_from_slice(values);
    }

    /// Forget stored solution and basis values.
    pub fn clear_values(&mut self) {
        self.solution.clear();
        self.basis.clear();
    }
}

/// A value type that can be stored in node slots.
///
/// Solutions use `f64` and bases use `i32` status codes. The type also fixes
/// how several target values fold into one source value.
pub trait SlotValue: Copy + Default + PartialEq + fmt::Debug + 'static {
    /// Stored slots of a node.
    fn slots(node: &ValueNode) -> &[Self];

    /// Mutable slot storage of a node.
    fn slots_mut(node: &mut ValueNode) -> &mut Vec<Self>;

    /// Fold `next` into `acc` for values of the given kind.
    fn combine(kind: ValueKind, acc: Self, next: Self) -> Self;
}

impl SlotValue for f64 {
    fn slots(node: &ValueNode) -> &[f64] {
        &node.solution
    }

    fn slots_mut(node: &mut ValueNode) -> &mut Vec<f64> {
        &mut node.solution
    }

    fn combine(kind: ValueKind, acc: f64, next: f64) -> f64 {
        match kind {
            ValueKind::Dual => acc + next,
            ValueKind::Primal => acc,
        }
    }
}

impl SlotValue for i32 {
    fn slots(node: &ValueNode) -> &[i32] {
        &node.basis
    }

    fn slots_mut(node: &mut ValueNode) -> &mut Vec<i32> {
        &mut node.basis
    }

    fn combine(_kind: ValueKind, acc: i32, _next: i32) -> i32 {
        acc
    }
}

/// Owner of all value nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<ValueNode>,
}

impl NodeArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty node.
    pub fn add(&mut self, name: impl Into<String>, kind: ValueKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ValueNode::new(name, kind));
        id
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> &ValueNode {
        &self.nodes[id.index()]
    }

    /// Mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> &mut ValueNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ValueNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Copy the values of `src` into `dst`. Both ranges must have equal length.
    pub fn copy<T: SlotValue>(&mut self, src: NodeRange, dst: NodeRange) {
        assert_eq!(
            src.len(),
            dst.len(),
            "copy between ranges of different length"
        );
        let values: smallvec::SmallVec<[T; 8]> = {
            let node = self.get(src.node);
            src.range.iter().map(|i| node.value::<T>(i)).collect()
        };
        let node = self.get_mut(dst.node);
        for (i, v) in dst.range.iter().zip(values) {
            node.set_value(i, v);
        }
    }

    /// Reset every stored value.
    pub fn clear_values(&mut self) {
        for node in &mut self.nodes {
            node.clear_values();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_range_extend() {
        let mut r = IndexRange::new(2, 4);
        assert!(r.try_extend(IndexRange::new(4, 7)));
        assert_eq!(r, IndexRange::new(2, 7));
        assert!(!r.try_extend(IndexRange::single(9)));
        assert_eq!(r.len(), 5);
        assert!(IndexRange::single(3).is_single_index());
    }

    #[test]
    fn test_node_range_extend_requires_same_node() {
        let mut arena = NodeArena::new();
        let a = arena.add("a", ValueKind::Primal);
        let b = arena.add("b", ValueKind::Primal);
        let mut r = NodeRange::single(a, 0);
        assert!(!r.try_extend_by(NodeRange::single(b, 1)));
        assert!(r.try_extend_by(NodeRange::single(a, 1)));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_slots_default_and_set() {
        let mut arena = NodeArena::new();
        let id = arena.add("vars", ValueKind::Primal);
        let node = arena.get_mut(id);
        let r = node.add_slots(3);
        assert_eq!(r, IndexRange::new(0, 3));
        assert_eq!(node.value::<f64>(2), 0.0);
        node.set_value(1, 2.5);
        assert_eq!(node.values::<f64>(), vec![0.0, 2.5, 0.0]);
        node.set_value(0, 7i32);
        assert_eq!(node.values::<i32>(), vec![7, 0, 0]);
    }

    #[test]
    fn test_copy_within_same_node() {
        let mut arena = NodeArena::new();
        let id = arena.add("vars", ValueKind::Primal);
        arena.get_mut(id).add_slots(4);
        arena.get_mut(id).set_values(&[1.0, 2.0]);
        let src = NodeRange {
            node: id,
            range: IndexRange::new(0, 2),
        };
        let dst = NodeRange {
            node: id,
            range: IndexRange::new(2, 4),
        };
        arena.copy::<f64>(src, dst);
        assert_eq!(arena.get(id).values::<f64>(), vec![1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_combine_rules() {
        assert_eq!(f64::combine(ValueKind::Dual, 1.0, 2.0), 3.0);
        assert_eq!(f64::combine(ValueKind::Primal, 1.0, 2.0), 1.0);
        assert_eq!(i32::combine(ValueKind::Dual, 1, 2), 1);
    }

    #[test]
    #[should_panic(expected = "different length")]
    fn test_copy_length_mismatch_panics() {
        let mut arena = NodeArena::new();
        let id = arena.add("x", ValueKind::Primal);
        arena.get_mut(id).add_slots(3);
        arena.copy::<f64>(
            NodeRange::single(id, 0),
            NodeRange {
                node: id,
                range: IndexRange::new(1, 3),
            },
        );
    }
}
