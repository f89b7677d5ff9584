//! Bridges: arrays of value converters between node ranges.
//!
//! Every bridge entry pairs a source range (original model side) with a
//! target range (transformed model side). Presolve moves values from source
//! to target; postsolve moves them back and walks entries last-in-first-out.

use crate::node::{IndexRange, NodeArena, NodeRange, SlotValue};
use serde::Serialize;
use std::fmt;

/// Identifier of a bridge registered with a presolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BridgeId(pub(crate) u32);

impl BridgeId {
    /// Position of the bridge in its presolver.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Contiguous entries of one bridge, as recorded in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeRange {
    /// Bridge the entries belong to
    pub bridge: BridgeId,
    /// Entry indices
    pub range: IndexRange,
}

impl BridgeRange {
    /// Append `other` if it is the continuation of this range on the same bridge.
    pub fn try_extend(&mut self, other: BridgeRange) -> bool {
        self.bridge == other.bridge && self.range.try_extend(other.range)
    }
}

/// A bridge entry: source and target slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeEntry {
    /// Original-model side
    pub src: NodeRange,
    /// Transformed-model side
    pub dst: NodeRange,
}

/// Interface of a bridge.
///
/// Solution operations move `f64` values, basis operations move `i32`
/// statuses. Postsolve implementations must process `range` backwards.
pub trait Bridge: fmt::Debug {
    /// Short name used in graph export.
    fn name(&self) -> &'static str;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the bridge has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an entry and return its index.
    fn add_entry(&mut self, entry: BridgeEntry) -> usize;

    /// Entry at `index`.
    fn entry(&self, index: usize) -> BridgeEntry;

    /// Move solution values source to target.
    fn presolve_solution(&self, nodes: &mut NodeArena, range: IndexRange);

    /// Move solution values target to source.
    fn postsolve_solution(&self, nodes: &mut NodeArena, range: IndexRange);

    /// Move basis statuses source to target.
    fn presolve_basis(&self, nodes: &mut NodeArena, range: IndexRange);

    /// Move basis statuses target to source.
    fn postsolve_basis(&self, nodes: &mut NodeArena, range: IndexRange);
}

/// Each entry copies a range of values one to one.
#[derive(Debug, Clone, Default)]
pub struct CopyBridge {
    entries: Vec<BridgeEntry>,
}

impl CopyBridge {
    /// Create an empty bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn copy_src_dst<T: SlotValue>(&self, nodes: &mut NodeArena, range: IndexRange) {
        for i in range.iter() {
            let e = self.entries[i];
            nodes.copy::<T>(e.src, e.dst);
        }
    }

    fn copy_dst_src<T: SlotValue>(&self, nodes: &mut NodeArena, range: IndexRange) {
        for i in range.iter().rev() {
            let e = self.entries[i];
            nodes.copy::<T>(e.dst, e.src);
        }
    }
}

impl Bridge for CopyBridge {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn add_entry(&mut self, entry: BridgeEntry) -> usize {
        assert_eq!(
            entry.src.len(),
            entry.dst.len(),
            "copy link between ranges of different length"
        );
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn entry(&self, index: usize) -> BridgeEntry {
        self.entries[index]
    }

    fn presolve_solution(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.copy_src_dst::<f64>(nodes, range);
    }

    fn postsolve_solution(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.copy_dst_src::<f64>(nodes, range);
    }

    fn presolve_basis(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.copy_src_dst::<i32>(nodes, range);
    }

    fn postsolve_basis(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.copy_dst_src::<i32>(nodes, range);
    }
}

/// Each entry links one source slot to a range of target slots.
///
/// Several consecutive entries may share a source, e.g. a range row split
/// into a `<=` row and a `>=` row living in different nodes. Presolve
/// broadcasts the source value to every target of the same value kind.
/// Postsolve folds those targets back: duals are summed, primal values and
/// basis statuses come from the first target.
#[derive(Debug, Clone, Default)]
pub struct One2ManyBridge {
    entries: Vec<BridgeEntry>,
}

impl One2ManyBridge {
    /// Create an empty bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn broadcast<T: SlotValue>(&self, nodes: &mut NodeArena, range: IndexRange) {
        for i in range.iter() {
            let e = self.entries[i];
            let src = nodes.get(e.src.node);
            let kind = src.kind();
            let value: T = src.value(e.src.range.beg);
            let dst = nodes.get_mut(e.dst.node);
            if dst.kind() != kind {
                continue;
            }
            for j in e.dst.range.iter() {
                dst.set_value(j, value);
            }
        }
    }

    fn collect<T: SlotValue>(&self, nodes: &mut NodeArena, range: IndexRange) {
        let mut i = range.end;
        while i > range.beg {
            // Group the consecutive entries of one source.
            let src = self.entries[i - 1].src;
            let mut first = i - 1;
            while first > range.beg && self.entries[first - 1].src == src {
                first -= 1;
            }
            let kind = nodes.get(src.node).kind();
            let mut acc: Option<T> = None;
            for e in &self.entries[first..i] {
                let dst = nodes.get(e.dst.node);
                if dst.kind() != kind {
                    continue;
                }
                for j in e.dst.range.iter() {
                    let v: T = dst.value(j);
                    acc = Some(match acc {
                        Some(a) => T::combine(kind, a, v),
                        None => v,
                    });
                }
            }
            if let Some(v) = acc {
                nodes.get_mut(src.node).set_value(src.range.beg, v);
            }
            i = first;
        }
    }
}

impl Bridge for One2ManyBridge {
    fn name(&self) -> &'static str {
        "one2many"
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn add_entry(&mut self, entry: BridgeEntry) -> usize {
        assert!(
            entry.src.is_single_index(),
            "one-to-many link needs a single source index, got {}",
            entry.src.range
        );
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn entry(&self, index: usize) -> BridgeEntry {
        self.entries[index]
    }

    fn presolve_solution(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.broadcast::<f64>(nodes, range);
    }

    fn postsolve_solution(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.collect::<f64>(nodes, range);
    }

    fn presolve_basis(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.broadcast::<i32>(nodes, range);
    }

    fn postsolve_basis(&self, nodes: &mut NodeArena, range: IndexRange) {
        self.collect::<i32>(nodes, range);
    }
}
