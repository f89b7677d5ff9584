//! The value presolver: node registry, bridges and the global entry order.

use crate::bridge::{Bridge, BridgeEntry, BridgeId, BridgeRange, CopyBridge, One2ManyBridge};
use crate::export::GraphExporter;
use crate::node::{IndexRange, NodeArena, NodeId, NodeRange, SlotValue, ValueKind, ValueNode};
use mpflat_core::Result;
use tracing::debug;

const COPY_BRIDGE: BridgeId = BridgeId(0);
const ONE2MANY_BRIDGE: BridgeId = BridgeId(1);

#[derive(Debug, Clone, Copy)]
enum Pass {
    PresolveSolution,
    PostsolveSolution,
    PresolveBasis,
    PostsolveBasis,
}

/// Owns value nodes and bridges and replays them in registration order.
///
/// Every bridge entry is appended to a registry. Consecutive entries of the
/// same bridge share one registry record, so replaying a long run of copy
/// links costs one dispatch. Presolve walks the registry forward, postsolve
/// backward.
#[derive(Debug)]
pub struct ValuePresolver {
    nodes: NodeArena,
    bridges: Vec<Box<dyn Bridge>>,
    registry: Vec<BridgeRange>,
    num_entries: usize,
    exporter: Option<GraphExporter>,
}

impl Default for ValuePresolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuePresolver {
    /// Create a presolver with the copy and one-to-many bridges installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            bridges: vec![Box::new(CopyBridge::new()), Box::new(One2ManyBridge::new())],
            registry: Vec::new(),
            num_entries: 0,
            exporter: None,
        }
    }

    /// Export every subsequent node and entry.
    pub fn set_exporter(&mut self, exporter: GraphExporter) {
        self.exporter = Some(exporter);
    }

    /// Whether graph export is active.
    pub fn is_exporting(&self) -> bool {
        self.exporter.is_some()
    }

    /// Close the export stream. Returns the number of records written.
    pub fn finish_export(&mut self) -> Result<Option<usize>> {
        self.exporter.take().map(GraphExporter::finish).transpose()
    }

    /// Add an empty value node.
    pub fn add_node(&mut self, name: impl Into<String>, kind: ValueKind) -> NodeId {
        let id = self.nodes.add(name, kind);
        if let Some(ex) = self.exporter.as_mut() {
            ex.node(id, self.nodes.get(id).name(), kind);
        }
        id
    }

    /// Append `n` slots to a node.
    pub fn add_slots(&mut self, node: NodeId, n: usize) -> NodeRange {
        let range = self.nodes.get_mut(node).add_slots(n);
        if let Some(ex) = self.exporter.as_mut() {
            ex.slots(node, self.nodes.get(node).name(), range);
        }
        NodeRange { node, range }
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &ValueNode {
        self.nodes.get(id)
    }

    /// All nodes.
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    /// Install an additional bridge.
    pub fn add_bridge(&mut self, bridge: Box<dyn Bridge>) -> BridgeId {
        let id = BridgeId(self.bridges.len() as u32);
        self.bridges.push(bridge);
        id
    }

    /// The built-in copy bridge.
    pub fn copy_bridge(&self) -> BridgeId {
        COPY_BRIDGE
    }

    /// The built-in one-to-many bridge.
    pub fn one2many_bridge(&self) -> BridgeId {
        ONE2MANY_BRIDGE
    }

    /// Bridge by id.
    pub fn bridge(&self, id: BridgeId) -> &dyn Bridge {
        self.bridges[id.index()].as_ref()
    }

    /// Add an entry to a bridge and register it.
    pub fn add_entry(&mut self, bridge: BridgeId, src: NodeRange, dst: NodeRange) {
        let entry = BridgeEntry { src, dst };
        let b = &mut self.bridges[bridge.index()];
        let index = b.add_entry(entry);
        if let Some(ex) = self.exporter.as_mut() {
            ex.entry(b.name(), index, entry);
        }
        self.num_entries += 1;
        let added = BridgeRange {
            bridge,
            range: IndexRange::single(index),
        };
        let extended = self.registry.last_mut().is_some_and(|last| last.try_extend(added));
        if !extended {
            self.registry.push(added);
        }
    }

    /// Link `src` to `dst` slot by slot.
    pub fn add_copy_link(&mut self, src: NodeRange, dst: NodeRange) {
        self.add_entry(COPY_BRIDGE, src, dst);
    }

    /// Link the single slot `src` to every slot of `dst`.
    pub fn add_one2many_link(&mut self, src: NodeRange, dst: NodeRange) {
        self.add_entry(ONE2MANY_BRIDGE, src, dst);
    }

    /// Number of registry records after coalescing.
    pub fn num_registry_records(&self) -> usize {
        self.registry.len()
    }

    /// Total number of bridge entries.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    /// Range covering the whole registry.
    pub fn full_range(&self) -> IndexRange {
        IndexRange::new(0, self.registry.len())
    }

    /// Presolve solution values over registry records `range`.
    pub fn presolve_solution(&mut self, range: IndexRange) {
        self.run(Pass::PresolveSolution, range);
    }

    /// Postsolve solution values over registry records `range`.
    pub fn postsolve_solution(&mut self, range: IndexRange) {
        self.run(Pass::PostsolveSolution, range);
    }

    /// Presolve basis statuses over registry records `range`.
    pub fn presolve_basis(&mut self, range: IndexRange) {
        self.run(Pass::PresolveBasis, range);
    }

    /// Postsolve basis statuses over registry records `range`.
    pub fn postsolve_basis(&mut self, range: IndexRange) {
        self.run(Pass::PostsolveBasis, range);
    }

    /// Store values in a node.
    pub fn set_values<T: SlotValue>(&mut self, node: NodeId, values: &[T]) {
        self.nodes.get_mut(node).set_values(values);
    }

    /// Values of a node, padded to its size.
    pub fn values<T: SlotValue>(&self, node: NodeId) -> Vec<T> {
        self.nodes.get(node).values()
    }

    /// Forget all stored values.
    pub fn clear_values(&mut self) {
        self.nodes.clear_values();
    }

    fn run(&mut self, pass: Pass, range: IndexRange) {
        assert!(
            range.end <= self.registry.len(),
            "registry range {range} out of bounds"
        );
        let records = &self.registry[range.beg..range.end];
        debug!(?pass, records = records.len(), "replaying bridges");
        let forward = matches!(pass, Pass::PresolveSolution | Pass::PresolveBasis);
        let apply = |rec: &BridgeRange, nodes: &mut NodeArena| {
            let bridge = &self.bridges[rec.bridge.index()];
            match pass {
                Pass::PresolveSolution => bridge.presolve_solution(nodes, rec.range),
                Pass::PostsolveSolution => bridge.postsolve_solution(nodes, rec.range),
                Pass::PresolveBasis => bridge.presolve_basis(nodes, rec.range),
                Pass::PostsolveBasis => bridge.postsolve_basis(nodes, rec.range),
            }
        };
        if forward {
            for rec in records {
                apply(rec, &mut self.nodes);
            }
        } else {
            for rec in records.iter().rev() {
                apply(rec, &mut self.nodes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_coalesces_consecutive_entries() {
        let mut p = ValuePresolver::new();
        let a = p.add_node("a", ValueKind::Primal);
        let b = p.add_node("b", ValueKind::Primal);
        let ra = p.add_slots(a, 3);
        let rb = p.add_slots(b, 3);
        for i in 0..3 {
            p.add_copy_link(
                NodeRange::single(a, ra.range.beg + i),
                NodeRange::single(b, rb.range.beg + i),
            );
        }
        assert_eq!(p.num_registry_records(), 1);
        p.add_one2many_link(NodeRange::single(a, 0), rb);
        p.add_copy_link(NodeRange::single(a, 1), NodeRange::single(b, 1));
        assert_eq!(p.num_registry_records(), 3);
        assert_eq!(p.num_entries(), 5);
    }

    #[test]
    fn test_postsolve_runs_in_reverse() {
        // a -> b (copy), then b -> c (copy)
        let mut p = ValuePresolver::new();
        let a = p.add_node("a", ValueKind::Primal);
        let b = p.add_node("b", ValueKind::Primal);
        let c = p.add_node("c", ValueKind::Primal);
        let ra = p.add_slots(a, 1);
        let rb = p.add_slots(b, 1);
        let rc = p.add_slots(c, 1);
        p.add_copy_link(ra, rb);
        p.add_one2many_link(rb, rc);

        p.set_values(c, &[7.0]);
        let all = p.full_range();
        p.postsolve_solution(all);
        assert_eq!(p.values::<f64>(a), vec![7.0]);

        p.set_values(a, &[1.5]);
        p.presolve_solution(all);
        assert_eq!(p.values::<f64>(c), vec![1.5]);
    }

    #[test]
    fn test_basis_round_trip() {
        let mut p = ValuePresolver::new();
        let a = p.add_node("a", ValueKind::Dual);
        let b = p.add_node("b", ValueKind::Dual);
        let ra = p.add_slots(a, 2);
        let rb = p.add_slots(b, 2);
        p.add_copy_link(ra, rb);
        p.set_values(a, &[1i32, 3]);
        p.presolve_basis(p.full_range());
        assert_eq!(p.values::<i32>(b), vec![1, 3]);
        p.set_values(b, &[2i32, 2]);
        p.postsolve_basis(p.full_range());
        assert_eq!(p.values::<i32>(a), vec![2, 2]);
        assert_eq!(p.values::<f64>(a), vec![0.0, 0.0]);
    }
}
