//! Automatic linking of created items to the item being converted.

use mpflat_presolve::{NodeRange, ValuePresolver};
use smallvec::SmallVec;

/// Source slot of the current conversion plus the target ranges created
/// while it is active.
///
/// Targets are committed as one-to-many links when the conversion ends.
#[derive(Debug, Clone, Default)]
pub struct LinkContext {
    source: Option<NodeRange>,
    targets: SmallVec<[NodeRange; 4]>,
}

impl LinkContext {
    /// No source: nothing is linked.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Link everything created to `source`, a single slot.
    #[must_use]
    pub fn with_source(source: NodeRange) -> Self {
        assert!(source.is_single_index(), "link source must be a single slot");
        Self {
            source: Some(source),
            targets: SmallVec::new(),
        }
    }

    /// Whether a source is set.
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// The source slot.
    pub fn source(&self) -> Option<NodeRange> {
        self.source
    }

    /// Target ranges gathered so far.
    pub fn targets(&self) -> &[NodeRange] {
        &self.targets
    }

    /// Record a newly created range as a target.
    pub fn auto_link(&mut self, target: NodeRange) {
        if self.source.is_none() {
            return;
        }
        let extended = self.targets.last_mut().is_some_and(|last| last.try_extend_by(target));
        if !extended {
            self.targets.push(target);
        }
    }

    /// Drop the source and every uncommitted target.
    pub fn turn_off(&mut self) {
        self.source = None;
        self.targets.clear();
    }

    /// Register the gathered targets and switch off.
    pub fn commit(&mut self, presolver: &mut ValuePresolver) {
        if let Some(src) = self.source {
            for &t in &self.targets {
                presolver.add_one2many_link(src, t);
            }
        }
        self.turn_off();
    }
}
