//! mpflat presolve - mapping values between original and transformed models
//!
//! Every reformulation performed by the converter is recorded as a bridge
//! entry linking slots of an original-model value node to slots of a
//! transformed-model value node. Replaying the entries forward maps a warm
//! start into the solver's model; replaying them backward maps the solver's
//! solution onto the original variables and constraints.
//!
//! # Examples
//!
//! ```
//! use mpflat_presolve::{NodeRange, ValueKind, ValuePresolver};
//!
//! let mut p = ValuePresolver::new();
//! let orig = p.add_node("range rows", ValueKind::Dual);
//! let le = p.add_node("le rows", ValueKind::Dual);
//! let ge = p.add_node("ge rows", ValueKind::Dual);
//! let src = p.add_slots(orig, 1);
//! let le_row = p.add_slots(le, 1);
//! let ge_row = p.add_slots(ge, 1);
//! p.add_one2many_link(src, le_row);
//! p.add_one2many_link(src, ge_row);
//!
//! p.set_values(le, &[0.0]);
//! p.set_values(ge, &[-3.0]);
//! p.postsolve_solution(p.full_range());
//! assert_eq!(p.values::<f64>(orig), vec![-3.0]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod export;
pub mod node;
pub mod presolver;

pub use bridge::{Bridge, BridgeEntry, BridgeId, BridgeRange, CopyBridge, One2ManyBridge};
pub use export::GraphExporter;
pub use node::{IndexRange, NodeArena, NodeId, NodeRange, SlotValue, ValueKind, ValueNode};
pub use presolver::ValuePresolver;
