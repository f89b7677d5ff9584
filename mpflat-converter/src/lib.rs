//! mpflat converter - flat models and their reformulation for a target solver
//!
//! This crate turns an optimization model into one a given solver accepts:
//! - A flat model of variables and per-kind constraint keepers ([`FlatModel`])
//! - Functional constraints deduplicated through keeper maps, with usage
//!   counting and elimination of unused definitions ([`ConversionContext`])
//! - Converters rewriting each kind the target does not take ([`convert`],
//!   [`ConverterRegistry`])
//! - The conversion loop, solver push and solution mapping ([`FlatConverter`])
//! - Flattening of expression trees ([`ExprFlattener`])
//!
//! # Examples
//!
//! ```
//! use mpflat_converter::{
//!     CollectingSolver, ConstraintKind, ConverterConfig, FlatConverter, FuncExpr, LinTerms, VarType,
//! };
//!
//! let mut conv = FlatConverter::new(CollectingSolver::mip(), ConverterConfig::default()).unwrap();
//! let x = conv.add_var(0.0, 4.0, VarType::Continuous).unwrap();
//! let y = conv.add_var(-2.0, 3.0, VarType::Continuous).unwrap();
//! // r = max(x, y) is only used in r <= 2
//! let r = conv.assign_result_var(FuncExpr::Max(vec![x, y])).unwrap();
//! conv.add_constraint(mpflat_converter::AlgebraicConstraint::le(LinTerms::single(1.0, r), 2.0))
//!     .unwrap();
//! conv.finish_model_input().unwrap();
//! assert_eq!(conv.solver().count(ConstraintKind::Max), 0);
//! assert!(conv.solver().count(ConstraintKind::LinLE) >= 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bounds;
pub mod constraint;
pub mod context;
pub mod convert;
pub mod converter;
pub mod expr;
pub mod flatten;
pub mod keeper;
pub mod link;
pub mod model;
pub mod objective;
pub mod registry;
pub mod solver;
pub mod stats;
pub mod var;

pub use bounds::VarBounds;
pub use constraint::{
    AlgebraicBody, AlgebraicConstraint, CmpOp, Comparison, ComplementarityConstraint, ConeConstraint, ConeKind,
    Constraint, ConstraintKind, Context, FuncExpr, FunctionalConstraint, IndicatorConstraint, MathFunc, PlFunction,
    SosConstraint, SosOrder,
};
pub use context::{ConversionContext, ConverterState, VarOrConst};
pub use converter::FlatConverter;
pub use expr::{AffineExpr, LinTerms, QuadAndLinTerms, QuadTerms, QuadraticExpr};
pub use flatten::ExprFlattener;
pub use keeper::{ConstraintKeeper, ConstraintRef, ConstraintStatus};
pub use link::LinkContext;
pub use model::FlatModel;
pub use objective::{LinearObjective, ObjSense, QuadraticObjective};
pub use registry::{ConstraintConverter, ConverterRegistry};
pub use solver::{CollectingSolver, ModelValues, SolverBasis, SolverCapabilities, SolverSolution, SolverValues};
pub use stats::{ConversionReport, ConversionStats};
pub use var::{VarId, VarType, VariableArrays};

pub use mpflat_core::{AcceptanceLevel, ConverterConfig, FlatError, Result};
