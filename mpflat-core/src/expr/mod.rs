//! Expression trees of the nonlinear model input.
//!
//! Expressions are stored in an [`ExprFactory`] arena and addressed through
//! typed handles such as [`NumericExpr`] or [`RelationalExpr`]. A handle's
//! type fixes the range of [`Kind`]s its node may have, so accessors never
//! need a run-time kind check once a handle was obtained from a `make_*`
//! function or a successful [`ExprFactory::cast`].

pub mod factory;
pub mod handle;
pub mod kind;

pub use factory::{
    ArgBuilder, CallExprBuilder, CountExprBuilder, ExprArgs, ExprFactory, IteratedExprBuilder,
    IteratedLogicalExprBuilder, NumberOfExprBuilder, PairwiseExprBuilder, PlTermBuilder,
    SymbolicNumberOfExprBuilder,
};
pub use handle::{
    BinaryExpr, BinaryLogicalExpr, CallExpr, CountExpr, Expr, ExprHandle, ExprId, Function,
    FunctionType, IfExpr, ImplicationExpr, IteratedExpr, IteratedLogicalExpr, LogicalConstant,
    LogicalCountExpr, LogicalExpr, NotExpr, NumericConstant, NumericExpr, PairwiseExpr, PlTerm,
    Reference, RelationalExpr, StringLiteral, SymbolicIfExpr, SymbolicNumberOfExpr, UnaryExpr,
};
pub use kind::{Kind, KindRange};
