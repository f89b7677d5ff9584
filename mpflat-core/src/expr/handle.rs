//! Typed expression handles.
//!
//! A handle is a dense index into an [`ExprFactory`](super::ExprFactory)
//! arena plus a static kind range. Handles are `Copy`, compare by identity and
//! are only meaningful together with the factory that created them.

use super::kind::{Kind, KindRange};
use std::fmt;

/// Index of a node in an expression arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "expression arena overflow");
        ExprId(index as u32)
    }

    /// Position of the node in its arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A typed handle to an expression node.
pub trait ExprHandle: Copy + fmt::Debug + Into<Expr> {
    /// Kinds a node must have to be viewed through this handle type.
    const RANGE: KindRange;

    /// Arena index of the node.
    fn id(self) -> ExprId;

    /// Wrap an index without checking its kind.
    #[doc(hidden)]
    fn from_id_unchecked(id: ExprId) -> Self;
}

macro_rules! expr_handle {
    ($(#[$meta:meta])* $name:ident, $range:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ExprId);

        impl ExprHandle for $name {
            const RANGE: KindRange = $range;

            #[inline]
            fn id(self) -> ExprId {
                self.0
            }

            #[inline]
            fn from_id_unchecked(id: ExprId) -> Self {
                $name(id)
            }
        }
    };
}

macro_rules! upcast {
    ($target:ident: $($source:ident),+ $(,)?) => {
        $(
            impl From<$source> for $target {
                #[inline]
                fn from(e: $source) -> $target {
                    $target(e.0)
                }
            }
        )+
    };
}

expr_handle!(
    /// Any expression.
    Expr,
    Kind::EXPR
);
expr_handle!(
    /// Numeric expression.
    NumericExpr,
    Kind::NUMERIC
);
expr_handle!(
    /// Logical expression.
    LogicalExpr,
    Kind::LOGICAL
);
expr_handle!(
    /// Numeric constant.
    NumericConstant,
    Kind::NUMBER
);
expr_handle!(
    /// Variable or common-expression reference.
    Reference,
    Kind::REFERENCE
);
expr_handle!(
    /// Unary numeric expression.
    UnaryExpr,
    Kind::UNARY
);
expr_handle!(
    /// Binary numeric expression.
    BinaryExpr,
    Kind::BINARY
);
expr_handle!(
    /// Numeric if-then-else.
    IfExpr,
    Kind::IF
);
expr_handle!(
    /// Piecewise-linear term.
    PlTerm,
    Kind::PLTERM
);
expr_handle!(
    /// Call of an external function.
    CallExpr,
    Kind::CALL
);
expr_handle!(
    /// Iterated numeric expression: min, max, sum or number-of.
    IteratedExpr,
    Kind::ITERATED
);
expr_handle!(
    /// Symbolic number-of expression.
    SymbolicNumberOfExpr,
    Kind::NUMBEROF_SYM
);
expr_handle!(
    /// Count of true logical arguments.
    CountExpr,
    Kind::COUNT_EXPR
);
expr_handle!(
    /// Logical constant.
    LogicalConstant,
    Kind::BOOL
);
expr_handle!(
    /// Logical negation.
    NotExpr,
    Kind::NOT
);
expr_handle!(
    /// Binary logical expression.
    BinaryLogicalExpr,
    Kind::BINARY_LOGICAL
);
expr_handle!(
    /// Relational expression.
    RelationalExpr,
    Kind::RELATIONAL
);
expr_handle!(
    /// Logical count expression such as `atleast`.
    LogicalCountExpr,
    Kind::LOGICAL_COUNT
);
expr_handle!(
    /// Logical if-then-else.
    ImplicationExpr,
    Kind::IMPLICATION
);
expr_handle!(
    /// Iterated logical expression: exists or forall.
    IteratedLogicalExpr,
    Kind::ITERATED_LOGICAL
);
expr_handle!(
    /// Pairwise expression: alldiff or its negation.
    PairwiseExpr,
    Kind::PAIRWISE
);
expr_handle!(
    /// String literal.
    StringLiteral,
    Kind::STRING
);
expr_handle!(
    /// Symbolic if-then-else.
    SymbolicIfExpr,
    Kind::SYMBOLIC_IF
);

upcast!(Expr: NumericExpr, LogicalExpr, NumericConstant, Reference, UnaryExpr, BinaryExpr,
    IfExpr, PlTerm, CallExpr, IteratedExpr, SymbolicNumberOfExpr, CountExpr, LogicalConstant,
    NotExpr, BinaryLogicalExpr, RelationalExpr, LogicalCountExpr, ImplicationExpr,
    IteratedLogicalExpr, PairwiseExpr, StringLiteral, SymbolicIfExpr);

upcast!(NumericExpr: NumericConstant, Reference, UnaryExpr, BinaryExpr, IfExpr, PlTerm,
    CallExpr, IteratedExpr, SymbolicNumberOfExpr, CountExpr);

upcast!(LogicalExpr: LogicalConstant, NotExpr, BinaryLogicalExpr, RelationalExpr,
    LogicalCountExpr, ImplicationExpr, IteratedLogicalExpr, PairwiseExpr);

/// Handle of an external function record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Function(pub(crate) u32);

impl Function {
    /// Position of the function in its factory.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result type of an external function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Returns a number
    Numeric,
    /// Returns a string
    Symbolic,
}
