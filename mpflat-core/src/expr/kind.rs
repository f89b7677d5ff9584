//! Expression kinds.
//!
//! Kinds are declared in an order that makes every expression class a
//! contiguous range, so class membership is a pair of integer comparisons.

use std::fmt;

/// Kind of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    /// Numeric constant
    Number,
    /// Reference to a variable
    Variable,
    /// Reference to a common (defined) expression
    CommonExpr,

    /// Unary minus
    Minus,
    /// Absolute value
    Abs,
    /// Floor
    Floor,
    /// Ceiling
    Ceil,
    /// Square root
    Sqrt,
    /// Square
    Pow2,
    /// Natural exponent
    Exp,
    /// Natural logarithm
    Log,
    /// Base-10 logarithm
    Log10,
    /// Sine
    Sin,
    /// Hyperbolic sine
    Sinh,
    /// Cosine
    Cos,
    /// Hyperbolic cosine
    Cosh,
    /// Tangent
    Tan,
    /// Hyperbolic tangent
    Tanh,
    /// Arc sine
    Asin,
    /// Inverse hyperbolic sine
    Asinh,
    /// Arc cosine
    Acos,
    /// Inverse hyperbolic cosine
    Acosh,
    /// Arc tangent
    Atan,
    /// Inverse hyperbolic tangent
    Atanh,

    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// `x less y`, i.e. `max(x - y, 0)`
    Less,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Truncated division
    TruncDiv,
    /// Remainder
    Mod,
    /// Power
    Pow,
    /// Power with a constant base
    PowConstBase,
    /// Power with a constant exponent
    PowConstExp,
    /// Two-argument arc tangent
    Atan2,
    /// Rounding to a number of significant digits
    Precision,
    /// Rounding to a number of decimal places
    Round,
    /// Truncation to a number of decimal places
    Trunc,

    /// Numeric if-then-else
    If,
    /// Piecewise-linear term
    PlTerm,
    /// Call of an external function
    Call,

    /// Minimum over arguments
    Min,
    /// Maximum over arguments
    Max,
    /// Sum over arguments
    Sum,
    /// Number of arguments equal to the first one
    NumberOf,
    /// Symbolic number-of
    NumberOfSym,
    /// Number of true logical arguments
    Count,

    /// Logical constant
    Bool,
    /// Logical negation
    Not,
    /// Disjunction
    Or,
    /// Conjunction
    And,
    /// Equivalence
    Iff,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `!=`
    Ne,
    /// At least `n` of the counted conditions hold
    AtLeast,
    /// At most `n` of the counted conditions hold
    AtMost,
    /// Exactly `n` of the counted conditions hold
    Exactly,
    /// Negation of `AtLeast`
    NotAtLeast,
    /// Negation of `AtMost`
    NotAtMost,
    /// Negation of `Exactly`
    NotExactly,
    /// Logical if-then-else
    Implication,
    /// Existential quantifier over arguments
    Exists,
    /// Universal quantifier over arguments
    Forall,
    /// All arguments differ
    AllDiff,
    /// Not all arguments differ
    NotAllDiff,

    /// String literal
    String,
    /// Symbolic if-then-else
    IfSym,
}

/// Inclusive range of kinds forming one expression class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRange {
    /// First kind in the class
    pub first: Kind,
    /// Last kind in the class
    pub last: Kind,
}

impl KindRange {
    /// Create a range. `first` must not come after `last`.
    pub const fn new(first: Kind, last: Kind) -> Self {
        assert!(first as u8 <= last as u8);
        Self { first, last }
    }

    /// Whether `kind` lies in this range.
    #[inline]
    pub const fn contains(self, kind: Kind) -> bool {
        kind as u8 >= self.first as u8 && kind as u8 <= self.last as u8
    }
}

impl Kind {
    /// Number of kinds.
    pub const COUNT: usize = Kind::IfSym as usize + 1;

    /// All expressions.
    pub const EXPR: KindRange = KindRange::new(Kind::Number, Kind::IfSym);
    /// Numeric expressions.
    pub const NUMERIC: KindRange = KindRange::new(Kind::Number, Kind::Count);
    /// Numeric constants.
    pub const NUMBER: KindRange = KindRange::new(Kind::Number, Kind::Number);
    /// Variable and common-expression references.
    pub const REFERENCE: KindRange = KindRange::new(Kind::Variable, Kind::CommonExpr);
    /// Unary numeric expressions.
    pub const UNARY: KindRange = KindRange::new(Kind::Minus, Kind::Atanh);
    /// Binary numeric expressions.
    pub const BINARY: KindRange = KindRange::new(Kind::Add, Kind::Trunc);
    /// Numeric if-then-else.
    pub const IF: KindRange = KindRange::new(Kind::If, Kind::If);
    /// Piecewise-linear terms.
    pub const PLTERM: KindRange = KindRange::new(Kind::PlTerm, Kind::PlTerm);
    /// Function calls.
    pub const CALL: KindRange = KindRange::new(Kind::Call, Kind::Call);
    /// Iterated numeric expressions (min, max, sum, number-of).
    pub const ITERATED: KindRange = KindRange::new(Kind::Min, Kind::NumberOf);
    /// Symbolic number-of.
    pub const NUMBEROF_SYM: KindRange = KindRange::new(Kind::NumberOfSym, Kind::NumberOfSym);
    /// Count expressions.
    pub const COUNT_EXPR: KindRange = KindRange::new(Kind::Count, Kind::Count);
    /// Logical expressions.
    pub const LOGICAL: KindRange = KindRange::new(Kind::Bool, Kind::NotAllDiff);
    /// Logical constants.
    pub const BOOL: KindRange = KindRange::new(Kind::Bool, Kind::Bool);
    /// Logical negation.
    pub const NOT: KindRange = KindRange::new(Kind::Not, Kind::Not);
    /// Binary logical expressions.
    pub const BINARY_LOGICAL: KindRange = KindRange::new(Kind::Or, Kind::Iff);
    /// Relational expressions.
    pub const RELATIONAL: KindRange = KindRange::new(Kind::Lt, Kind::Ne);
    /// Logical count expressions.
    pub const LOGICAL_COUNT: KindRange = KindRange::new(Kind::AtLeast, Kind::NotExactly);
    /// Logical if-then-else.
    pub const IMPLICATION: KindRange = KindRange::new(Kind::Implication, Kind::Implication);
    /// Iterated logical expressions.
    pub const ITERATED_LOGICAL: KindRange = KindRange::new(Kind::Exists, Kind::Forall);
    /// Pairwise expressions.
    pub const PAIRWISE: KindRange = KindRange::new(Kind::AllDiff, Kind::NotAllDiff);
    /// String literals.
    pub const STRING: KindRange = KindRange::new(Kind::String, Kind::String);
    /// Symbolic if-then-else.
    pub const SYMBOLIC_IF: KindRange = KindRange::new(Kind::IfSym, Kind::IfSym);

    /// All kinds in declaration order.
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Number,
        Kind::Variable,
        Kind::CommonExpr,
        Kind::Minus,
        Kind::Abs,
        Kind::Floor,
        Kind::Ceil,
        Kind::Sqrt,
        Kind::Pow2,
        Kind::Exp,
        Kind::Log,
        Kind::Log10,
        Kind::Sin,
        Kind::Sinh,
        Kind::Cos,
        Kind::Cosh,
        Kind::Tan,
        Kind::Tanh,
        Kind::Asin,
        Kind::Asinh,
        Kind::Acos,
        Kind::Acosh,
        Kind::Atan,
        Kind::Atanh,
        Kind::Add,
        Kind::Sub,
        Kind::Less,
        Kind::Mul,
        Kind::Div,
        Kind::TruncDiv,
        Kind::Mod,
        Kind::Pow,
        Kind::PowConstBase,
        Kind::PowConstExp,
        Kind::Atan2,
        Kind::Precision,
        Kind::Round,
        Kind::Trunc,
        Kind::If,
        Kind::PlTerm,
        Kind::Call,
        Kind::Min,
        Kind::Max,
        Kind::Sum,
        Kind::NumberOf,
        Kind::NumberOfSym,
        Kind::Count,
        Kind::Bool,
        Kind::Not,
        Kind::Or,
        Kind::And,
        Kind::Iff,
        Kind::Lt,
        Kind::Le,
        Kind::Eq,
        Kind::Ge,
        Kind::Gt,
        Kind::Ne,
        Kind::AtLeast,
        Kind::AtMost,
        Kind::Exactly,
        Kind::NotAtLeast,
        Kind::NotAtMost,
        Kind::NotExactly,
        Kind::Implication,
        Kind::Exists,
        Kind::Forall,
        Kind::AllDiff,
        Kind::NotAllDiff,
        Kind::String,
        Kind::IfSym,
    ];

    /// Position of the kind in declaration order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind at a declaration-order position.
    pub fn from_index(index: usize) -> Option<Kind> {
        Kind::ALL.get(index).copied()
    }

    /// Operator or function name as written in a model.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Number => "number",
            Kind::Variable => "variable",
            Kind::CommonExpr => "common expression",
            Kind::Minus => "unary -",
            Kind::Abs => "abs",
            Kind::Floor => "floor",
            Kind::Ceil => "ceil",
            Kind::Sqrt => "sqrt",
            Kind::Pow2 => "^2",
            Kind::Exp => "exp",
            Kind::Log => "log",
            Kind::Log10 => "log10",
            Kind::Sin => "sin",
            Kind::Sinh => "sinh",
            Kind::Cos => "cos",
            Kind::Cosh => "cosh",
            Kind::Tan => "tan",
            Kind::Tanh => "tanh",
            Kind::Asin => "asin",
            Kind::Asinh => "asinh",
            Kind::Acos => "acos",
            Kind::Acosh => "acosh",
            Kind::Atan => "atan",
            Kind::Atanh => "atanh",
            Kind::Add => "+",
            Kind::Sub => "-",
            Kind::Less => "less",
            Kind::Mul => "*",
            Kind::Div => "/",
            Kind::TruncDiv => "div",
            Kind::Mod => "mod",
            Kind::Pow => "^",
            Kind::PowConstBase => "^ (constant base)",
            Kind::PowConstExp => "^ (constant exponent)",
            Kind::Atan2 => "atan2",
            Kind::Precision => "precision",
            Kind::Round => "round",
            Kind::Trunc => "trunc",
            Kind::If => "if",
            Kind::PlTerm => "pl term",
            Kind::Call => "function call",
            Kind::Min => "min",
            Kind::Max => "max",
            Kind::Sum => "sum",
            Kind::NumberOf => "numberof",
            Kind::NumberOfSym => "symbolic numberof",
            Kind::Count => "count",
            Kind::Bool => "bool",
            Kind::Not => "!",
            Kind::Or => "||",
            Kind::And => "&&",
            Kind::Iff => "<==>",
            Kind::Lt => "<",
            Kind::Le => "<=",
            Kind::Eq => "=",
            Kind::Ge => ">=",
            Kind::Gt => ">",
            Kind::Ne => "!=",
            Kind::AtLeast => "atleast",
            Kind::AtMost => "atmost",
            Kind::Exactly => "exactly",
            Kind::NotAtLeast => "!atleast",
            Kind::NotAtMost => "!atmost",
            Kind::NotExactly => "!exactly",
            Kind::Implication => "==>",
            Kind::Exists => "exists",
            Kind::Forall => "forall",
            Kind::AllDiff => "alldiff",
            Kind::NotAllDiff => "!alldiff",
            Kind::String => "string",
            Kind::IfSym => "symbolic if",
        }
    }

    /// Whether the kind produces a numeric value.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        Kind::NUMERIC.contains(self)
    }

    /// Whether the kind produces a logical value.
    #[inline]
    pub const fn is_logical(self) -> bool {
        Kind::LOGICAL.contains(self)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_declaration_order() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(Kind::from_index(i), Some(*kind));
        }
        assert_eq!(Kind::from_index(Kind::COUNT), None);
    }

    #[test]
    fn test_ranges_partition_numeric_and_logical() {
        for kind in Kind::ALL {
            let classes = [Kind::NUMERIC, Kind::LOGICAL, Kind::STRING, Kind::SYMBOLIC_IF]
                .iter()
                .filter(|r| r.contains(kind))
                .count();
            assert_eq!(classes, 1, "{kind:?}");
        }
    }

    #[test]
    fn test_subranges() {
        assert!(Kind::UNARY.contains(Kind::Atanh));
        assert!(!Kind::UNARY.contains(Kind::Add));
        assert!(Kind::BINARY.contains(Kind::Atan2));
        assert!(Kind::ITERATED.contains(Kind::NumberOf));
        assert!(!Kind::ITERATED.contains(Kind::Count));
        assert!(Kind::RELATIONAL.contains(Kind::Ne));
        assert!(Kind::PAIRWISE.contains(Kind::NotAllDiff));
        assert!(Kind::REFERENCE.contains(Kind::CommonExpr));
    }
}
