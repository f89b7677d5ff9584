//! Constraint kind tags.

use std::fmt;

macro_rules! constraint_kinds {
    ($($(#[$doc:meta])* $variant:ident => $name:literal, $option:literal;)+) => {
        /// Static type of a flat constraint.
        ///
        /// Every kind has its own keeper, value node and acceptance level.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ConstraintKind {
            $($(#[$doc])* $variant,)+
        }

        impl ConstraintKind {
            /// Every kind, in keeper order.
            pub const ALL: &'static [ConstraintKind] = &[$(ConstraintKind::$variant,)+];

            /// Display name, e.g. `LinConLE`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(ConstraintKind::$variant => $name,)+
                }
            }

            /// Suffix of the `acc:` option, e.g. `indle`.
            pub const fn option_name(self) -> &'static str {
                match self {
                    $(ConstraintKind::$variant => $option,)+
                }
            }
        }
    };
}

constraint_kinds! {
    /// `lb <= a'x <= ub`, both finite
    LinRange => "LinConRange", "linrange";
    /// `a'x <= ub`
    LinLE => "LinConLE", "linle";
    /// `a'x == rhs`
    LinEQ => "LinConEQ", "lineq";
    /// `a'x >= lb`
    LinGE => "LinConGE", "linge";
    /// Quadratic range
    QuadRange => "QuadConRange", "quadrange";
    /// Quadratic `<=`
    QuadLE => "QuadConLE", "quadle";
    /// Quadratic `==`
    QuadEQ => "QuadConEQ", "quadeq";
    /// Quadratic `>=`
    QuadGE => "QuadConGE", "quadge";
    /// `r == a'x + b`
    LinearFunctional => "LinearFunctionalConstraint", "linfunc";
    /// `r == quadratic expression`
    QuadraticFunctional => "QuadraticFunctionalConstraint", "quadfunc";
    /// `r == max(x)`
    Max => "MaxConstraint", "max";
    /// `r == min(x)`
    Min => "MinConstraint", "min";
    /// `r == |x|`
    Abs => "AbsConstraint", "abs";
    /// `r == and(x)`
    And => "AndConstraint", "and";
    /// `r == or(x)`
    Or => "OrConstraint", "or";
    /// `r == !x`
    Not => "NotConstraint", "not";
    /// `r == x / y`
    Div => "DivConstraint", "div";
    /// `r == if c then x else y`
    IfThen => "IfThenConstraint", "ifthen";
    /// Logical if-then-else
    Implication => "ImplicationConstraint", "impl";
    /// `r == alldiff(x)`
    AllDiff => "AllDiffConstraint", "alldiff";
    /// `r == numberof k in (x)`, constant `k`
    NumberofConst => "NumberofConstConstraint", "numberofconst";
    /// `r == numberof y in (x)`, variable `y`
    NumberofVar => "NumberofVarConstraint", "numberofvar";
    /// `r == count(x)`
    Count => "CountConstraint", "count";
    /// `r == exp(x)`
    Exp => "ExpConstraint", "exp";
    /// `r == a^x`
    ExpA => "ExpAConstraint", "expa";
    /// `r == log(x)`
    Log => "LogConstraint", "log";
    /// `r == log_a(x)`
    LogA => "LogAConstraint", "loga";
    /// `r == x^p`
    Pow => "PowConstraint", "pow";
    /// `r == sin(x)`
    Sin => "SinConstraint", "sin";
    /// `r == cos(x)`
    Cos => "CosConstraint", "cos";
    /// `r == tan(x)`
    Tan => "TanConstraint", "tan";
    /// `r == asin(x)`
    Asin => "AsinConstraint", "asin";
    /// `r == acos(x)`
    Acos => "AcosConstraint", "acos";
    /// `r == atan(x)`
    Atan => "AtanConstraint", "atan";
    /// `r == sinh(x)`
    Sinh => "SinhConstraint", "sinh";
    /// `r == cosh(x)`
    Cosh => "CoshConstraint", "cosh";
    /// `r == tanh(x)`
    Tanh => "TanhConstraint", "tanh";
    /// `r == asinh(x)`
    Asinh => "AsinhConstraint", "asinh";
    /// `r == acosh(x)`
    Acosh => "AcoshConstraint", "acosh";
    /// `r == atanh(x)`
    Atanh => "AtanhConstraint", "atanh";
    /// `r == (a'x == d)`
    CondLinEQ => "CondLinConEQ", "condlineq";
    /// `r == (a'x <= d)`
    CondLinLE => "CondLinConLE", "condlinle";
    /// `r == (a'x < d)`
    CondLinLT => "CondLinConLT", "condlinlt";
    /// `r == (a'x >= d)`
    CondLinGE => "CondLinConGE", "condlinge";
    /// `r == (a'x > d)`
    CondLinGT => "CondLinConGT", "condlingt";
    /// Quadratic conditional `==`
    CondQuadEQ => "CondQuadConEQ", "condquadeq";
    /// Quadratic conditional `<=`
    CondQuadLE => "CondQuadConLE", "condquadle";
    /// Quadratic conditional `<`
    CondQuadLT => "CondQuadConLT", "condquadlt";
    /// Quadratic conditional `>=`
    CondQuadGE => "CondQuadConGE", "condquadge";
    /// Quadratic conditional `>`
    CondQuadGT => "CondQuadConGT", "condquadgt";
    /// `b == v ==> a'x <= d`
    IndicatorLinLE => "IndicatorConstraintLinLE", "indle";
    /// `b == v ==> a'x == d`
    IndicatorLinEQ => "IndicatorConstraintLinEQ", "indeq";
    /// `b == v ==> a'x >= d`
    IndicatorLinGE => "IndicatorConstraintLinGE", "indge";
    /// Quadratic indicator `<=`
    IndicatorQuadLE => "IndicatorConstraintQuadLE", "indquadle";
    /// Quadratic indicator `==`
    IndicatorQuadEQ => "IndicatorConstraintQuadEQ", "indquadeq";
    /// Quadratic indicator `>=`
    IndicatorQuadGE => "IndicatorConstraintQuadGE", "indquadge";
    /// `r == pl(x)`
    Pl => "PLConstraint", "pl";
    /// Special ordered set of type 1
    Sos1 => "SOS1Constraint", "sos1";
    /// Special ordered set of type 2
    Sos2 => "SOS2Constraint", "sos2";
    /// Linear complementarity
    ComplementarityLinear => "ComplementarityLinear", "compl";
    /// Quadratic complementarity
    ComplementarityQuadratic => "ComplementarityQuadratic", "complquad";
    /// `c0*x0 >= ||c_i*x_i||`
    QuadraticCone => "QuadraticConeConstraint", "quadcone";
    /// `2*c0*x0*c1*x1 >= ||c_i*x_i||^2`
    RotatedQuadraticCone => "RotatedQuadraticConeConstraint", "rotatedquadcone";
    /// Power cone
    PowerCone => "PowerConeConstraint", "powercone";
    /// Exponential cone
    ExponentialCone => "ExponentialConeConstraint", "expcone";
}

impl ConstraintKind {
    /// Number of kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of the kind.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind whose `acc:` option suffix is `name`.
    pub fn from_option_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.option_name() == name)
    }

    /// Whether the kind defines a result variable and is deduplicated.
    pub fn is_functional(self) -> bool {
        use ConstraintKind::*;
        !matches!(
            self,
            LinRange
                | LinLE
                | LinEQ
                | LinGE
                | QuadRange
                | QuadLE
                | QuadEQ
                | QuadGE
                | IndicatorLinLE
                | IndicatorLinEQ
                | IndicatorLinGE
                | IndicatorQuadLE
                | IndicatorQuadEQ
                | IndicatorQuadGE
                | Sos1
                | Sos2
                | ComplementarityLinear
                | ComplementarityQuadratic
                | QuadraticCone
                | RotatedQuadraticCone
                | PowerCone
                | ExponentialCone
        )
    }

    /// Whether the kind carries quadratic terms.
    pub fn is_quadratic(self) -> bool {
        use ConstraintKind::*;
        matches!(
            self,
            QuadRange
                | QuadLE
                | QuadEQ
                | QuadGE
                | QuadraticFunctional
                | CondQuadEQ
                | CondQuadLE
                | CondQuadLT
                | CondQuadGE
                | CondQuadGT
                | IndicatorQuadLE
                | IndicatorQuadEQ
                | IndicatorQuadGE
                | ComplementarityQuadratic
        )
    }

    /// Whether the kind is a second-order cone.
    pub fn is_socp_cone(self) -> bool {
        matches!(
            self,
            ConstraintKind::QuadraticCone | ConstraintKind::RotatedQuadraticCone
        )
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&str> = ConstraintKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ConstraintKind::COUNT);
        let mut options: Vec<&str> = ConstraintKind::ALL.iter().map(|k| k.option_name()).collect();
        options.sort_unstable();
        options.dedup();
        assert_eq!(options.len(), ConstraintKind::COUNT);
    }

    #[test]
    fn test_index_matches_order() {
        for (i, k) in ConstraintKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }

    #[test]
    fn test_from_option_name() {
        assert_eq!(ConstraintKind::from_option_name("indle"), Some(ConstraintKind::IndicatorLinLE));
        assert_eq!(ConstraintKind::from_option_name("nope"), None);
        assert_eq!(ConstraintKind::LinLE.to_string(), "LinConLE");
    }

    #[test]
    fn test_classification() {
        assert!(ConstraintKind::Max.is_functional());
        assert!(ConstraintKind::CondQuadLE.is_functional());
        assert!(!ConstraintKind::Sos2.is_functional());
        assert!(ConstraintKind::IndicatorQuadGE.is_quadratic());
        assert!(ConstraintKind::QuadraticCone.is_socp_cone());
    }
}
