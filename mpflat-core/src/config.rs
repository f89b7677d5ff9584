//! Converter configuration and the flat named-option surface.
//!
//! Every option has a canonical name such as `cvt:mip:bigM` and optional
//! aliases. Per-kind acceptance overrides use the `acc:<kind>` prefix and are
//! validated against the known constraint kinds by the converter.

use crate::error::{FlatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How well a target solver handles a constraint kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AcceptanceLevel {
    /// The kind must be converted
    #[default]
    NotAccepted,
    /// Accepted, but a conversion is tried first
    AcceptedButNotRecommended,
    /// Accepted natively
    Recommended,
}

impl AcceptanceLevel {
    /// Level from its numeric option value (0, 1 or 2).
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(AcceptanceLevel::NotAccepted),
            1 => Some(AcceptanceLevel::AcceptedButNotRecommended),
            2 => Some(AcceptanceLevel::Recommended),
            _ => None,
        }
    }

    /// Numeric option value of this level.
    pub fn level(self) -> i64 {
        match self {
            AcceptanceLevel::NotAccepted => 0,
            AcceptanceLevel::AcceptedButNotRecommended => 1,
            AcceptanceLevel::Recommended => 2,
        }
    }

    /// Whether the target can take the kind at all.
    pub fn is_accepted(self) -> bool {
        self != AcceptanceLevel::NotAccepted
    }
}

impl fmt::Display for AcceptanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptanceLevel::NotAccepted => write!(f, "not accepted"),
            AcceptanceLevel::AcceptedButNotRecommended => write!(f, "accepted (not recommended)"),
            AcceptanceLevel::Recommended => write!(f, "recommended"),
        }
    }
}

/// Value type of a named option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// 0/1 or true/false
    Bool,
    /// Integer
    Int,
    /// Floating point
    Double,
    /// Free text
    Str,
}

/// Description of a named option.
#[derive(Debug, Clone, Copy)]
pub struct OptionInfo {
    /// Canonical name
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Value type
    pub ty: OptionType,
    /// Help text
    pub description: &'static str,
}

const OPTIONS: &[OptionInfo] = &[
    OptionInfo {
        name: "cvt:pre:all",
        aliases: &[],
        ty: OptionType::Bool,
        description: "0/1*: Set to 0 to disable most presolve in the flat converter.",
    },
    OptionInfo {
        name: "cvt:pre:eqresult",
        aliases: &[],
        ty: OptionType::Bool,
        description: "0/1*: Preprocess reified equality comparison's boolean result bounds.",
    },
    OptionInfo {
        name: "cvt:pre:eqbinary",
        aliases: &[],
        ty: OptionType::Bool,
        description: "0/1*: Preprocess reified equality comparison with a binary variable.",
    },
    OptionInfo {
        name: "cvt:quadobj",
        aliases: &["passquadobj"],
        ty: OptionType::Bool,
        description: "0/1: Pass quadratic objective terms to the solver. \
                      If 0, they are replaced by auxiliary variables. \
                      Default: whatever the solver accepts.",
    },
    OptionInfo {
        name: "cvt:quadcon",
        aliases: &["passquadcon"],
        ty: OptionType::Bool,
        description: "0/1: Pass quadratic constraints to the solver. \
                      Default: whatever the solver accepts.",
    },
    OptionInfo {
        name: "cvt:socp",
        aliases: &["passsocp"],
        ty: OptionType::Bool,
        description: "0/1: Recognize second-order cones among quadratic constraints \
                      and pass them as cones. Default: whatever the solver accepts.",
    },
    OptionInfo {
        name: "alg:relax",
        aliases: &["relax"],
        ty: OptionType::Bool,
        description: "0*/1: Whether to relax integrality of variables.",
    },
    OptionInfo {
        name: "cvt:mip:bigM",
        aliases: &["cvt:bigM", "cvt:bigm"],
        ty: OptionType::Double,
        description: "Default value of big-M for linearization of logical constraints. \
                      Not used by default. Use with care.",
    },
    OptionInfo {
        name: "cvt:mip:eps",
        aliases: &["cvt:cmp:eps"],
        ty: OptionType::Double,
        description: "Tolerance for strict comparisons when linearizing them (default 1e-6).",
    },
    OptionInfo {
        name: "cvt:plapprox:domain",
        aliases: &["plapprox:domain"],
        ty: OptionType::Double,
        description: "Bound used for unbounded arguments of piecewise-linear functions \
                      (default 1e6).",
    },
    OptionInfo {
        name: "cvt:infinity",
        aliases: &["infinity"],
        ty: OptionType::Double,
        description: "Bounds with magnitude at least this value are infinite (default 1e20).",
    },
    OptionInfo {
        name: "tech:writegraph",
        aliases: &["writegraph", "exportgraph"],
        ty: OptionType::Str,
        description: "File to export the conversion graph to, one JSON object per line.",
    },
];

/// Configuration of the flat converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Enable constant folding, bound and context propagation (`cvt:pre:all`)
    pub preprocess_anything: bool,
    /// Fix reified equality results from body bounds (`cvt:pre:eqresult`)
    pub preprocess_equality_result: bool,
    /// Reuse binaries for `b == 0/1` comparisons (`cvt:pre:eqbinary`)
    pub preprocess_equality_binary: bool,
    /// Pass quadratic objectives (`cvt:quadobj`); `None` follows the target
    pub pass_quad_obj: Option<bool>,
    /// Pass quadratic constraints (`cvt:quadcon`); `None` follows the target
    pub pass_quad_con: Option<bool>,
    /// Recognize and pass quadratic cones (`cvt:socp`); `None` follows the target
    pub pass_socp_cones: Option<bool>,
    /// Relax integrality before pushing the model (`alg:relax`)
    pub relax_integrality: bool,
    /// Default big-M for indicator linearization (`cvt:mip:bigM`)
    pub big_m_default: Option<f64>,
    /// Strict comparison tolerance (`cvt:mip:eps`)
    pub comparison_eps: f64,
    /// Domain bound for unbounded piecewise-linear arguments (`cvt:plapprox:domain`)
    pub pl_domain_bound: f64,
    /// Practical infinity (`cvt:infinity`)
    pub infinity: f64,
    /// Conversion graph export path (`tech:writegraph`)
    pub graph_export_file: Option<PathBuf>,
    /// Acceptance overrides keyed by kind option name (`acc:<name>`)
    pub acceptance_overrides: BTreeMap<String, AcceptanceLevel>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            preprocess_anything: true,
            preprocess_equality_result: true,
            preprocess_equality_binary: true,
            pass_quad_obj: None,
            pass_quad_con: None,
            pass_socp_cones: None,
            relax_integrality: false,
            big_m_default: None,
            comparison_eps: 1e-6,
            pl_domain_bound: 1e6,
            infinity: 1e20,
            graph_export_file: None,
            acceptance_overrides: BTreeMap::new(),
        }
    }
}

impl ConverterConfig {
    /// Configuration that linearizes quadratic terms and cones.
    #[must_use]
    pub fn linear_only() -> Self {
        Self {
            pass_quad_obj: Some(false),
            pass_quad_con: Some(false),
            pass_socp_cones: Some(false),
            ..Self::default()
        }
    }

    /// Configuration with preprocessing disabled.
    #[must_use]
    pub fn no_preprocessing() -> Self {
        Self {
            preprocess_anything: false,
            preprocess_equality_result: false,
            preprocess_equality_binary: false,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| FlatError::invalid_option("<json>", e.to_string()))
    }

    /// All named options except the `acc:` family.
    pub fn option_descriptions() -> &'static [OptionInfo] {
        OPTIONS
    }

    /// Resolve an option name or alias to its description.
    pub fn find_option(name: &str) -> Option<&'static OptionInfo> {
        OPTIONS
            .iter()
            .find(|o| o.name == name || o.aliases.contains(&name))
    }

    /// Whether `x` is practically infinite.
    pub fn is_infinite(&self, x: f64) -> bool {
        x.abs() >= self.infinity
    }

    /// Big-M to use when no finite bound is known.
    pub fn big_m(&self) -> Option<f64> {
        self.big_m_default.filter(|m| *m > 0.0)
    }

    /// Acceptance override for a kind option name, e.g. `"indle"`.
    pub fn acceptance_override(&self, kind_option: &str) -> Option<AcceptanceLevel> {
        self.acceptance_overrides.get(kind_option).copied()
    }

    /// Set a named option from its textual value.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        if let Some(kind) = name.strip_prefix("acc:") {
            if kind.is_empty() {
                return Err(FlatError::invalid_option(name, "missing constraint kind"));
            }
            let level = parse_int(name, value)?;
            let level = AcceptanceLevel::from_level(level)
                .ok_or_else(|| FlatError::invalid_option(name, "expected 0, 1 or 2"))?;
            self.acceptance_overrides.insert(kind.to_string(), level);
            return Ok(());
        }

        let info =
            Self::find_option(name).ok_or_else(|| FlatError::invalid_option(name, "unknown option"))?;
        match info.name {
            "cvt:pre:all" => self.preprocess_anything = parse_bool(name, value)?,
            "cvt:pre:eqresult" => self.preprocess_equality_result = parse_bool(name, value)?,
            "cvt:pre:eqbinary" => self.preprocess_equality_binary = parse_bool(name, value)?,
            "cvt:quadobj" => self.pass_quad_obj = Some(parse_bool(name, value)?),
            "cvt:quadcon" => self.pass_quad_con = Some(parse_bool(name, value)?),
            "cvt:socp" => self.pass_socp_cones = Some(parse_bool(name, value)?),
            "alg:relax" => self.relax_integrality = parse_bool(name, value)?,
            "cvt:mip:bigM" => {
                let m = parse_double(name, value)?;
                self.big_m_default = (m > 0.0).then_some(m);
            }
            "cvt:mip:eps" => {
                let eps = parse_double(name, value)?;
                if eps < 0.0 {
                    return Err(FlatError::invalid_option(name, "must be non-negative"));
                }
                self.comparison_eps = eps;
            }
            "cvt:plapprox:domain" => self.pl_domain_bound = parse_positive(name, value)?,
            "cvt:infinity" => self.infinity = parse_positive(name, value)?,
            "tech:writegraph" => {
                let path = value.trim();
                self.graph_export_file = (!path.is_empty()).then(|| PathBuf::from(path));
            }
            other => return Err(FlatError::invalid_option(other, "option is not settable")),
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(FlatError::invalid_option(
            name,
            format!("expected 0 or 1, got '{other}'"),
        )),
    }
}

fn parse_int(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| FlatError::invalid_option(name, format!("expected an integer, got '{value}'")))
}

fn parse_double(name: &str, value: &str) -> Result<f64> {
    let v = value
        .trim()
        .parse::<f64>()
        .map_err(|_| FlatError::invalid_option(name, format!("expected a number, got '{value}'")))?;
    if v.is_nan() {
        return Err(FlatError::invalid_option(name, "NaN is not allowed"));
    }
    Ok(v)
}

fn parse_positive(name: &str, value: &str) -> Result<f64> {
    let v = parse_double(name, value)?;
    if v <= 0.0 {
        return Err(FlatError::invalid_option(name, "must be positive"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert!(config.preprocess_anything);
        assert_eq!(config.pass_quad_obj, None);
        assert_eq!(config.big_m(), None);
        assert!(config.is_infinite(1e20));
        assert!(!config.is_infinite(1e19));
    }

    #[test]
    fn test_set_option_by_alias() {
        let mut config = ConverterConfig::default();
        config.set_option("passquadobj", "0").unwrap();
        config.set_option("cvt:bigM", "1e4").unwrap();
        config.set_option("relax", "1").unwrap();
        assert_eq!(config.pass_quad_obj, Some(false));
        assert_eq!(config.big_m(), Some(1e4));
        assert!(config.relax_integrality);
    }

    #[test]
    fn test_non_positive_big_m_disables_it() {
        let mut config = ConverterConfig::default();
        config.set_option("cvt:mip:bigM", "-1").unwrap();
        assert_eq!(config.big_m(), None);
    }

    #[test]
    fn test_acceptance_override() {
        let mut config = ConverterConfig::default();
        config.set_option("acc:indle", "2").unwrap();
        assert_eq!(
            config.acceptance_override("indle"),
            Some(AcceptanceLevel::Recommended)
        );
        assert!(config.set_option("acc:indle", "3").is_err());
        assert!(config.set_option("acc:", "1").is_err());
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut config = ConverterConfig::default();
        let err = config.set_option("cvt:nonsense", "1").unwrap_err();
        assert!(matches!(err, FlatError::InvalidOption { .. }));
        assert!(config.set_option("alg:relax", "maybe").is_err());
    }

    #[test]
    fn test_writegraph_path() {
        let mut config = ConverterConfig::default();
        config.set_option("writegraph", "graph.jsonl").unwrap();
        assert_eq!(config.graph_export_file, Some(PathBuf::from("graph.jsonl")));
        config.set_option("tech:writegraph", "").unwrap();
        assert_eq!(config.graph_export_file, None);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ConverterConfig::from_json(r#"{"relax_integrality": true}"#).unwrap();
        assert!(config.relax_integrality);
        assert!(config.preprocess_anything);
    }

    #[test]
    fn test_acceptance_level_roundtrip_values() {
        for level in 0..3 {
            let acc = AcceptanceLevel::from_level(level).unwrap();
            assert_eq!(acc.level(), level);
        }
        assert!(AcceptanceLevel::Recommended > AcceptanceLevel::AcceptedButNotRecommended);
        assert!(!AcceptanceLevel::NotAccepted.is_accepted());
    }
}
