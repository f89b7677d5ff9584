//! Conversion statistics and the final report.

use mpflat_core::WarningLog;
use std::fmt;

/// Counters gathered during one model conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Constraints replaced by a converter
    pub converted: usize,
    /// Constraints passed to the target as they are
    pub kept: usize,
    /// Variables created by the converter, input variables excluded
    pub vars_created: usize,
    /// Requests for a fixed variable served from the cache
    pub fixed_var_hits: usize,
    /// Functional constraints served from a keeper map
    pub map_hits: usize,
    /// Defining constraints deleted because their result became unused
    pub init_exprs_eliminated: usize,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "converted={} kept={} vars_created={} fixed_var_hits={} map_hits={} eliminated={}",
            self.converted,
            self.kept,
            self.vars_created,
            self.fixed_var_hits,
            self.map_hits,
            self.init_exprs_eliminated
        )
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Counters
    pub stats: ConversionStats,
    /// Warnings accumulated during conversion
    pub warnings: WarningLog,
    /// Records written to the graph export, if enabled
    pub graph_records: Option<usize>,
}
