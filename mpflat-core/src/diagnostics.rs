//! Warning collection for model conversion.
//!
//! Conversions that succeed with an approximation or a dropped item record a
//! keyed warning instead of failing. Repeated warnings with the same key are
//! folded into one entry with a count, and the log is reported once the
//! model build finishes.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A keyed diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Short key identifying the kind of message
    pub key: String,
    /// First message recorded under this key
    pub message: String,
    /// Additional notes
    pub notes: Vec<String>,
    /// How many times the key was reported
    pub count: usize,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(severity: Severity, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            key: key.into(),
            message: message.into(),
            notes: Vec::new(),
            count: 1,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, key, message)
    }

    /// Create an info diagnostic.
    pub fn info(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, key, message)
    }

    /// Add a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.key, self.message)?;
        if self.count > 1 {
            write!(f, " ({} times)", self.count)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Ordered log of diagnostics, folded by key.
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    entries: Vec<Diagnostic>,
    by_key: FxHashMap<String, usize>,
}

impl WarningLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. A repeated key only increments its count.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::warning(key, message));
    }

    /// Record a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        if let Some(&i) = self.by_key.get(&diag.key) {
            self.entries[i].count += diag.count;
            return;
        }
        self.by_key.insert(diag.key.clone(), self.entries.len());
        self.entries.push(diag);
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry for a key.
    pub fn get(&self, key: &str) -> Option<&Diagnostic> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// Iterate over entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Consume the log into its entries.
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Multi-line summary, empty when there is nothing to report.
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("WARNINGS:");
        for entry in &self.entries {
            out.push_str("\n  ");
            out.push_str(&entry.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_log_folds_keys() {
        let mut log = WarningLog::new();
        log.add("PLApprox", "piecewise-linear approximation used");
        log.add("PLApprox", "second message is not kept");
        log.add("RangeFree", "free range row dropped");

        assert_eq!(log.len(), 2);
        let pl = log.get("PLApprox").unwrap();
        assert_eq!(pl.count, 2);
        assert_eq!(pl.message, "piecewise-linear approximation used");
    }

    #[test]
    fn test_summary_lists_entries() {
        let mut log = WarningLog::new();
        assert!(log.summary().is_empty());
        log.add("A", "first");
        log.add("A", "first");
        let summary = log.summary();
        assert!(summary.starts_with("WARNINGS:"));
        assert!(summary.contains("[A]: first (2 times)"));
    }

    #[test]
    fn test_diagnostic_display_with_note() {
        let d = Diagnostic::info("Relax", "integrality relaxed").with_note("alg:relax=1");
        let text = d.to_string();
        assert!(text.starts_with("info [Relax]"));
        assert!(text.contains("note: alg:relax=1"));
    }
}
