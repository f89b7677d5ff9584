//! Error types shared by the mpflat crates.
//!
//! Programming-contract violations (wrong argument counts, casts of the
//! wrong kind, under-filled builders) are not represented here: they panic.
//! Everything in [`FlatError`] is a condition a caller can report to the
//! user of a model.

use thiserror::Error;

/// Error raised while building, converting or mapping a flat model.
#[derive(Error, Debug)]
pub enum FlatError {
    /// Bound narrowing or propagation proved the model infeasible.
    #[error("model is infeasible: {0}")]
    Infeasible(String),

    /// A constraint kind is neither accepted by the target nor convertible.
    #[error(
        "Constraint type '{constraint}' is neither accepted by '{target}', \
         nor is conversion implemented"
    )]
    Unsupported {
        /// Display name of the constraint or expression kind
        constraint: String,
        /// Name of the target solver
        target: String,
    },

    /// A converter could not apply its reformulation.
    #[error("{key}: {message}")]
    ConversionFailure {
        /// Short identifier of the failure, usable as a warning key
        key: String,
        /// Explanation including possible remedies
        message: String,
    },

    /// A with-map keeper received a value that is already stored.
    #[error("internal error: duplicate map entry for {0}")]
    DuplicateMapEntry(String),

    /// An option name or value was rejected.
    #[error("option '{name}': {reason}")]
    InvalidOption {
        /// Option name as given
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// An operation was called in a state that does not allow it.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Writing the conversion graph failed.
    #[error("graph export failed: {0}")]
    GraphExport(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mpflat operations.
pub type Result<T> = std::result::Result<T, FlatError>;

impl FlatError {
    /// Create an infeasibility error.
    pub fn infeasible(message: impl Into<String>) -> Self {
        FlatError::Infeasible(message.into())
    }

    /// Create an unsupported-construct error.
    pub fn unsupported(constraint: impl Into<String>, target: impl Into<String>) -> Self {
        FlatError::Unsupported {
            constraint: constraint.into(),
            target: target.into(),
        }
    }

    /// Create a conversion failure with a key and remediation text.
    pub fn conversion_failure(key: impl Into<String>, message: impl Into<String>) -> Self {
        FlatError::ConversionFailure {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-option error.
    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FlatError::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        FlatError::InvalidOperation(message.into())
    }

    /// Check if this error reports model infeasibility.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, FlatError::Infeasible(_))
    }

    /// Check if this error is a recoverable conversion failure.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, FlatError::ConversionFailure { .. })
    }

    /// Check if this error reports an unsupported construct.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, FlatError::Unsupported { .. })
    }

    /// Key of a conversion failure, if this is one.
    pub fn failure_key(&self) -> Option<&str> {
        match self {
            FlatError::ConversionFailure { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FlatError {
    fn from(err: serde_json::Error) -> Self {
        FlatError::GraphExport(err.to_string())
    }
}
