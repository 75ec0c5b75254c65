//! Error handling and error types for the VFL leakage toolkit.
//!
//! Every fallible operation in the crate returns [`Result`], built on the
//! single [`LeakageError`] enum. Numerical instability is deliberately *not*
//! represented here: non-finite gains or weights propagate as values.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum LeakageError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Tree construction errors reported by a split-search collaborator
    #[error("Tree construction error: {message}")]
    TreeConstruction { message: String },

    /// Structural violation detected by an explicit validation pass
    #[error("Tree structure error: {message}")]
    Structure { message: String },

    /// Thread pool construction errors
    #[error("Threading error: {message}")]
    Threading { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// An ensemble without any estimator was handed to an operation that
    /// needs at least one tree
    #[error("Ensemble has no estimators")]
    EmptyEnsemble,

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Type alias for Results using LeakageError
pub type Result<T> = std::result::Result<T, LeakageError>;

impl LeakageError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        LeakageError::Config {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        LeakageError::Training {
            message: message.into(),
        }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        LeakageError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a structural violation error
    pub fn structure<S: Into<String>>(message: S) -> Self {
        LeakageError::Structure {
            message: message.into(),
        }
    }

    /// Create a threading error
    pub fn threading<S: Into<String>>(message: S) -> Self {
        LeakageError::Threading {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        LeakageError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        LeakageError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        LeakageError::IndexOutOfBounds { index, length }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            LeakageError::Config { .. } => "config",
            LeakageError::Training { .. } => "training",
            LeakageError::TreeConstruction { .. } => "tree_construction",
            LeakageError::Structure { .. } => "structure",
            LeakageError::Threading { .. } => "threading",
            LeakageError::InvalidParameter { .. } => "invalid_parameter",
            LeakageError::DimensionMismatch { .. } => "dimension_mismatch",
            LeakageError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            LeakageError::EmptyEnsemble => "empty_ensemble",
            LeakageError::IO { .. } => "io",
            LeakageError::Json { .. } => "json",
        }
    }

    /// Configuration-class errors are raised before any work starts and are
    /// never worth retrying with the same input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LeakageError::Config { .. }
                | LeakageError::InvalidParameter { .. }
                | LeakageError::DimensionMismatch { .. }
                | LeakageError::EmptyEnsemble
        )
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::LeakageError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::LeakageError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! training_error {
    ($msg:expr) => {
        $crate::core::error::LeakageError::training($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::LeakageError::training(format!($fmt, $($arg)*))
    };
}
