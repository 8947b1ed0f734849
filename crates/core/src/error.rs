//! Error types for arealstat

use thiserror::Error;

/// Main error type for arealstat operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed or degenerate input geometry
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Invalid parameter, rejected before any computation starts
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    Configuration {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unit {unit} has no neighbors and the zero policy rejects isolated units")]
    IsolatedUnit { unit: usize },

    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Input for which the statistic is undefined (e.g. zero variance)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Computation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for [`Error::Configuration`]
    pub fn config(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::Configuration {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for arealstat operations
pub type Result<T> = std::result::Result<T, Error>;
