//! # arealstat Core
//!
//! Core types and traits for areal spatial-autocorrelation analysis.
//!
//! This crate provides:
//! - `ArealUnit` / `ArealUnits`: labelled polygons with numeric attributes
//! - Geometry validation for polygon boundaries
//! - The shared error taxonomy
//! - Algorithm traits for consistent API

pub mod error;
pub mod geometry;
pub mod units;

pub use error::{Error, Result};
pub use units::{ArealUnit, ArealUnits, UnitRecord};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::units::{ArealUnit, ArealUnits};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in arealstat.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
