//! Spatial lag and global Moran's I
//!
//! - **lag**: `W · x`
//! - **moran**: Moran's I, closed form and regression slope
//! - **analytic**: normal-approximation test (normality or randomization)
//! - **permutation**: Monte Carlo permutation test

pub mod analytic;
pub mod lag;
pub mod moran;
pub mod permutation;

pub use analytic::{moran_test, AnalyticParams, AnalyticTest, Alternative, Assumption};
pub use lag::spatial_lag;
pub use moran::{moran_regression, morans_i, MoranRegression};
pub use permutation::{
    moran_permutation_test, pseudo_p_value, CancelToken, PermutationParams, PermutationTest,
};

use serde::Serialize;

use arealstat_core::{Algorithm, Error, Result};

use crate::weights::SpatialWeights;

/// Parameters for the combined Moran's I analysis
#[derive(Debug, Clone, Default)]
pub struct MoranParams {
    pub analytic: AnalyticParams,
    /// Run a permutation test as well (default: off)
    pub permutation: Option<PermutationParams>,
}

/// Moran's I with its analytic and, optionally, permutation inference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoranResult {
    pub statistic: f64,
    pub expected: f64,
    pub variance: f64,
    pub z_score: f64,
    pub p_value_analytic: f64,
    pub p_value_mc: Option<f64>,
    pub simulated: Option<Vec<f64>>,
    /// Seed of the permutation run, when one was performed
    pub seed: Option<u64>,
}

/// Moran's I with the analytic test and an optional permutation test.
///
/// Both tests see the same observed statistic.
pub fn moran(attribute: &[f64], weights: &SpatialWeights, params: MoranParams) -> Result<MoranResult> {
    let analytic = moran_test(attribute, weights, params.analytic)?;
    let mc = params
        .permutation
        .map(|p| moran_permutation_test(attribute, weights, p))
        .transpose()?;

    Ok(MoranResult {
        statistic: analytic.statistic,
        expected: analytic.expected,
        variance: analytic.variance,
        z_score: analytic.z_score,
        p_value_analytic: analytic.p_value,
        p_value_mc: mc.as_ref().map(|t| t.p_value),
        seed: mc.as_ref().map(|t| t.seed),
        simulated: mc.map(|t| t.simulated),
    })
}

/// Moran's I as an [`Algorithm`] over a fixed set of weights
#[derive(Debug, Clone, Copy)]
pub struct MoranStatistic<'a> {
    pub weights: &'a SpatialWeights,
}

impl<'a> MoranStatistic<'a> {
    pub fn new(weights: &'a SpatialWeights) -> Self {
        Self { weights }
    }
}

impl Algorithm for MoranStatistic<'_> {
    type Input = Vec<f64>;
    type Output = MoranResult;
    type Params = MoranParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Moran's I"
    }

    fn description(&self) -> &'static str {
        "Global Moran's I spatial autocorrelation with analytic and permutation inference"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        moran(&input, self.weights, params)
    }
}
