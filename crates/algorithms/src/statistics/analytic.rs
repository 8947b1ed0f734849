//! Analytic inference for Moran's I
//!
//! Under the null of no spatial autocorrelation I has expectation
//! `E[I] = -1/(n-1)` and a variance that depends on the weight moments
//! S0, S1, S2 and, under randomization, on the sample kurtosis. The z-score
//! is referred to the standard normal distribution.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;

use arealstat_core::{Error, Result};

use super::moran::MoranKernel;
use crate::weights::SpatialWeights;

/// Null-distribution assumption for the variance of I
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Assumption {
    /// Values are a random assignment of the observed values (uses kurtosis)
    #[default]
    Randomization,
    /// Values are independent draws from a normal distribution
    Normality,
}

/// Alternative hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alternative {
    /// Positive autocorrelation: upper tail
    #[default]
    Greater,
    /// Negative autocorrelation: lower tail
    Less,
    TwoSided,
}

impl Alternative {
    /// p-value of a standard-normal `z` under this alternative
    pub fn p_value(&self, z: f64) -> f64 {
        match self {
            Alternative::Greater => upper_tail(z),
            Alternative::Less => upper_tail(-z),
            Alternative::TwoSided => (2.0 * upper_tail(z.abs())).min(1.0),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Alternative::Greater => "greater",
            Alternative::Less => "less",
            Alternative::TwoSided => "two-sided",
        };
        f.write_str(s)
    }
}

impl FromStr for Alternative {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greater" => Ok(Alternative::Greater),
            "less" => Ok(Alternative::Less),
            "two-sided" | "two.sided" | "two_sided" => Ok(Alternative::TwoSided),
            _ => Err(Error::config(
                "alternative",
                s,
                "expected greater, less or two-sided",
            )),
        }
    }
}

/// P(Z > z) for a standard normal Z
fn upper_tail(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// Parameters for the analytic test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticParams {
    pub assumption: Assumption,
    pub alternative: Alternative,
}

/// Result of the analytic Moran's I test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticTest {
    /// Observed Moran's I
    pub statistic: f64,
    /// E[I] under the null
    pub expected: f64,
    /// Var[I] under the null
    pub variance: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub assumption: Assumption,
    pub alternative: Alternative,
}

/// Analytic (normal approximation) test of Moran's I.
///
/// # Errors
/// - Everything [`super::morans_i`] rejects
/// - `Error::DegenerateInput` with fewer than 4 units under randomization,
///   or a non-positive null variance
pub fn moran_test(attribute: &[f64], weights: &SpatialWeights, params: AnalyticParams) -> Result<AnalyticTest> {
    let kernel = MoranKernel::new(attribute, weights)?;
    let n = kernel.n();

    let statistic = kernel.statistic();
    let nf = n as f64;
    let expected = -1.0 / (nf - 1.0);
    let m = weights.moments();
    let s0_sq = m.s0 * m.s0;

    let second_moment = match params.assumption {
        Assumption::Normality => {
            (nf * nf * m.s1 - nf * m.s2 + 3.0 * s0_sq) / (s0_sq * (nf * nf - 1.0))
        }
        Assumption::Randomization => {
            if n < 4 {
                return Err(Error::DegenerateInput(format!(
                    "randomization variance of Moran's I needs at least 4 units, got {n}"
                )));
            }
            let sum_4: f64 = kernel.z.iter().map(|d| d.powi(4)).sum();
            let kurtosis = nf * sum_4 / (kernel.sum_sq * kernel.sum_sq);
            let a = nf * ((nf * nf - 3.0 * nf + 3.0) * m.s1 - nf * m.s2 + 3.0 * s0_sq);
            let b = kurtosis * ((nf * nf - nf) * m.s1 - 2.0 * nf * m.s2 + 6.0 * s0_sq);
            (a - b) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0) * s0_sq)
        }
    };
    let variance = second_moment - expected * expected;

    if variance.is_nan() || variance <= 0.0 {
        return Err(Error::DegenerateInput(format!(
            "null variance of Moran's I is not positive ({variance})"
        )));
    }

    let z_score = (statistic - expected) / variance.sqrt();

    Ok(AnalyticTest {
        statistic,
        expected,
        variance,
        z_score,
        p_value: params.alternative.p_value(z_score),
        assumption: params.assumption,
        alternative: params.alternative,
    })
}
