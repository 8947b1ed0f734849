//! Global Moran's I
//!
//! Two equivalent routes:
//!
//! ```text
//! closed form:  I = (n / S0) · Σ_i Σ_j w_ij z_i z_j / Σ_i z_i²      z = x - x̄
//! regression:   I = (n / S0) · slope of OLS(lag(z) ~ z)
//! ```
//!
//! With row-standardized weights and no isolated units `n / S0 = 1`, and the
//! regression slope is the slope of the Moran scatterplot of `lag(x)`
//! against `x`.
//!
//! Reference:
//! Cliff, A.D. & Ord, J.K. (1981). Spatial Processes: Models and
//! Applications. Pion, London.

use serde::{Deserialize, Serialize};

use arealstat_core::{Error, Result};

use super::lag::{check_len, lag_unchecked};
use crate::weights::SpatialWeights;

/// Centered attribute and the quantities shared by every evaluation of I
/// on the same (attribute, weights) pair, including permuted evaluations.
#[derive(Debug, Clone)]
pub(crate) struct MoranKernel<'a> {
    weights: &'a SpatialWeights,
    /// Deviations from the mean
    pub(crate) z: Vec<f64>,
    /// Σ z²
    pub(crate) sum_sq: f64,
    /// n / S0
    pub(crate) scale: f64,
}

impl<'a> MoranKernel<'a> {
    /// # Errors
    /// - `Error::DimensionMismatch` on length mismatch
    /// - `Error::DegenerateInput` for non-finite values, a constant
    ///   attribute or weights without any link
    pub(crate) fn new(attribute: &[f64], weights: &'a SpatialWeights) -> Result<Self> {
        check_len(weights, attribute)?;
        let n = attribute.len();
        if n < 2 {
            return Err(Error::DegenerateInput(format!(
                "Moran's I needs at least 2 units, got {n}"
            )));
        }
        if let Some(unit) = attribute.iter().position(|v| !v.is_finite()) {
            return Err(Error::DegenerateInput(format!(
                "non-finite attribute value at unit {unit}"
            )));
        }

        let nf = n as f64;
        let mean = attribute.iter().sum::<f64>() / nf;
        let z: Vec<f64> = attribute.iter().map(|v| v - mean).collect();
        let sum_sq: f64 = z.iter().map(|d| d * d).sum();

        // Standard deviation indistinguishable from rounding noise on the mean;
        // relative to the mean only, so I stays scale-invariant
        let tolerance = 16.0 * f64::EPSILON * mean.abs();
        if sum_sq == 0.0 || (sum_sq / nf).sqrt() <= tolerance {
            return Err(Error::DegenerateInput(
                "attribute has zero variance; Moran's I is undefined".into(),
            ));
        }

        let s0: f64 = weights.row_sums().iter().sum();
        if s0 <= 0.0 {
            return Err(Error::DegenerateInput(
                "spatial weights have no links (S0 = 0)".into(),
            ));
        }

        Ok(Self {
            weights,
            z,
            sum_sq,
            scale: nf / s0,
        })
    }

    pub(crate) fn n(&self) -> usize {
        self.z.len()
    }

    /// I with unit `k` receiving the value of unit `perm[k]`
    pub(crate) fn statistic_permuted(&self, perm: &[usize]) -> f64 {
        let z = &self.z;
        let cross: f64 = (0..self.n())
            .map(|i| {
                let lag: f64 = self.weights.row(i).map(|(j, w)| w * z[perm[j]]).sum();
                z[perm[i]] * lag
            })
            .sum();
        self.scale * cross / self.sum_sq
    }

    /// I on the observed arrangement.
    ///
    /// Shares the arithmetic of [`Self::statistic_permuted`] so that a
    /// permutation reproducing the observed arrangement ties exactly.
    pub(crate) fn statistic(&self) -> f64 {
        let identity: Vec<usize> = (0..self.n()).collect();
        self.statistic_permuted(&identity)
    }
}

/// Moran's I by the closed-form double sum.
///
/// # Errors
/// - `Error::DimensionMismatch` if `attribute.len()` differs from the unit count
/// - `Error::DegenerateInput` if the attribute is constant or non-finite,
///   or the weights carry no links
pub fn morans_i(attribute: &[f64], weights: &SpatialWeights) -> Result<f64> {
    Ok(MoranKernel::new(attribute, weights)?.statistic())
}

/// Moran's I as a regression slope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoranRegression {
    /// OLS slope of `lag(x)` on `x`
    pub slope: f64,
    /// OLS intercept of `lag(x)` on `x`
    pub intercept: f64,
    /// `(n / S0)` × OLS slope of `lag(z)` on `z`; equals Moran's I for any weights
    pub statistic: f64,
}

/// Simple linear regression with intercept, returns (slope, intercept)
fn ols(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            (sxy + (xi - mx) * (yi - my), sxx + (xi - mx) * (xi - mx))
        });
    let slope = sxy / sxx;
    (slope, my - slope * mx)
}

/// Moran's I by ordinary least squares on the Moran scatterplot.
///
/// Fits `lag(x) = a + b·x`, reported as `slope` / `intercept`, and the same
/// fit on the centered attribute scaled by `n / S0`, reported as
/// `statistic`. For row-standardized weights without isolated units
/// `slope == statistic`.
///
/// # Errors
/// Same as [`morans_i`].
pub fn moran_regression(attribute: &[f64], weights: &SpatialWeights) -> Result<MoranRegression> {
    let kernel = MoranKernel::new(attribute, weights)?;

    let (slope, intercept) = ols(attribute, &lag_unchecked(weights, attribute));
    let (centered_slope, _) = ols(&kernel.z, &lag_unchecked(weights, &kernel.z));

    Ok(MoranRegression {
        slope,
        intercept,
        statistic: kernel.scale * centered_slope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::NeighborGraph;
    use crate::weights::{WeightStyle, ZeroPolicy};
    use approx::assert_relative_eq;

    /// Rook lattice graph, row-major
    fn lattice(rows: usize, cols: usize) -> NeighborGraph {
        let lists = (0..rows * cols)
            .map(|k| {
                let (r, c) = (k / cols, k % cols);
                let mut nb = Vec::new();
                if r > 0 {
                    nb.push(k - cols);
                }
                if r + 1 < rows {
                    nb.push(k + cols);
                }
                if c > 0 {
                    nb.push(k - 1);
                }
                if c + 1 < cols {
                    nb.push(k + 1);
                }
                nb
            })
            .collect();
        NeighborGraph::from_lists(lists).unwrap()
    }

    fn checkerboard(rows: usize, cols: usize) -> Vec<f64> {
        (0..rows * cols)
            .map(|k| ((k / cols + k % cols) % 2) as f64)
            .collect()
    }

    #[test]
    fn test_clustered_is_positive() {
        let w = SpatialWeights::row_standardized(&lattice(6, 6)).unwrap();
        let x: Vec<f64> = (0..36).map(|k| if k % 6 < 3 { 0.0 } else { 100.0 }).collect();
        let i = morans_i(&x, &w).unwrap();
        assert!(i > 0.5, "clustered data should give strongly positive I, got {i}");
    }

    #[test]
    fn test_checkerboard_is_minus_one() {
        let w = SpatialWeights::new(&lattice(4, 4), WeightStyle::Binary, ZeroPolicy::Reject).unwrap();
        let i = morans_i(&checkerboard(4, 4), &w).unwrap();
        assert_relative_eq!(i, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hand_computed_path() {
        // Path 0-1-2, binary: S0 = 4, z = (-1, 0, 1), Σz² = 2, Σ w z z = 0
        let g = NeighborGraph::from_lists(vec![vec![1], vec![0, 2], vec![1]]).unwrap();
        let w = SpatialWeights::new(&g, WeightStyle::Binary, ZeroPolicy::Reject).unwrap();
        assert_relative_eq!(morans_i(&[1.0, 2.0, 3.0], &w).unwrap(), 0.0, epsilon = 1e-15);
        // z = (-2/3, 4/3, -2/3): Σ w z z = 4 · (-8/9) = -32/9, Σz² = 24/9
        // I = (3/4) · (-32/9) / (24/9) = -1
        assert_relative_eq!(morans_i(&[0.0, 2.0, 0.0], &w).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regression_matches_closed_form_row_standardized() {
        let w = SpatialWeights::row_standardized(&lattice(5, 4)).unwrap();
        let x: Vec<f64> = (0..20).map(|k| ((k * 7) % 11) as f64 + 0.25 * k as f64).collect();
        let closed = morans_i(&x, &w).unwrap();
        let reg = moran_regression(&x, &w).unwrap();
        assert_relative_eq!(reg.statistic, closed, max_relative = 1e-6);
        assert_relative_eq!(reg.slope, closed, max_relative = 1e-6);
    }

    #[test]
    fn test_regression_matches_closed_form_every_style() {
        let g = NeighborGraph::from_lists(vec![
            vec![1, 2],
            vec![0, 3],
            vec![0, 3, 4],
            vec![1, 2, 5],
            vec![2],
            vec![3],
            vec![],
        ])
        .unwrap();
        let x = [3.0, 1.5, 4.0, 1.0, 5.0, 9.0, 2.5];
        for style in ["B", "W", "C", "U", "S"] {
            let w = SpatialWeights::new(&g, style.parse().unwrap(), ZeroPolicy::Allow).unwrap();
            let closed = morans_i(&x, &w).unwrap();
            let reg = moran_regression(&x, &w).unwrap();
            assert_relative_eq!(reg.statistic, closed, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_scatterplot_intercept() {
        let w = SpatialWeights::row_standardized(&lattice(3, 3)).unwrap();
        let x: Vec<f64> = (0..9).map(|k| k as f64).collect();
        let reg = moran_regression(&x, &w).unwrap();
        let lag = lag_unchecked(&w, &x);
        let mean_x = x.iter().sum::<f64>() / 9.0;
        let mean_lag = lag.iter().sum::<f64>() / 9.0;
        // The fitted line passes through the means
        assert_relative_eq!(reg.intercept + reg.slope * mean_x, mean_lag, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_attribute_is_degenerate() {
        let w = SpatialWeights::row_standardized(&lattice(3, 3)).unwrap();
        for value in [0.0, 0.1, 5.0, 1.0e6] {
            let err = morans_i(&[value; 9], &w).unwrap_err();
            assert!(matches!(err, Error::DegenerateInput(_)), "value {value}");
            assert!(moran_regression(&[value; 9], &w).is_err());
        }
    }

    #[test]
    fn test_small_scale_attribute_is_not_degenerate() {
        let w = SpatialWeights::row_standardized(&lattice(1, 4)).unwrap();
        let x = [1.0, 2.0, 3.0, 4.0];
        let tiny: Vec<f64> = x.iter().map(|v| v * 1e-16).collect();
        let i = morans_i(&x, &w).unwrap();
        assert_relative_eq!(morans_i(&tiny, &w).unwrap(), i, max_relative = 1e-12);
        assert_relative_eq!(i, 0.4, epsilon = 1e-12);

        let alternating = morans_i(&[0.0, 3e-15, 0.0, 3e-15], &w).unwrap();
        assert_relative_eq!(alternating, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_attribute_rejected() {
        let w = SpatialWeights::row_standardized(&lattice(2, 2)).unwrap();
        assert!(matches!(
            morans_i(&[1.0, f64::NAN, 2.0, 3.0], &w),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_no_links_is_degenerate() {
        let g = NeighborGraph::from_lists(vec![vec![], vec![], vec![]]).unwrap();
        let w = SpatialWeights::new(&g, WeightStyle::RowStandardized, ZeroPolicy::Allow).unwrap();
        assert!(matches!(morans_i(&[1.0, 2.0, 3.0], &w), Err(Error::DegenerateInput(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let w = SpatialWeights::row_standardized(&lattice(2, 2)).unwrap();
        assert_eq!(
            morans_i(&[1.0, 2.0], &w).unwrap_err(),
            Error::DimensionMismatch { expected: 4, actual: 2 }
        );
    }

    #[test]
    fn test_permuted_identity_matches_observed() {
        let w = SpatialWeights::row_standardized(&lattice(3, 3)).unwrap();
        let x: Vec<f64> = (0..9).map(|k| (k * k) as f64).collect();
        let kernel = MoranKernel::new(&x, &w).unwrap();
        let identity: Vec<usize> = (0..9).collect();
        assert_eq!(kernel.statistic_permuted(&identity), kernel.statistic());

        // Reversing the values is the same as reversing the lattice
        let reversed: Vec<usize> = (0..9).rev().collect();
        let x_rev: Vec<f64> = reversed.iter().map(|&k| x[k]).collect();
        assert_relative_eq!(
            kernel.statistic_permuted(&reversed),
            morans_i(&x_rev, &w).unwrap(),
            epsilon = 1e-12
        );
    }
}
