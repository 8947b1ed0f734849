//! Spatial lag
//!
//! `lag[i] = Σ_j w_ij x_j`: with row-standardized weights, the mean of the
//! attribute over unit i's neighbors. Isolated units (all-zero rows) lag
//! to 0.

use arealstat_core::{Error, Result};

use crate::weights::SpatialWeights;

pub(crate) fn check_len(weights: &SpatialWeights, attribute: &[f64]) -> Result<()> {
    if attribute.len() != weights.n_units() {
        return Err(Error::DimensionMismatch {
            expected: weights.n_units(),
            actual: attribute.len(),
        });
    }
    Ok(())
}

/// Sparse matrix-vector product without length checks
pub(crate) fn lag_unchecked(weights: &SpatialWeights, attribute: &[f64]) -> Vec<f64> {
    (0..weights.n_units())
        .map(|i| weights.row(i).map(|(j, w)| w * attribute[j]).sum())
        .collect()
}

/// Spatially lagged attribute vector.
///
/// # Errors
/// `Error::DimensionMismatch` if `attribute.len()` differs from the number
/// of units in `weights`.
pub fn spatial_lag(weights: &SpatialWeights, attribute: &[f64]) -> Result<Vec<f64>> {
    check_len(weights, attribute)?;
    Ok(lag_unchecked(weights, attribute))
}
