//! Spatial weights derived from a neighbor graph
//!
//! A [`SpatialWeights`] value is an immutable sparse N×N matrix: each row
//! lists the unit's neighbors and their weights under a normalization
//! [`WeightStyle`]. The [`ZeroPolicy`] decides, once at construction, what
//! happens to units without neighbors.
//!
//! A new value is built whenever the neighbor definition changes; nothing
//! downstream mutates it.

mod style;

pub use style::{WeightStyle, ZeroPolicy};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use arealstat_core::{Error, Result};

use crate::neighbors::NeighborGraph;

/// Weight-matrix moments used by Moran's I inference (Cliff & Ord 1981)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightMoments {
    /// Σ_i Σ_j w_ij
    pub s0: f64,
    /// ½ Σ_i Σ_j (w_ij + w_ji)²
    pub s1: f64,
    /// Σ_i (w_i. + w_.i)²
    pub s2: f64,
}

/// Normalized sparse spatial weights
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialWeights {
    style: WeightStyle,
    zero_policy: ZeroPolicy,
    neighbors: Vec<Vec<usize>>,
    weights: Vec<Vec<f64>>,
    isolated: Vec<usize>,
}

impl SpatialWeights {
    /// Derive weights from `graph` under `style`.
    ///
    /// # Errors
    /// `Error::IsolatedUnit` naming the first unit without neighbors when
    /// `zero_policy` is [`ZeroPolicy::Reject`].
    pub fn new(graph: &NeighborGraph, style: WeightStyle, zero_policy: ZeroPolicy) -> Result<Self> {
        let isolated = graph.isolated();
        if let Some(&unit) = isolated.first() {
            match zero_policy {
                ZeroPolicy::Reject => return Err(Error::IsolatedUnit { unit }),
                ZeroPolicy::Allow => warn!(
                    count = isolated.len(),
                    units = ?isolated,
                    "units without neighbors get all-zero weight rows"
                ),
            }
        }

        let neighbors: Vec<Vec<usize>> = graph.iter().map(<[usize]>::to_vec).collect();
        let n_eff = (neighbors.len() - isolated.len()) as f64;
        let n_links = graph.n_links() as f64;

        let weights: Vec<Vec<f64>> = match style {
            WeightStyle::Binary => neighbors.iter().map(|nb| vec![1.0; nb.len()]).collect(),
            WeightStyle::RowStandardized => neighbors
                .iter()
                .map(|nb| vec![1.0 / nb.len() as f64; nb.len()])
                .collect(),
            WeightStyle::GlobalStandardized => neighbors
                .iter()
                .map(|nb| vec![n_eff / n_links; nb.len()])
                .collect(),
            WeightStyle::UnitSum => neighbors
                .iter()
                .map(|nb| vec![1.0 / n_links; nb.len()])
                .collect(),
            WeightStyle::VarianceStabilizing => {
                // Rows scaled by 1/sqrt(k_i), then all weights rescaled to sum to n
                let total: f64 = neighbors.iter().map(|nb| (nb.len() as f64).sqrt()).sum();
                neighbors
                    .iter()
                    .map(|nb| {
                        let w = n_eff / (total * (nb.len() as f64).sqrt());
                        vec![w; nb.len()]
                    })
                    .collect()
            }
        };

        Ok(Self {
            style,
            zero_policy,
            neighbors,
            weights,
            isolated,
        })
    }

    /// Row-standardized weights rejecting isolated units
    pub fn row_standardized(graph: &NeighborGraph) -> Result<Self> {
        Self::new(graph, WeightStyle::RowStandardized, ZeroPolicy::Reject)
    }

    /// Number of units (matrix order N)
    pub fn n_units(&self) -> usize {
        self.neighbors.len()
    }

    pub fn style(&self) -> WeightStyle {
        self.style
    }

    pub fn zero_policy(&self) -> ZeroPolicy {
        self.zero_policy
    }

    /// Units whose rows are all zero
    pub fn isolated(&self) -> &[usize] {
        &self.isolated
    }

    /// Neighbor indices of row `i`, sorted ascending
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// Non-zero entries of row `i` as `(neighbor, weight)`
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.neighbors[i]
            .iter()
            .copied()
            .zip(self.weights[i].iter().copied())
    }

    /// Weight `w_ij` (0 when `j` is not a neighbor of `i`)
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.neighbors
            .get(i)
            .and_then(|nb| nb.binary_search(&j).ok().map(|k| self.weights[i][k]))
            .unwrap_or(0.0)
    }

    /// Total number of non-zero weights
    pub fn n_links(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w.iter().sum()).collect()
    }

    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_units()];
        for i in 0..self.n_units() {
            for (j, w) in self.row(i) {
                sums[j] += w;
            }
        }
        sums
    }

    /// Dense N×N copy for inspection
    pub fn to_dense(&self) -> Array2<f64> {
        let n = self.n_units();
        let mut dense = Array2::zeros((n, n));
        for i in 0..n {
            for (j, w) in self.row(i) {
                dense[(i, j)] = w;
            }
        }
        dense
    }

    /// S0, S1 and S2 of the weight matrix.
    ///
    /// Handles asymmetric matrices (k-nearest graphs): an ordered pair whose
    /// reverse link is absent still contributes to S1 from both directions.
    pub fn moments(&self) -> WeightMoments {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        for i in 0..self.n_units() {
            for (j, w) in self.row(i) {
                s0 += w;
                if self.neighbors[j].binary_search(&i).is_ok() {
                    let sum = w + self.weight(j, i);
                    s1 += sum * sum;
                } else {
                    s1 += 2.0 * w * w;
                }
            }
        }

        let s2 = self
            .row_sums()
            .into_iter()
            .zip(self.col_sums())
            .map(|(r, c)| (r + c) * (r + c))
            .sum();

        WeightMoments {
            s0,
            s1: 0.5 * s1,
            s2,
        }
    }
}
