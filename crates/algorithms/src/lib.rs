//! # arealstat Algorithms
//!
//! Global spatial autocorrelation for areal data.
//!
//! ## Pipeline
//!
//! ```text
//! polygons / centroids ──► NeighborGraph ──► SpatialWeights ──► lag, Moran's I
//!                                                              └─► analytic / permutation test
//! ```
//!
//! - **neighbors**: queen/rook contiguity, distance band, k-nearest
//! - **weights**: B, W, C, U, S normalization styles and the zero-neighbor policy
//! - **statistics**: spatial lag, Moran's I and its significance
//!
//! ## Features
//!
//! - `parallel` (default): permutation trials run on the rayon thread pool

pub mod neighbors;
pub mod statistics;
pub mod weights;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::neighbors::{
        contiguity, distance_band, k_nearest, Contiguity, ContiguityParams, DistanceBandParams,
        GraphSummary, NeighborGraph,
    };
    pub use crate::statistics::{
        moran, moran_permutation_test, moran_regression, moran_test, morans_i, spatial_lag,
        Alternative, AnalyticParams, Assumption, CancelToken, MoranParams, MoranResult,
        MoranStatistic, PermutationParams,
    };
    pub use crate::weights::{SpatialWeights, WeightMoments, WeightStyle, ZeroPolicy};
    pub use arealstat_core::prelude::*;
}
