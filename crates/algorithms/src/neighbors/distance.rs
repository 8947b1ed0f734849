//! Distance-based neighbors over unit centroids
//!
//! - **distance band**: `lower <= d <= upper` (lower bound optionally exclusive)
//! - **k-nearest**: the `k` closest other centroids
//!
//! Both query a [`KdTree`] instead of testing all N² pairs.

use geo_types::Coord;
use tracing::debug;

use arealstat_core::geometry::validate_coord;
use arealstat_core::{Error, Result};

use super::kdtree::KdTree;
use super::NeighborGraph;

/// Parameters for distance-band neighbors
#[derive(Debug, Clone)]
pub struct DistanceBandParams {
    /// Inner radius (default: 0.0)
    pub lower: f64,
    /// Outer radius, always inclusive
    pub upper: f64,
    /// Whether a distance equal to `lower` qualifies (default: true).
    ///
    /// Inclusive keeps coincident centroids (distance 0) as neighbors, so
    /// `lower = 0` gives exactly the disk of radius `upper`. Set to false
    /// for the exclusive band `lower < d <= upper`.
    pub include_lower: bool,
}

impl Default for DistanceBandParams {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
            include_lower: true,
        }
    }
}

impl DistanceBandParams {
    /// Annulus `[lower, upper]`
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            include_lower: true,
        }
    }

    /// Disk of radius `upper`
    pub fn disk(upper: f64) -> Self {
        Self::new(0.0, upper)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("lower", self.lower), ("upper", self.upper)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(name, value, "radius must be finite and non-negative"));
            }
        }
        if self.lower > self.upper {
            return Err(Error::config(
                "lower",
                self.lower,
                format!("exceeds upper radius {}", self.upper),
            ));
        }
        Ok(())
    }

    fn admits(&self, distance_sq: f64) -> bool {
        let lower_sq = self.lower * self.lower;
        if self.include_lower {
            distance_sq >= lower_sq
        } else {
            distance_sq > lower_sq
        }
    }
}

fn validate_centroids(centroids: &[Coord<f64>]) -> Result<()> {
    centroids
        .iter()
        .enumerate()
        .try_for_each(|(unit, &c)| validate_coord(unit, c))
}

/// Build a distance-band neighbor graph from unit centroids.
///
/// Units `i != j` are neighbors iff `lower <= dist(i, j) <= upper`
/// (`lower < dist` when `include_lower` is false). The relation is
/// symmetric. Units with no centroid inside the band are isolated.
///
/// # Errors
/// - `Error::Configuration` for negative or non-finite radii, or `lower > upper`
/// - `Error::Geometry` for non-finite coordinates
pub fn distance_band(centroids: &[Coord<f64>], params: DistanceBandParams) -> Result<NeighborGraph> {
    params.validate()?;
    validate_centroids(centroids)?;

    let tree = KdTree::build(centroids);
    let lists: Vec<Vec<usize>> = centroids
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            tree.within_radius(c, params.upper)
                .into_iter()
                .filter(|hit| hit.index != i && params.admits(hit.distance_sq))
                .map(|hit| hit.index)
                .collect()
        })
        .collect();

    let graph = NeighborGraph::from_sets(lists);
    debug!(
        units = graph.len(),
        links = graph.n_links(),
        lower = params.lower,
        upper = params.upper,
        "distance-band neighbors built"
    );
    Ok(graph)
}

/// Build a k-nearest-neighbor graph from unit centroids.
///
/// Each unit gets exactly `k` neighbors; equidistant candidates are ranked
/// by unit index. The relation is not symmetric in general; use
/// [`NeighborGraph::symmetrize`] when a symmetric graph is needed.
///
/// # Errors
/// - `Error::Configuration` if `k == 0` or `k >= centroids.len()`
/// - `Error::Geometry` for non-finite coordinates
pub fn k_nearest(centroids: &[Coord<f64>], k: usize) -> Result<NeighborGraph> {
    if k == 0 || k >= centroids.len() {
        return Err(Error::config(
            "k",
            k,
            format!("must be in 1..{} for {} units", centroids.len(), centroids.len()),
        ));
    }
    validate_centroids(centroids)?;

    let tree = KdTree::build(centroids);
    let lists = centroids
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            tree.k_nearest(c, k + 1)
                .into_iter()
                .filter(|hit| hit.index != i)
                .take(k)
                .map(|hit| hit.index)
                .collect()
        })
        .collect();

    Ok(NeighborGraph::from_sets(lists))
}
