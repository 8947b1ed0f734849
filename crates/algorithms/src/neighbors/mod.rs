//! Spatial neighbor graphs
//!
//! Adjacency relations over N areal units:
//! - **contiguity**: shared boundary point (queen) or shared edge (rook)
//! - **distance band**: centroids within an annulus `[lower, upper]`
//! - **k-nearest**: each unit's k closest centroids
//!
//! Every unit has an entry, possibly empty (isolated unit). Neighbor lists
//! are sorted ascending and never contain the unit itself.

mod contiguity;
mod distance;
pub mod kdtree;

pub use contiguity::{contiguity, Contiguity, ContiguityParams};
pub use distance::{distance_band, k_nearest, DistanceBandParams};
pub use kdtree::KdTree;

use serde::{Deserialize, Serialize};
use std::fmt;

use arealstat_core::{Error, Result};

/// Adjacency relation over spatial units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborGraph {
    neighbors: Vec<Vec<usize>>,
}

impl NeighborGraph {
    /// Normalize builder output: sort and deduplicate each list.
    pub(crate) fn from_sets(mut neighbors: Vec<Vec<usize>>) -> Self {
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self { neighbors }
    }

    /// Build a graph from externally supplied adjacency lists.
    ///
    /// Lists are sorted and deduplicated. Out-of-range indices and
    /// self-loops are rejected.
    pub fn from_lists(lists: Vec<Vec<usize>>) -> Result<Self> {
        let n = lists.len();
        for (i, list) in lists.iter().enumerate() {
            for &j in list {
                if j >= n {
                    return Err(Error::config(
                        "neighbors",
                        format!("{i} -> {j}"),
                        format!("index out of range for {n} units"),
                    ));
                }
                if j == i {
                    return Err(Error::config("neighbors", format!("{i} -> {j}"), "self-loop"));
                }
            }
        }
        Ok(Self::from_sets(lists))
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Neighbors of unit `i`, sorted ascending.
    ///
    /// # Panics
    /// If `i` is out of range.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.neighbors.iter().map(Vec::as_slice)
    }

    /// Neighbor count per unit
    pub fn cardinalities(&self) -> Vec<usize> {
        self.neighbors.iter().map(Vec::len).collect()
    }

    /// Total number of directed links
    pub fn n_links(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    /// Units with no neighbors
    pub fn isolated(&self) -> Vec<usize> {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(_, list)| list.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// True if `j` is a neighbor of `i`.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.neighbors
            .get(i)
            .is_some_and(|list| list.binary_search(&j).is_ok())
    }

    /// True if every link `i -> j` has a matching `j -> i`.
    pub fn is_symmetric(&self) -> bool {
        self.neighbors
            .iter()
            .enumerate()
            .all(|(i, list)| list.iter().all(|&j| self.contains(j, i)))
    }

    /// Graph with every link mirrored (`i -> j` implies `j -> i`).
    pub fn symmetrize(&self) -> Self {
        let mut lists = self.neighbors.clone();
        for (i, list) in self.neighbors.iter().enumerate() {
            for &j in list {
                lists[j].push(i);
            }
        }
        Self::from_sets(lists)
    }

    /// Summary statistics for inspection
    pub fn summary(&self) -> GraphSummary {
        let cards = self.cardinalities();
        let n = self.len();
        let n_links = self.n_links();
        GraphSummary {
            n_units: n,
            n_links,
            percent_nonzero: if n == 0 {
                0.0
            } else {
                100.0 * n_links as f64 / (n * n) as f64
            },
            mean_neighbors: if n == 0 { 0.0 } else { n_links as f64 / n as f64 },
            min_neighbors: cards.iter().copied().min().unwrap_or(0),
            max_neighbors: cards.iter().copied().max().unwrap_or(0),
            isolated: self.isolated(),
        }
    }
}

/// Neighbor graph statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub n_units: usize,
    pub n_links: usize,
    /// Share of the N×N matrix that is non-zero, in percent
    pub percent_nonzero: f64,
    pub mean_neighbors: f64,
    pub min_neighbors: usize,
    pub max_neighbors: usize,
    pub isolated: Vec<usize>,
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of units: {}", self.n_units)?;
        writeln!(f, "Number of nonzero links: {}", self.n_links)?;
        writeln!(f, "Percentage nonzero weights: {:.4}", self.percent_nonzero)?;
        writeln!(f, "Average number of links: {:.4}", self.mean_neighbors)?;
        write!(
            f,
            "Links per unit: min {}, max {}",
            self.min_neighbors, self.max_neighbors
        )?;
        if !self.isolated.is_empty() {
            write!(f, "\n{} units with no links: {:?}", self.isolated.len(), self.isolated)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path3() -> NeighborGraph {
        NeighborGraph::from_lists(vec![vec![1], vec![2, 0, 0], vec![1]]).unwrap()
    }

    #[test]
    fn test_from_lists_sorts_and_dedups() {
        let g = path3();
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.cardinalities(), vec![1, 2, 1]);
        assert_eq!(g.n_links(), 4);
        assert!(g.is_symmetric());
    }

    #[test]
    fn test_from_lists_rejects_self_loop() {
        let err = NeighborGraph::from_lists(vec![vec![0]]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_from_lists_rejects_out_of_range() {
        assert!(NeighborGraph::from_lists(vec![vec![3], vec![]]).is_err());
    }

    #[test]
    fn test_isolated_and_summary() {
        let g = NeighborGraph::from_lists(vec![vec![1], vec![0], vec![]]).unwrap();
        assert_eq!(g.isolated(), vec![2]);
        let s = g.summary();
        assert_eq!(s.n_units, 3);
        assert_eq!(s.n_links, 2);
        assert_eq!(s.min_neighbors, 0);
        assert_eq!(s.max_neighbors, 1);
        assert!(s.to_string().contains("1 units with no links: [2]"));
    }

    #[test]
    fn test_symmetrize() {
        let g = NeighborGraph::from_lists(vec![vec![1], vec![], vec![0]]).unwrap();
        assert!(!g.is_symmetric());
        let s = g.symmetrize();
        assert!(s.is_symmetric());
        assert_eq!(s.neighbors(0), &[1, 2]);
        assert_eq!(s.neighbors(1), &[0]);
    }
}
