//! 2D k-d tree over unit centroids
//!
//! Radius and k-nearest queries used by the distance-band and k-nearest
//! neighbor builders, replacing O(n²) pairwise distance checks.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo_types::Coord;

/// A 2D k-d tree over centroid coordinates.
///
/// Results report the position of the point in the slice the tree was
/// built from, so they map directly to unit indices.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<Coord<f64>>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// A point found by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub distance_sq: f64,
}

impl Eq for Hit {}

impl Ord for Hit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Hit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl KdTree {
    /// Build a k-d tree with median-of-coordinate splitting, O(n log² n).
    pub fn build(points: &[Coord<f64>]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        if !points.is_empty() {
            let mut indices: Vec<usize> = (0..points.len()).collect();
            build_recursive(points, &mut indices, 0, &mut nodes);
        }
        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points with `distance <= radius` from `q`, in no particular order.
    ///
    /// A zero radius still returns points coincident with `q`.
    pub fn within_radius(&self, q: Coord<f64>, radius: f64) -> Vec<Hit> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() || radius < 0.0 {
            return hits;
        }
        self.radius_recursive(0, q, radius * radius, &mut hits);
        hits
    }

    /// The `k` nearest points to `q`, sorted by ascending distance.
    ///
    /// Ties are broken by point index so results are deterministic.
    pub fn k_nearest(&self, q: Coord<f64>, k: usize) -> Vec<Hit> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }
        // Max-heap holding the current best k
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(0, q, k, &mut heap);
        heap.into_sorted_vec()
    }

    fn radius_recursive(&self, node_idx: usize, q: Coord<f64>, radius_sq: f64, hits: &mut Vec<Hit>) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];

        let dx = q.x - p.x;
        let dy = q.y - p.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq <= radius_sq {
            hits.push(Hit {
                index: node.point_idx,
                distance_sq: dist_sq,
            });
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        // Points equal on the split axis may sit on either side
        if let Some(left) = node.left {
            if diff < 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(left, q, radius_sq, hits);
            }
        }
        if let Some(right) = node.right {
            if diff > 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(right, q, radius_sq, hits);
            }
        }
    }

    fn knn_recursive(&self, node_idx: usize, q: Coord<f64>, k: usize, heap: &mut BinaryHeap<Hit>) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];

        let dx = q.x - p.x;
        let dy = q.y - p.y;
        let hit = Hit {
            index: node.point_idx,
            distance_sq: dx * dx + dy * dy,
        };

        if heap.len() < k {
            heap.push(hit);
        } else if heap.peek().is_some_and(|worst| hit < *worst) {
            heap.pop();
            heap.push(hit);
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.knn_recursive(child, q, k, heap);
        }

        let threshold = if heap.len() >= k {
            heap.peek().map_or(f64::INFINITY, |h| h.distance_sq)
        } else {
            f64::INFINITY
        };
        // `<=` keeps equal-distance candidates on the far side reachable for tie-breaking
        if diff * diff <= threshold {
            if let Some(child) = second {
                self.knn_recursive(child, q, k, heap);
            }
        }
    }
}

fn build_recursive(points: &[Coord<f64>], indices: &mut [usize], depth: usize, nodes: &mut Vec<KdNode>) -> usize {
    let split_dim = (depth % 2) as u8;
    let key = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };
    indices.sort_by(|&a, &b| key(a).total_cmp(&key(b)));

    let median = indices.len() / 2;
    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_dim,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];

    if !left.is_empty() {
        let child = build_recursive(points, left, depth + 1, nodes);
        nodes[node_idx].left = Some(child);
    }
    if !right.is_empty() {
        let child = build_recursive(points, right, depth + 1, nodes);
        nodes[node_idx].right = Some(child);
    }

    node_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn sample_points() -> Vec<Coord<f64>> {
        vec![
            c(2.0, 3.0),
            c(5.0, 4.0),
            c(9.0, 6.0),
            c(4.0, 7.0),
            c(8.0, 1.0),
            c(7.0, 2.0),
            c(1.0, 8.0),
            c(6.0, 5.0),
        ]
    }

    fn dist_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
        (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert!(tree.k_nearest(c(0.0, 0.0), 3).is_empty());
        assert!(tree.within_radius(c(0.0, 0.0), 10.0).is_empty());
    }

    #[test]
    fn test_within_radius_matches_brute_force() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);
        for &q in &pts {
            for radius in [0.0, 1.5, 2.0, 3.5, 20.0] {
                let mut got: Vec<usize> = tree.within_radius(q, radius).iter().map(|h| h.index).collect();
                got.sort_unstable();
                let expected: Vec<usize> = (0..pts.len())
                    .filter(|&i| dist_sq(pts[i], q) <= radius * radius)
                    .collect();
                assert_eq!(got, expected, "query {:?} radius {}", q, radius);
            }
        }
    }

    #[test]
    fn test_zero_radius_finds_coincident_points() {
        let pts = vec![c(1.0, 1.0), c(1.0, 1.0), c(2.0, 2.0)];
        let tree = KdTree::build(&pts);
        assert_eq!(tree.within_radius(c(1.0, 1.0), 0.0).len(), 2);
    }

    #[test]
    fn test_k_nearest_sorted_and_correct() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);
        let q = c(5.0, 5.0);
        let results = tree.k_nearest(q, 3);
        assert_eq!(results.len(), 3);

        let mut bf: Vec<Hit> = pts
            .iter()
            .enumerate()
            .map(|(index, &p)| Hit { index, distance_sq: dist_sq(p, q) })
            .collect();
        bf.sort();
        assert_eq!(results, bf[..3].to_vec());
    }

    #[test]
    fn test_k_nearest_more_than_points() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);
        assert_eq!(tree.k_nearest(c(5.0, 5.0), 100).len(), pts.len());
    }

    #[test]
    fn test_lattice_matches_brute_force() {
        // Many equal coordinates on each axis
        let pts: Vec<Coord<f64>> = (0..100).map(|i| c((i % 10) as f64, (i / 10) as f64)).collect();
        let tree = KdTree::build(&pts);
        for (qi, &q) in pts.iter().enumerate().step_by(7) {
            let got = tree.within_radius(q, 1.0).len();
            let expected = pts.iter().filter(|&&p| dist_sq(p, q) <= 1.0).count();
            assert_eq!(got, expected, "point {qi}");

            let knn = tree.k_nearest(q, 5);
            let mut bf: Vec<Hit> = pts
                .iter()
                .enumerate()
                .map(|(index, &p)| Hit { index, distance_sq: dist_sq(p, q) })
                .collect();
            bf.sort();
            assert_eq!(knn, bf[..5].to_vec(), "point {qi}");
        }
    }
}
