//! Polygon contiguity neighbors (queen / rook)
//!
//! Two units are queen neighbors when their boundaries share at least one
//! point, and rook neighbors when they share a boundary segment of positive
//! length. Floating-point coordinates of neighboring polygons rarely
//! coincide exactly, so both tests use a snap distance: a vertex within
//! `snap` of the other boundary counts as shared.
//!
//! Candidate pairs are pruned with a sort-and-sweep over bounding boxes
//! expanded by `snap`, so only units whose envelopes overlap are compared
//! segment by segment.

use geo::{Distance, Euclidean};
use geo_types::{Coord, Line, MultiPolygon, Point, Rect};
use tracing::debug;

use arealstat_core::geometry::{expanded_bounds, validate_multipolygon};
use arealstat_core::{Error, Result};

use super::NeighborGraph;

/// Contiguity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Contiguity {
    /// Shared boundary point
    #[default]
    Queen,
    /// Shared boundary edge
    Rook,
}

/// Parameters for contiguity neighbors
#[derive(Debug, Clone)]
pub struct ContiguityParams {
    pub criterion: Contiguity,
    /// Distance under which two boundary points are considered the same
    /// (default: sqrt(f64::EPSILON) ≈ 1.49e-8, in coordinate units)
    pub snap: f64,
}

impl Default for ContiguityParams {
    fn default() -> Self {
        Self {
            criterion: Contiguity::Queen,
            snap: f64::EPSILON.sqrt(),
        }
    }
}

impl ContiguityParams {
    pub fn queen() -> Self {
        Self::default()
    }

    pub fn rook() -> Self {
        Self {
            criterion: Contiguity::Rook,
            ..Self::default()
        }
    }
}

/// Boundary of one unit prepared for pairwise tests
struct Boundary {
    segments: Vec<Line<f64>>,
    bounds: Rect<f64>,
}

impl Boundary {
    fn new(unit: usize, geometry: &MultiPolygon<f64>, snap: f64) -> Result<Self> {
        validate_multipolygon(unit, geometry)?;
        let segments = geometry
            .0
            .iter()
            .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
            .flat_map(|ring| ring.lines())
            .filter(|line| line.start != line.end)
            .collect();
        let bounds = expanded_bounds(geometry, snap)
            .ok_or_else(|| Error::Geometry(format!("unit {unit}: geometry has no extent")))?;
        Ok(Self { segments, bounds })
    }

    fn vertices(&self) -> impl Iterator<Item = Coord<f64>> + '_ {
        self.segments.iter().map(|s| s.start)
    }
}

/// Build a contiguity neighbor graph from unit boundaries.
///
/// A unit touching no other unit gets an empty neighbor list; that is not an
/// error at this stage.
///
/// # Errors
/// - `Error::Geometry` for degenerate polygons
/// - `Error::Configuration` for a negative or non-finite `snap`
pub fn contiguity(polygons: &[MultiPolygon<f64>], params: ContiguityParams) -> Result<NeighborGraph> {
    let snap = params.snap;
    if !snap.is_finite() || snap < 0.0 {
        return Err(Error::config("snap", snap, "must be finite and non-negative"));
    }

    let boundaries: Vec<Boundary> = polygons
        .iter()
        .enumerate()
        .map(|(unit, g)| Boundary::new(unit, g, snap))
        .collect::<Result<_>>()?;

    let mut order: Vec<usize> = (0..boundaries.len()).collect();
    order.sort_by(|&a, &b| boundaries[a].bounds.min().x.total_cmp(&boundaries[b].bounds.min().x));

    let mut lists = vec![Vec::new(); boundaries.len()];
    let mut candidates = 0usize;

    for (pos, &i) in order.iter().enumerate() {
        let bi = &boundaries[i];
        for &j in &order[pos + 1..] {
            let bj = &boundaries[j];
            if bj.bounds.min().x > bi.bounds.max().x {
                break;
            }
            if bj.bounds.min().y > bi.bounds.max().y || bj.bounds.max().y < bi.bounds.min().y {
                continue;
            }
            candidates += 1;
            let touching = match params.criterion {
                Contiguity::Queen => shares_point(bi, bj, snap),
                Contiguity::Rook => shares_edge(bi, bj, snap),
            };
            if touching {
                lists[i].push(j);
                lists[j].push(i);
            }
        }
    }

    debug!(
        units = boundaries.len(),
        candidates,
        criterion = ?params.criterion,
        "contiguity neighbors built"
    );

    Ok(NeighborGraph::from_sets(lists))
}

fn shares_point(a: &Boundary, b: &Boundary, snap: f64) -> bool {
    let touches = |from: &Boundary, to: &Boundary| {
        from.vertices().any(|p| {
            let p = Point::from(p);
            to.segments
                .iter()
                .any(|line| Euclidean::distance(&p, line) <= snap)
        })
    };
    touches(a, b) || touches(b, a)
}

fn shares_edge(a: &Boundary, b: &Boundary, snap: f64) -> bool {
    a.segments.iter().any(|sa| {
        b.segments
            .iter()
            .any(|sb| collinear_overlap(sa, sb, snap) > snap)
    })
}

/// Length over which `b` runs along `a`, or 0 if they are not collinear
/// within `snap`.
///
/// Exact collinearity never holds for independently digitized boundaries,
/// so both endpoints of `b` only need to lie within `snap` of the line
/// through `a`.
fn collinear_overlap(a: &Line<f64>, b: &Line<f64>, snap: f64) -> f64 {
    let dir = a.delta();
    let len = dir.x.hypot(dir.y);
    if len == 0.0 {
        return 0.0;
    }
    let u = Coord {
        x: dir.x / len,
        y: dir.y / len,
    };
    let offset = |p: Coord<f64>| {
        let v = p - a.start;
        (v.x * u.y - v.y * u.x).abs()
    };
    if offset(b.start) > snap || offset(b.end) > snap {
        return 0.0;
    }
    let project = |p: Coord<f64>| {
        let v = p - a.start;
        v.x * u.x + v.y * u.y
    };
    let (t0, t1) = (project(b.start), project(b.end));
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(len);
    (hi - lo).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arealstat_core::geometry::square;
    use geo_types::{LineString, Polygon};

    /// `size`×`size` lattice of unit squares, row-major
    fn lattice(size: usize) -> Vec<MultiPolygon<f64>> {
        (0..size * size)
            .map(|k| square((k % size) as f64, (k / size) as f64, 1.0))
            .collect()
    }

    #[test]
    fn test_queen_lattice() {
        let g = contiguity(&lattice(3), ContiguityParams::queen()).unwrap();
        assert_eq!(g.neighbors(0), &[1, 3, 4]);
        assert_eq!(g.neighbors(4), &[0, 1, 2, 3, 5, 6, 7, 8]);
        assert!(g.is_symmetric());
    }

    #[test]
    fn test_rook_lattice() {
        let g = contiguity(&lattice(3), ContiguityParams::rook()).unwrap();
        assert_eq!(g.neighbors(0), &[1, 3]);
        assert_eq!(g.neighbors(4), &[1, 3, 5, 7]);
    }

    #[test]
    fn test_rook_is_subset_of_queen() {
        let polys = lattice(4);
        let q = contiguity(&polys, ContiguityParams::queen()).unwrap();
        let r = contiguity(&polys, ContiguityParams::rook()).unwrap();
        for i in 0..polys.len() {
            assert!(r.neighbors(i).iter().all(|&j| q.contains(i, j)));
        }
    }

    #[test]
    fn test_snap_absorbs_coordinate_noise() {
        let polys = vec![square(0.0, 0.0, 1.0), square(1.0 + 1e-10, 0.0, 1.0)];
        let g = contiguity(&polys, ContiguityParams::rook()).unwrap();
        assert_eq!(g.neighbors(0), &[1]);

        let strict = ContiguityParams {
            criterion: Contiguity::Rook,
            snap: 0.0,
        };
        let g = contiguity(&polys, strict).unwrap();
        assert!(g.neighbors(0).is_empty());
    }

    #[test]
    fn test_t_junction() {
        // Wide cell below two narrow cells; the narrow cells' shared corner
        // lies in the middle of the wide cell's top edge, which has no
        // vertex there.
        let wide = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        )]);
        let polys = vec![wide, square(0.0, 1.0, 1.0), square(1.0, 1.0, 1.0)];
        for params in [ContiguityParams::queen(), ContiguityParams::rook()] {
            let g = contiguity(&polys, params).unwrap();
            assert_eq!(g.neighbors(0), &[1, 2]);
            assert_eq!(g.neighbors(1), &[0, 2]);
        }
    }

    #[test]
    fn test_disjoint_unit_is_isolated() {
        let polys = vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(10.0, 10.0, 1.0)];
        let g = contiguity(&polys, ContiguityParams::queen()).unwrap();
        assert_eq!(g.isolated(), vec![2]);
    }

    #[test]
    fn test_degenerate_polygon_is_geometry_error() {
        let bad = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]),
            vec![],
        )]);
        let err = contiguity(&[square(0.0, 0.0, 1.0), bad], ContiguityParams::queen()).unwrap_err();
        assert!(matches!(err, Error::Geometry(ref m) if m.contains("unit 1")));
    }

    #[test]
    fn test_negative_snap_rejected() {
        let params = ContiguityParams {
            snap: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            contiguity(&lattice(2), params),
            Err(Error::Configuration { name: "snap", .. })
        ));
    }

    #[test]
    fn test_collinear_overlap_length() {
        let a = Line::new((0.0, 0.0), (2.0, 0.0));
        let b = Line::new((3.0, 0.0), (1.0, 0.0));
        assert!((collinear_overlap(&a, &b, 1e-9) - 1.0).abs() < 1e-12);
        let c = Line::new((0.0, 0.5), (2.0, 0.5));
        assert_eq!(collinear_overlap(&a, &c, 1e-9), 0.0);
        // within snap of the line through `a`
        let d = Line::new((0.5, 1e-10), (1.5, -1e-10));
        assert!((collinear_overlap(&a, &d, 1e-9) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_near_segment_interior_is_queen_contact() {
        // Right square's corner sits 1e-10 off the left square's edge
        let left = square(0.0, 0.0, 2.0);
        let right = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (2.0 + 1e-10, 1.0),
                (3.0, 1.0),
                (3.0, 2.5),
                (2.0 + 1e-10, 2.5),
                (2.0 + 1e-10, 1.0),
            ]),
            vec![],
        )]);
        let loose = ContiguityParams { snap: 1e-9, ..ContiguityParams::queen() };
        let strict = ContiguityParams { snap: 1e-11, ..ContiguityParams::queen() };
        assert_eq!(contiguity(&[left.clone(), right.clone()], loose).unwrap().n_links(), 2);
        assert_eq!(contiguity(&[left, right], strict).unwrap().n_links(), 0);
    }
}
