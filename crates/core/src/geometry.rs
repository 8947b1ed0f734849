//! Geometry validation and helpers for areal units
//!
//! Polygons are accepted as `geo-types` values. Validation rejects geometry
//! that cannot bound an area: fewer than three distinct exterior vertices,
//! zero area, or non-finite coordinates.

use geo::{Area, BoundingRect, Centroid};
use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};

use crate::error::{Error, Result};

/// Check that a coordinate is finite.
pub fn validate_coord(unit: usize, c: Coord<f64>) -> Result<()> {
    if c.x.is_finite() && c.y.is_finite() {
        Ok(())
    } else {
        Err(Error::Geometry(format!(
            "unit {unit}: non-finite coordinate ({}, {})",
            c.x, c.y
        )))
    }
}

/// Number of distinct vertices in a ring, ignoring the closing vertex and
/// consecutive duplicates.
fn distinct_vertices(ring: &LineString<f64>) -> usize {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords.dedup();
    coords.len()
}

/// Validate a single polygon belonging to `unit`.
pub fn validate_polygon(unit: usize, polygon: &Polygon<f64>) -> Result<()> {
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        for &c in ring.0.iter() {
            validate_coord(unit, c)?;
        }
    }

    let vertices = distinct_vertices(polygon.exterior());
    if vertices < 3 {
        return Err(Error::Geometry(format!(
            "unit {unit}: polygon has {vertices} distinct vertices, need at least 3"
        )));
    }

    if polygon.unsigned_area() <= 0.0 {
        return Err(Error::Geometry(format!("unit {unit}: polygon has zero area")));
    }

    Ok(())
}

/// Validate the (multi)polygon boundary of `unit`.
pub fn validate_multipolygon(unit: usize, geometry: &MultiPolygon<f64>) -> Result<()> {
    if geometry.0.is_empty() {
        return Err(Error::Geometry(format!("unit {unit}: empty geometry")));
    }
    geometry
        .0
        .iter()
        .try_for_each(|polygon| validate_polygon(unit, polygon))
}

/// Area-weighted centroid of a unit's geometry.
pub fn centroid(geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    geometry.centroid().map(|p| p.0)
}

/// Bounding rectangle of a unit's geometry, expanded by `margin` on all sides.
pub fn expanded_bounds(geometry: &MultiPolygon<f64>, margin: f64) -> Option<Rect<f64>> {
    geometry.bounding_rect().map(|r| {
        Rect::new(
            Coord {
                x: r.min().x - margin,
                y: r.min().y - margin,
            },
            Coord {
                x: r.max().x + margin,
                y: r.max().y + margin,
            },
        )
    })
}

/// Axis-aligned square polygon with lower-left corner `(x, y)` and side `size`.
///
/// Convenience for building regular lattices of areal units.
pub fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![Polygon::new(
        LineString::from(vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]),
        vec![],
    )])
}
