//! Areal units: labelled polygons with numeric attributes
//!
//! An [`ArealUnit`] is one observation of an areal analysis (a county, a
//! tract). Its 0-based position inside [`ArealUnits`] is its identifier and
//! is the index used by neighbor graphs, weights and attribute vectors.

use geo_types::{Coord, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::geometry;

/// A single areal unit
#[derive(Debug, Clone)]
pub struct ArealUnit {
    /// Human-readable label used for reporting
    pub label: String,
    /// Boundary geometry, required for contiguity neighbors
    pub geometry: Option<MultiPolygon<f64>>,
    /// Representative point; derived from `geometry` when absent
    pub centroid: Option<Coord<f64>>,
    /// Numeric attributes keyed by name
    pub attributes: HashMap<String, f64>,
}

impl ArealUnit {
    /// Create a unit bounded by `geometry`
    pub fn new(label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            label: label.into(),
            geometry: Some(geometry),
            centroid: None,
            attributes: HashMap::new(),
        }
    }

    /// Create a unit known only by its centroid
    pub fn from_centroid(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            geometry: None,
            centroid: Some(Coord { x, y }),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: f64) {
        self.attributes.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }
}

/// Inspection record for one unit, suitable for tabular output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: usize,
    pub label: String,
    pub centroid: Option<(f64, f64)>,
}

/// Ordered, fixed collection of areal units
#[derive(Debug, Clone, Default)]
pub struct ArealUnits {
    units: Vec<ArealUnit>,
}

impl ArealUnits {
    pub fn new(units: Vec<ArealUnit>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&ArealUnit> {
        self.units.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArealUnit> {
        self.units.iter()
    }

    /// Unit labels in index order
    pub fn labels(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.label.as_str()).collect()
    }

    /// Extract the attribute vector `key`, indexed 1:1 with the units.
    ///
    /// Every unit must carry the attribute; otherwise the result would not
    /// line up with the unit indices.
    pub fn attribute(&self, key: &str) -> Result<Vec<f64>> {
        let values: Vec<f64> = self.units.iter().filter_map(|u| u.attribute(key)).collect();
        if values.len() != self.units.len() {
            return Err(Error::DimensionMismatch {
                expected: self.units.len(),
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Validated boundary geometry of every unit
    pub fn geometries(&self) -> Result<Vec<MultiPolygon<f64>>> {
        self.units
            .iter()
            .enumerate()
            .map(|(id, u)| {
                let g = u
                    .geometry
                    .as_ref()
                    .ok_or_else(|| Error::Geometry(format!("unit {id} ({}) has no geometry", u.label)))?;
                geometry::validate_multipolygon(id, g)?;
                Ok(g.clone())
            })
            .collect()
    }

    /// Centroid of every unit, explicit or derived from its geometry
    pub fn centroids(&self) -> Result<Vec<Coord<f64>>> {
        self.units
            .iter()
            .enumerate()
            .map(|(id, u)| {
                let c = match (u.centroid, u.geometry.as_ref()) {
                    (Some(c), _) => c,
                    (None, Some(g)) => {
                        geometry::validate_multipolygon(id, g)?;
                        geometry::centroid(g).ok_or_else(|| {
                            Error::Geometry(format!("unit {id}: centroid is undefined"))
                        })?
                    }
                    (None, None) => {
                        return Err(Error::Geometry(format!(
                            "unit {id} ({}) has neither geometry nor centroid",
                            u.label
                        )))
                    }
                };
                geometry::validate_coord(id, c)?;
                Ok(c)
            })
            .collect()
    }

    /// Per-unit inspection records
    pub fn records(&self) -> Vec<UnitRecord> {
        self.units
            .iter()
            .enumerate()
            .map(|(id, u)| UnitRecord {
                id,
                label: u.label.clone(),
                centroid: u
                    .centroid
                    .or_else(|| u.geometry.as_ref().and_then(geometry::centroid))
                    .map(|c| (c.x, c.y)),
            })
            .collect()
    }
}

impl FromIterator<ArealUnit> for ArealUnits {
    fn from_iter<I: IntoIterator<Item = ArealUnit>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ArealUnits {
    type Item = ArealUnit;
    type IntoIter = std::vec::IntoIter<ArealUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}
