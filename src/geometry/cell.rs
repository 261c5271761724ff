//! Mesh cells with cached area and bounding box.
//!
//! A cell's identity is its position in its [`Mesh`]. Cells whose geometry
//! cannot yield a usable area stay in place (so later indices do not shift)
//! but report a [`GeometryDefect`] and never take part in an overlap.

use crate::mesh_error::MeshRegridError;
use geo::{Area, BoundingRect, MultiPolygon, Rect};
use thiserror::Error;

/// Why a cell, or a pair of cells, produced no intersection records.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryDefect {
    #[error("geometry is empty")]
    Empty,
    #[error("area is not finite ({0})")]
    NonFiniteArea(f64),
    #[error("area is not positive ({0})")]
    NonPositiveArea(f64),
    /// The geometry library could not intersect the pair.
    #[error("polygon intersection with source cell {source_index} failed")]
    IntersectionFailed { source_index: usize },
    #[error("overlap with source cell {source_index} has non-finite area ({area})")]
    NonFiniteOverlap { source_index: usize, area: f64 },
}

/// An immutable polygonal cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    geometry: MultiPolygon<f64>,
    area: f64,
    bbox: Option<Rect<f64>>,
}

impl Cell {
    /// Wrap a geometry, computing its area and bounding box once.
    pub fn new(geometry: impl Into<MultiPolygon<f64>>) -> Self {
        let geometry = geometry.into();
        let area = geometry.unsigned_area();
        let bbox = geometry.bounding_rect();
        Self {
            geometry,
            area,
            bbox,
        }
    }

    #[inline]
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Cached unsigned area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Cached bounding box; `None` for empty geometry.
    #[inline]
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    /// Reason this cell cannot take part in an overlap, if any.
    pub fn defect(&self) -> Option<GeometryDefect> {
        if self.bbox.is_none() {
            Some(GeometryDefect::Empty)
        } else if !self.area.is_finite() {
            Some(GeometryDefect::NonFiniteArea(self.area))
        } else if self.area <= 0.0 {
            Some(GeometryDefect::NonPositiveArea(self.area))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.defect().is_none()
    }
}

/// An ordered, read-only sequence of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    cells: Vec<Cell>,
}

impl Mesh {
    pub fn new<I, G>(geometries: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<MultiPolygon<f64>>,
    {
        geometries.into_iter().map(Cell::new).collect()
    }

    /// Build a mesh of axis-aligned rectangles.
    pub fn from_rects<I>(rects: I) -> Self
    where
        I: IntoIterator<Item = Rect<f64>>,
    {
        rects.into_iter().map(|r| Cell::new(r.to_polygon())).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Sum of the areas of all usable cells.
    pub fn total_area(&self) -> f64 {
        self.cells
            .iter()
            .filter(|c| c.is_valid())
            .map(Cell::area)
            .sum()
    }

    /// Every defective cell with its index.
    pub fn defects(&self) -> Vec<(usize, GeometryDefect)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.defect().map(|d| (i, d)))
            .collect()
    }

    /// Fail unless `values` has exactly one entry per cell.
    pub fn check_values(&self, mesh: &'static str, values: &[f64]) -> Result<(), MeshRegridError> {
        if values.len() != self.cells.len() {
            return Err(MeshRegridError::LengthMismatch {
                mesh,
                cells: self.cells.len(),
                values: values.len(),
            });
        }
        Ok(())
    }
}

impl FromIterator<Cell> for Mesh {
    fn from_iter<T: IntoIterator<Item = Cell>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Mesh {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}
