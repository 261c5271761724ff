//! Exact overlap area between two cells.

use super::cell::Cell;
use geo::{Area, BooleanOps, Intersects};
use std::panic::{self, AssertUnwindSafe};

/// Outcome of intersecting one pair of cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlap {
    /// Interiors do not meet (touching edges or corners included).
    Disjoint,
    /// Positive, finite intersection area.
    Area(f64),
    /// Intersection area came back NaN or infinite.
    NonFinite(f64),
    /// The boolean operation itself failed.
    Failed,
}

/// Intersect two cells and measure the result.
///
/// Boxes are compared first so candidates that only share an envelope edge
/// skip the polygon clipper. A panic inside the clipper is confined to this
/// pair and reported as [`Overlap::Failed`].
pub fn overlap(a: &Cell, b: &Cell) -> Overlap {
    let (Some(ba), Some(bb)) = (a.bbox(), b.bbox()) else {
        return Overlap::Disjoint;
    };
    if !ba.intersects(&bb) {
        return Overlap::Disjoint;
    }
    let clipped = panic::catch_unwind(AssertUnwindSafe(|| {
        a.geometry().intersection(b.geometry()).unsigned_area()
    }));
    match clipped {
        Err(_) => Overlap::Failed,
        Ok(area) if !area.is_finite() => Overlap::NonFinite(area),
        Ok(area) if area > 0.0 => Overlap::Area(area),
        Ok(_) => Overlap::Disjoint,
    }
}
