//! Regular rectilinear grids built from cell-centre coordinates.
//!
//! Gridded model output (e.g. NetCDF variables on `(lat, lon)`) is stored
//! row-major with latitude outermost. [`rectilinear_grid`] produces cells in
//! that same order so a flattened data slab lines up with the mesh by index.

use super::cell::Mesh;
use crate::mesh_error::MeshRegridError;
use geo::{Rect, coord};

/// Spacing of a regular axis, measured between two interior centres.
///
/// The first and last centres of gridded products are sometimes shifted
/// (polar half-cells, wrapped longitudes), so they are not used.
pub fn axis_spacing(axis: &[f64], name: &str) -> Result<f64, MeshRegridError> {
    if axis.len() < 2 {
        return Err(MeshRegridError::InvalidGrid(format!(
            "{name} axis needs at least 2 centres, got {}",
            axis.len()
        )));
    }
    if let Some(bad) = axis.iter().find(|v| !v.is_finite()) {
        return Err(MeshRegridError::InvalidGrid(format!(
            "{name} axis contains non-finite centre {bad}"
        )));
    }
    let mid = axis.len() / 2;
    let spacing = (axis[mid] - axis[mid - 1]).abs();
    if spacing == 0.0 {
        return Err(MeshRegridError::InvalidGrid(format!(
            "{name} axis has zero spacing at index {mid}"
        )));
    }
    Ok(spacing)
}

/// Build a mesh of `lats.len() * lons.len()` rectangles centred on the
/// given coordinates, latitude-major.
pub fn rectilinear_grid(lons: &[f64], lats: &[f64]) -> Result<Mesh, MeshRegridError> {
    let dx = axis_spacing(lons, "longitude")?;
    let dy = axis_spacing(lats, "latitude")?;
    let (hx, hy) = (dx / 2.0, dy / 2.0);
    let rects = lats.iter().flat_map(|&lat| {
        lons.iter().map(move |&lon| {
            Rect::new(
                coord! { x: lon - hx, y: lat - hy },
                coord! { x: lon + hx, y: lat + hy },
            )
        })
    });
    Ok(Mesh::from_rects(rects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_latitude_major() {
        let mesh = rectilinear_grid(&[0.5, 1.5, 2.5], &[10.5, 11.5]).unwrap();
        assert_eq!(mesh.len(), 6);
        // second row, first column
        let bbox = mesh.get(3).unwrap().bbox().unwrap();
        assert_eq!(bbox.min(), coord! { x: 0.0, y: 11.0 });
        assert_eq!(bbox.max(), coord! { x: 1.0, y: 12.0 });
        for cell in &mesh {
            assert!((cell.area() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn descending_latitudes_are_accepted() {
        let mesh = rectilinear_grid(&[0.0, 2.0], &[45.0, 44.0, 43.0]).unwrap();
        assert_eq!(mesh.len(), 6);
        assert!((mesh.total_area() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn bad_axes_are_rejected() {
        assert!(matches!(
            rectilinear_grid(&[0.0], &[0.0, 1.0]),
            Err(MeshRegridError::InvalidGrid(_))
        ));
        assert!(matches!(
            rectilinear_grid(&[0.0, 0.0], &[0.0, 1.0]),
            Err(MeshRegridError::InvalidGrid(_))
        ));
        assert!(matches!(
            rectilinear_grid(&[0.0, f64::NAN, 2.0], &[0.0, 1.0]),
            Err(MeshRegridError::InvalidGrid(_))
        ));
    }
}
