#![allow(dead_code)]
use geo::{Rect, coord};
use mesh_regrid::geometry::cell::Mesh;
use std::path::PathBuf;

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
    Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
}

/// `nx * ny` rectangles of size `dx * dy` starting at `(x0, y0)`, row-major.
pub fn grid(nx: usize, ny: usize, x0: f64, y0: f64, dx: f64, dy: f64) -> Mesh {
    Mesh::from_rects((0..ny).flat_map(|j| {
        (0..nx).map(move |i| {
            let x = x0 + i as f64 * dx;
            let y = y0 + j as f64 * dy;
            rect(x, y, x + dx, y + dy)
        })
    }))
}

/// Relative closeness with an absolute floor for values near zero.
pub fn assert_close(got: f64, want: f64, tol: f64) {
    let scale = want.abs().max(1.0);
    assert!(
        (got - want).abs() <= tol * scale,
        "got {got}, want {want} (tol {tol})"
    );
}

/// A path in the system temp dir unique to this process and `name`.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mesh-regrid-{}-{name}", std::process::id()))
}
