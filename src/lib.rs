//! # mesh-regrid
//!
//! mesh-regrid transfers scalar fields between two polygon meshes by
//! area-weighted overlap. A source field defined on one tessellation (grid
//! cells, census tracts, administrative units) is aggregated onto another
//! by intersecting every target cell with the source cells it overlaps.
//!
//! ## Features
//! - R-tree index over source cell bounding boxes ([`algs::spatial_index`])
//! - Mean (target-area) and sum (source-area) aggregation modes
//! - Bounded-parallel evaluation on a dedicated Rayon pool, with cooperative
//!   cancellation
//! - A sparse `(source, target, fraction)` mapping that can be cached as CSV
//!   and applied to many value vectors without redoing any geometry
//! - Per-cell diagnostics for degenerate or failing geometry
//!
//! ## Determinism
//!
//! Per-target work is collected in target order and each target accumulates
//! its sources in ascending index order. Results do not depend on the worker
//! count, and the direct and cached paths agree bit for bit.
//!
//! ## Usage
//! ```
//! use mesh_regrid::prelude::*;
//! use geo::{Rect, coord};
//!
//! let source = rectilinear_grid(&[0.5, 1.5], &[0.5, 1.5])?;
//! let target = Mesh::from_rects([Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 })]);
//! let cfg = RegridConfig::default().with_mode(AggregationMode::Sum);
//! let run = regrid_direct(&source, &[3.0, 4.0, 5.0, 6.0], &target, &cfg)?;
//! assert!((run.values[0] - 7.0).abs() < 1e-9);
//! # Ok::<(), MeshRegridError>(())
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used types & functions:
pub mod prelude {
    pub use crate::algs::apply::{apply_mapping, apply_mapping_to_len};
    pub use crate::algs::parallel::{CancelToken, Executor};
    pub use crate::algs::regrid::{
        DirectRun, MappingRun, Regridder, apply_mapping_file, compute_mapping,
        create_mapping_file, regrid_direct,
    };
    pub use crate::algs::spatial_index::{CellIndexParams, SourceIndex};
    pub use crate::config::{AggregationMode, RegridConfig};
    pub use crate::data::mapping::{
        CellDefect, Diagnostics, IntersectionRecord, MeshSide, SparseMapping,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::cell::{Cell, GeometryDefect, Mesh};
    pub use crate::geometry::grid::rectilinear_grid;
    pub use crate::io::mapping_csv::{
        load_mapping, load_mapping_file, save_mapping, save_mapping_file,
    };
    pub use crate::io::values_csv::{
        read_values, read_values_file, write_target_values, write_target_values_file,
    };
    pub use crate::mesh_error::MeshRegridError;
}
