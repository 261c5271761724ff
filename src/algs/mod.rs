//! Regridding algorithms: indexing, per-target weights, parallel execution
//! and mapping application.

pub mod apply;
pub mod parallel;
pub mod regrid;
pub mod spatial_index;
pub mod weights;

pub use apply::apply_mapping;
pub use regrid::{Regridder, compute_mapping, regrid_direct};
