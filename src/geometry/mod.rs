//! Cell geometry for mesh-regrid.
//!
//! This module holds polygon cells and meshes, pairwise overlap areas and
//! builders for regular grids.

pub mod cell;
pub mod grid;
pub mod overlap;
