//! Data module: sparse overlap mappings and run diagnostics.

pub mod mapping;

pub use mapping::{Diagnostics, IntersectionRecord, SparseMapping};
