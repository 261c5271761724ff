//! Plain-text I/O for mappings and value vectors.

pub mod mapping_csv;
pub mod values_csv;
