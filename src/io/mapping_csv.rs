//! Text persistence for [`SparseMapping`]s.
//!
//! # Format
//! ```text
//! inmap_cell_index,country_index,fraction
//! 0,0,0.25
//! 0,3,0.75
//! ```
//! - One mandatory header line, skipped on read.
//! - One record per line: source index, target index, fraction.
//! - Fractions are written in Rust's shortest round-trip decimal form, so a
//!   load after a save reproduces every fraction exactly.
//!
//! # Errors
//! Any malformed line (wrong field count, unparsable number, non-positive or
//! non-finite fraction, repeated pair) fails the whole load. A corrupted
//! weight table would otherwise skew every aggregate computed from it.

use crate::data::mapping::{IntersectionRecord, SparseMapping};
use crate::mesh_error::MeshRegridError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Header line written at the top of every mapping table.
pub const MAPPING_HEADER: &str = "inmap_cell_index,country_index,fraction";

/// Write `mapping` as a headered CSV table.
pub fn save_mapping<W: Write>(mapping: &SparseMapping, writer: W) -> Result<(), MeshRegridError> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "{MAPPING_HEADER}")?;
    for r in mapping {
        writeln!(out, "{},{},{}", r.source, r.target, r.fraction)?;
    }
    out.flush()?;
    Ok(())
}

/// Parse a table written by [`save_mapping`].
pub fn load_mapping<R: Read>(reader: R) -> Result<SparseMapping, MeshRegridError> {
    let mut lines = BufReader::new(reader).lines();
    let header = lines.next().ok_or(MeshRegridError::MissingHeader)??;
    if header.trim() != MAPPING_HEADER {
        log::warn!("unexpected mapping header `{}`", header.trim());
    }

    let mut records = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // header is line 1
        records.push(parse_record(line, i + 2)?);
    }
    SparseMapping::from_records(records)
}

fn parse_record(line: &str, line_no: usize) -> Result<IntersectionRecord, MeshRegridError> {
    let malformed = |message: String| MeshRegridError::MappingParse {
        line: line_no,
        message,
    };
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [source, target, fraction] = fields.as_slice() else {
        return Err(malformed(format!("expected 3 fields, found {}", fields.len())));
    };
    let source = source
        .parse::<usize>()
        .map_err(|_| malformed(format!("invalid source index `{source}`")))?;
    let target = target
        .parse::<usize>()
        .map_err(|_| malformed(format!("invalid target index `{target}`")))?;
    let fraction = fraction
        .parse::<f64>()
        .map_err(|_| malformed(format!("invalid fraction `{fraction}`")))?;
    if !fraction.is_finite() || fraction <= 0.0 {
        return Err(malformed(format!("fraction {fraction} is not a positive number")));
    }
    Ok(IntersectionRecord::new(source, target, fraction))
}

/// Save to `path`, creating or truncating it.
pub fn save_mapping_file(
    mapping: &SparseMapping,
    path: impl AsRef<Path>,
) -> Result<(), MeshRegridError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshRegridError::from(e).in_file(path))?;
    save_mapping(mapping, file).map_err(|e| e.in_file(path))?;
    log::info!("saved {} mapping records to {}", mapping.len(), path.display());
    Ok(())
}

/// Load from `path`. Errors carry the path.
pub fn load_mapping_file(path: impl AsRef<Path>) -> Result<SparseMapping, MeshRegridError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshRegridError::from(e).in_file(path))?;
    let mapping = load_mapping(file).map_err(|e| e.in_file(path))?;
    log::info!("loaded {} mapping records from {}", mapping.len(), path.display());
    Ok(mapping)
}
