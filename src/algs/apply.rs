//! Applying a stored mapping to a value vector. No geometry is involved.

use crate::data::mapping::SparseMapping;
use crate::mesh_error::MeshRegridError;

/// Aggregate `source_values` onto targets: `out[t] = sum(values[s] * fraction(s, t))`.
///
/// The output has [`SparseMapping::target_len`] entries; targets with no
/// record stay zero. Records whose source index lies past the end of
/// `source_values` are skipped, so a value vector shorter than the mesh the
/// mapping was built from is tolerated.
pub fn apply_mapping(mapping: &SparseMapping, source_values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; mapping.target_len()];
    accumulate(mapping, source_values, &mut out);
    out
}

/// Like [`apply_mapping`] but with an explicit output length, so targets after
/// the last overlapping one are still represented.
pub fn apply_mapping_to_len(
    mapping: &SparseMapping,
    source_values: &[f64],
    len: usize,
) -> Result<Vec<f64>, MeshRegridError> {
    if let Some(target) = mapping.max_target().filter(|&t| t >= len) {
        return Err(MeshRegridError::TargetOutOfRange { target, len });
    }
    let mut out = vec![0.0; len];
    accumulate(mapping, source_values, &mut out);
    Ok(out)
}

fn accumulate(mapping: &SparseMapping, source_values: &[f64], out: &mut [f64]) {
    let mut skipped = 0usize;
    for r in mapping {
        match source_values.get(r.source) {
            Some(v) => out[r.target] += v * r.fraction,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!(
            "{skipped} mapping records reference sources beyond the {} supplied values",
            source_values.len()
        );
    }
}
