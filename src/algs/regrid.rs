//! Entry points for area-weighted regridding.
//!
//! Two paths share the same per-target kernel:
//! - **direct**: [`Regridder::regrid`] folds each target's overlaps into its
//!   value as soon as they are computed;
//! - **cached**: [`Regridder::compute_mapping`] produces a [`SparseMapping`]
//!   that can be saved, reloaded and applied to any number of value vectors
//!   with [`apply_mapping`](crate::algs::apply::apply_mapping).
//!
//! Both paths accumulate each target's contributions in ascending source
//! order, so for the same meshes and values they agree to the last bit.

use crate::algs::apply::{apply_mapping, apply_mapping_to_len};
use crate::algs::parallel::{CancelToken, Executor, merge_outcomes};
use crate::algs::spatial_index::{CellIndexParams, SourceIndex};
use crate::algs::weights::target_weights;
use crate::config::{AggregationMode, RegridConfig};
use crate::data::mapping::{Diagnostics, SparseMapping};
use crate::debug_invariants::DebugInvariants;
use crate::geometry::cell::Mesh;
use crate::io::mapping_csv::{load_mapping_file, save_mapping_file};
use crate::mesh_error::MeshRegridError;
use rstar::RTreeParams;
use std::path::Path;

/// A computed mapping with the problems met while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingRun {
    pub mapping: SparseMapping,
    pub diagnostics: Diagnostics,
}

/// Directly regridded target values with the problems met on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectRun {
    /// One value per target cell.
    pub values: Vec<f64>,
    pub diagnostics: Diagnostics,
}

/// A source index, a worker pool and a configuration bound to one mesh pair.
///
/// Building a `Regridder` validates the configuration and indexes the source
/// mesh once; both paths can then be run repeatedly.
pub struct Regridder<'a, P: RTreeParams = CellIndexParams> {
    source: &'a Mesh,
    target: &'a Mesh,
    index: SourceIndex<'a, P>,
    executor: Executor,
    config: RegridConfig,
    cancel: Option<CancelToken>,
}

impl<'a, P: RTreeParams> Regridder<'a, P> {
    pub fn new(
        source: &'a Mesh,
        target: &'a Mesh,
        config: RegridConfig,
    ) -> Result<Self, MeshRegridError> {
        config.validate()?;
        let executor = Executor::new(config.max_concurrency)?;
        let index = SourceIndex::build(source);
        for skipped in index.skipped() {
            log::warn!("skipping {skipped}");
        }
        Ok(Self {
            source,
            target,
            index,
            executor,
            config,
            cancel: None,
        })
    }

    /// Check `token` before every per-target task of later runs.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &RegridConfig {
        &self.config
    }

    fn base_diagnostics(&self) -> Diagnostics {
        Diagnostics {
            defects: self.index.skipped().to_vec(),
            ..Diagnostics::default()
        }
    }

    /// Compute every non-zero `(source, target, fraction)` for the mesh pair.
    pub fn compute_mapping(&self) -> Result<MappingRun, MeshRegridError> {
        let RegridConfig {
            mode,
            fraction_tolerance,
            ..
        } = self.config;
        let cells = self.target.cells();
        log::info!(
            "computing {mode} intersections for {} target cells on {} workers",
            cells.len(),
            self.executor.max_concurrency()
        );
        let outcomes = self.executor.run(cells.len(), self.cancel.as_ref(), |t| {
            target_weights(&self.index, t, &cells[t], mode, fraction_tolerance)
        })?;
        let (mapping, found) = merge_outcomes(outcomes)?;
        mapping.debug_assert_invariants();

        let mut diagnostics = self.base_diagnostics();
        diagnostics.extend(found);
        diagnostics.over_unity_sums = mapping.conservation_violations(mode, fraction_tolerance);
        for (cell, sum) in &diagnostics.over_unity_sums {
            log::warn!("fractions of cell {cell} sum to {sum} in {mode} mode");
        }
        log::info!(
            "computed {} intersection records ({} defects)",
            mapping.len(),
            diagnostics.defects.len()
        );
        Ok(MappingRun {
            mapping,
            diagnostics,
        })
    }

    /// Regrid `source_values` onto the target mesh without keeping records.
    ///
    /// `source_values` must have exactly one entry per source cell; this is
    /// checked before any intersection work starts.
    ///
    /// Over-unity fraction sums are reported per target in mean mode. Sum
    /// mode needs per-source sums across all targets, which this path does
    /// not keep; use [`Regridder::compute_mapping`] to check those.
    pub fn regrid(&self, source_values: &[f64]) -> Result<DirectRun, MeshRegridError> {
        self.source.check_values("source", source_values)?;
        let RegridConfig {
            mode,
            fraction_tolerance,
            ..
        } = self.config;
        let cells = self.target.cells();
        log::info!(
            "regridding {} source values onto {} target cells ({mode})",
            source_values.len(),
            cells.len()
        );
        let folded = self.executor.run(cells.len(), self.cancel.as_ref(), |t| {
            let outcome = target_weights(&self.index, t, &cells[t], mode, fraction_tolerance);
            let over_unity = match mode {
                AggregationMode::Mean => Some(outcome.fraction_sum())
                    .filter(|s| !s.is_finite() || *s > 1.0 + fraction_tolerance),
                AggregationMode::Sum => None,
            };
            (outcome.fold(source_values), over_unity, outcome.diagnostics)
        })?;

        let mut diagnostics = self.base_diagnostics();
        let mut values = Vec::with_capacity(folded.len());
        for (t, (value, over_unity, found)) in folded.into_iter().enumerate() {
            values.push(value);
            diagnostics.extend(found);
            if let Some(sum) = over_unity {
                log::warn!("fractions of cell {t} sum to {sum} in {mode} mode");
                diagnostics.over_unity_sums.push((t, sum));
            }
        }
        Ok(DirectRun {
            values,
            diagnostics,
        })
    }
}

/// Compute the sparse mapping between two meshes.
pub fn compute_mapping(
    source: &Mesh,
    target: &Mesh,
    config: &RegridConfig,
) -> Result<MappingRun, MeshRegridError> {
    Regridder::<CellIndexParams>::new(source, target, config.clone())?.compute_mapping()
}

/// Regrid a source field directly onto the target mesh.
pub fn regrid_direct(
    source: &Mesh,
    source_values: &[f64],
    target: &Mesh,
    config: &RegridConfig,
) -> Result<DirectRun, MeshRegridError> {
    source.check_values("source", source_values)?;
    Regridder::<CellIndexParams>::new(source, target, config.clone())?.regrid(source_values)
}

/// Compute a mapping and persist it to `path`.
pub fn create_mapping_file(
    source: &Mesh,
    target: &Mesh,
    config: &RegridConfig,
    path: impl AsRef<Path>,
) -> Result<MappingRun, MeshRegridError> {
    let run = compute_mapping(source, target, config)?;
    save_mapping_file(&run.mapping, path)?;
    Ok(run)
}

/// Load a mapping from `path` and apply it to `source_values`.
///
/// With `target_len` the output has exactly that many entries; otherwise its
/// length is one past the highest target index in the file.
pub fn apply_mapping_file(
    path: impl AsRef<Path>,
    source_values: &[f64],
    target_len: Option<usize>,
) -> Result<Vec<f64>, MeshRegridError> {
    let path = path.as_ref();
    let mapping = load_mapping_file(path)?;
    match target_len {
        Some(len) => {
            apply_mapping_to_len(&mapping, source_values, len).map_err(|e| e.in_file(path))
        }
        None => Ok(apply_mapping(&mapping, source_values)),
    }
}
