//! Intersection weights for a single target cell.
//!
//! [`target_weights`] is the unit of work the executor schedules: it reads
//! the shared index and meshes, and writes only to the [`TargetOutcome`] it
//! returns.

use crate::algs::spatial_index::SourceIndex;
use crate::config::AggregationMode;
use crate::data::mapping::{CellDefect, Diagnostics, IntersectionRecord, MeshSide};
use crate::geometry::cell::{Cell, GeometryDefect};
use crate::geometry::overlap::{Overlap, overlap};
use rstar::RTreeParams;

/// Records and recoverable problems produced for one target cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetOutcome {
    pub target: usize,
    /// Ordered by source index.
    pub records: Vec<IntersectionRecord>,
    pub diagnostics: Diagnostics,
}

impl TargetOutcome {
    /// Overlap-weighted sum of `values` over this target's records.
    ///
    /// Source indices past the end of `values` contribute nothing.
    pub fn fold(&self, values: &[f64]) -> f64 {
        // explicit +0.0 start: `Sum for f64` starts at -0.0
        self.records
            .iter()
            .filter_map(|r| values.get(r.source).map(|v| v * r.fraction))
            .fold(0.0, |acc, x| acc + x)
    }

    /// Sum of this target's fractions, accumulated in source order.
    pub fn fraction_sum(&self) -> f64 {
        self.records.iter().fold(0.0, |acc, r| acc + r.fraction)
    }
}

/// Compute every non-zero fraction between `target` and the indexed sources.
pub fn target_weights<P: RTreeParams>(
    index: &SourceIndex<'_, P>,
    target_index: usize,
    target: &Cell,
    mode: AggregationMode,
    tolerance: f64,
) -> TargetOutcome {
    let mut out = TargetOutcome {
        target: target_index,
        ..TargetOutcome::default()
    };
    let bbox = match (target.defect(), target.bbox()) {
        (None, Some(bbox)) => bbox,
        (defect, _) => {
            let defect = CellDefect {
                side: MeshSide::Target,
                index: target_index,
                defect: defect.unwrap_or(GeometryDefect::Empty),
            };
            log::warn!("skipping {defect}");
            out.diagnostics.defects.push(defect);
            return out;
        }
    };

    for entry in index.candidates(bbox) {
        let source_index = entry.index();
        let area = match overlap(entry.cell(), target) {
            Overlap::Disjoint => continue,
            Overlap::Area(area) => area,
            Overlap::Failed => {
                push_pair_defect(
                    &mut out,
                    GeometryDefect::IntersectionFailed { source_index },
                );
                continue;
            }
            Overlap::NonFinite(area) => {
                push_pair_defect(
                    &mut out,
                    GeometryDefect::NonFiniteOverlap { source_index, area },
                );
                continue;
            }
        };

        let fraction = area / mode.denominator(entry.area(), target.area());
        if !fraction.is_finite() {
            push_pair_defect(
                &mut out,
                GeometryDefect::NonFiniteOverlap {
                    source_index,
                    area: fraction,
                },
            );
            continue;
        }
        if fraction <= 0.0 {
            continue;
        }
        let record = IntersectionRecord::new(source_index, target_index, fraction);
        if fraction > 1.0 + tolerance {
            log::warn!(
                "fraction {fraction} for source {source_index} / target {target_index} exceeds 1 (mode {mode})"
            );
            out.diagnostics.out_of_range.push(record);
        }
        out.records.push(record);
    }
    out
}

fn push_pair_defect(out: &mut TargetOutcome, defect: GeometryDefect) {
    let defect = CellDefect {
        side: MeshSide::Target,
        index: out.target,
        defect,
    };
    log::warn!("dropping pair: {defect}");
    out.diagnostics.defects.push(defect);
}
