//! Sparse source-to-target weight mapping.
//!
//! A [`SparseMapping`] is a set of [`IntersectionRecord`]s, one per pair of
//! cells whose overlap area is strictly positive. It depends only on the two
//! meshes' geometry, never on a value vector, so one mapping can be applied
//! to any number of fields defined on the same source mesh.
//!
//! Records are held in canonical `(source, target)` order regardless of how
//! they were produced, which makes saved tables reproducible byte for byte.

use crate::config::AggregationMode;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::cell::GeometryDefect;
use crate::mesh_error::MeshRegridError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One non-zero entry of the weight matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    pub source: usize,
    pub target: usize,
    /// Overlap area over the denominator chosen by [`AggregationMode`].
    pub fraction: f64,
}

impl IntersectionRecord {
    pub fn new(source: usize, target: usize, fraction: f64) -> Self {
        Self {
            source,
            target,
            fraction,
        }
    }

    #[inline]
    pub fn key(&self) -> (usize, usize) {
        (self.source, self.target)
    }
}

/// Canonically ordered set of intersection records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseMapping {
    records: Vec<IntersectionRecord>,
}

impl SparseMapping {
    /// Sort `records` into canonical order, rejecting repeated keys and
    /// fractions that are not finite and positive.
    pub fn from_records(mut records: Vec<IntersectionRecord>) -> Result<Self, MeshRegridError> {
        if let Some(r) = records.iter().find(|r| !fraction_is_admissible(r.fraction)) {
            return Err(invalid_fraction(r));
        }
        records.sort_unstable_by_key(IntersectionRecord::key);
        if let Some((a, _)) = records
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.key() == b.key())
        {
            return Err(MeshRegridError::DuplicateRecord {
                source_index: a.source,
                target_index: a.target,
            });
        }
        Ok(Self { records })
    }

    #[inline]
    pub fn records(&self) -> &[IntersectionRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IntersectionRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<IntersectionRecord> {
        self.records
    }

    /// Fraction stored for a pair, if the pair overlaps.
    pub fn get(&self, source: usize, target: usize) -> Option<f64> {
        self.records
            .binary_search_by_key(&(source, target), IntersectionRecord::key)
            .ok()
            .map(|i| self.records[i].fraction)
    }

    pub fn max_target(&self) -> Option<usize> {
        self.records.iter().map(|r| r.target).max()
    }

    pub fn max_source(&self) -> Option<usize> {
        self.records.last().map(|r| r.source)
    }

    /// Output length implied by the records: highest target index plus one.
    pub fn target_len(&self) -> usize {
        self.max_target().map_or(0, |t| t + 1)
    }

    /// Row sums: total fraction leaving each source cell.
    pub fn source_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.max_source().map_or(0, |s| s + 1)];
        for r in &self.records {
            sums[r.source] += r.fraction;
        }
        sums
    }

    /// Column sums: total fraction arriving at each target cell.
    pub fn target_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.target_len()];
        for r in &self.records {
            sums[r.target] += r.fraction;
        }
        sums
    }

    /// Cells whose fraction sum exceeds `1 + tolerance`.
    ///
    /// In [`AggregationMode::Sum`] the sums run over targets per source (mass
    /// conservation); in [`AggregationMode::Mean`] over sources per target.
    pub fn conservation_violations(
        &self,
        mode: AggregationMode,
        tolerance: f64,
    ) -> Vec<(usize, f64)> {
        let sums = match mode {
            AggregationMode::Sum => self.source_sums(),
            AggregationMode::Mean => self.target_sums(),
        };
        sums.into_iter()
            .enumerate()
            .filter(|(_, s)| !s.is_finite() || *s > 1.0 + tolerance)
            .collect()
    }
}

impl<'a> IntoIterator for &'a SparseMapping {
    type Item = &'a IntersectionRecord;
    type IntoIter = std::slice::Iter<'a, IntersectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl DebugInvariants for SparseMapping {
    fn validate_invariants(&self) -> Result<(), MeshRegridError> {
        if let Some(r) = self.records.iter().find(|r| !fraction_is_admissible(r.fraction)) {
            return Err(invalid_fraction(r));
        }
        for (a, b) in self.records.iter().tuple_windows() {
            if a.key() >= b.key() {
                return Err(MeshRegridError::DuplicateRecord {
                    source_index: b.source,
                    target_index: b.target,
                });
            }
        }
        Ok(())
    }
}

#[inline]
fn fraction_is_admissible(fraction: f64) -> bool {
    fraction.is_finite() && fraction > 0.0
}

fn invalid_fraction(r: &IntersectionRecord) -> MeshRegridError {
    MeshRegridError::InvalidFraction {
        source_index: r.source,
        target_index: r.target,
        fraction: r.fraction,
    }
}

/// Which mesh a defective cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshSide {
    Source,
    Target,
}

impl fmt::Display for MeshSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MeshSide::Source => "source",
            MeshSide::Target => "target",
        })
    }
}

/// A cell that contributed no records, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDefect {
    pub side: MeshSide,
    pub index: usize,
    pub defect: GeometryDefect,
}

impl fmt::Display for CellDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cell {}: {}", self.side, self.index, self.defect)
    }
}

/// Recoverable problems observed during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Cells (or cell pairs, attributed to the target) that produced nothing.
    pub defects: Vec<CellDefect>,
    /// Records kept despite a fraction above `1 + tolerance`.
    pub out_of_range: Vec<IntersectionRecord>,
    /// Cells whose fraction sum exceeds `1 + tolerance`, see
    /// [`SparseMapping::conservation_violations`].
    pub over_unity_sums: Vec<(usize, f64)>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty() && self.out_of_range.is_empty() && self.over_unity_sums.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.defects.extend(other.defects);
        self.out_of_range.extend(other.out_of_range);
        self.over_unity_sums.extend(other.over_unity_sums);
    }
}
