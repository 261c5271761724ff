//! Bounding-box index over a source mesh.
//!
//! The index is bulk loaded once per source mesh and never mutated, so any
//! number of workers may query it concurrently through a shared reference.
//! Queries return a superset of the true overlaps; callers confirm each
//! candidate with an exact polygon intersection.

use crate::data::mapping::{CellDefect, MeshSide};
use crate::geometry::cell::{Cell, GeometryDefect, Mesh};
use geo::Rect;
use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};

/// Default node fanout: between 25 and 50 children per node.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellIndexParams;

impl RTreeParams for CellIndexParams {
    const MIN_SIZE: usize = 25;
    const MAX_SIZE: usize = 50;
    const REINSERTION_COUNT: usize = 8;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// A source cell as stored in the index.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry<'a> {
    index: usize,
    cell: &'a Cell,
    envelope: AABB<[f64; 2]>,
}

impl<'a> IndexEntry<'a> {
    /// Position of the cell in the source mesh.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn cell(&self) -> &'a Cell {
        self.cell
    }

    /// Cached cell area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.cell.area()
    }
}

impl RTreeObject for IndexEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

#[inline]
fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Read-only R-tree over the usable cells of a source mesh.
pub struct SourceIndex<'a, P: RTreeParams = CellIndexParams> {
    tree: RTree<IndexEntry<'a>, P>,
    skipped: Vec<CellDefect>,
}

impl<'a, P: RTreeParams> SourceIndex<'a, P> {
    /// Bulk load every usable cell of `mesh`.
    ///
    /// Defective cells are left out and listed in [`SourceIndex::skipped`].
    pub fn build(mesh: &'a Mesh) -> Self {
        let mut skipped = Vec::new();
        let mut entries = Vec::with_capacity(mesh.len());
        for (index, cell) in mesh.iter().enumerate() {
            match (cell.defect(), cell.bbox()) {
                (None, Some(bbox)) => entries.push(IndexEntry {
                    index,
                    cell,
                    envelope: rect_envelope(bbox),
                }),
                (defect, _) => skipped.push(CellDefect {
                    side: MeshSide::Source,
                    index,
                    defect: defect.unwrap_or(GeometryDefect::Empty),
                }),
            }
        }
        log::info!(
            "indexed {} source cells ({} skipped)",
            entries.len(),
            skipped.len()
        );
        Self {
            tree: RTree::bulk_load_with_params(entries),
            skipped,
        }
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Source cells that were not indexed.
    pub fn skipped(&self) -> &[CellDefect] {
        &self.skipped
    }

    /// Entries whose bounding box intersects `bbox` (boundary contact included).
    pub fn query_intersecting(&self, bbox: Rect<f64>) -> impl Iterator<Item = &IndexEntry<'a>> + '_ {
        self.tree.locate_in_envelope_intersecting(&rect_envelope(bbox))
    }

    /// Candidate source cells for `bbox`, ordered by source index.
    pub fn candidates(&self, bbox: Rect<f64>) -> Vec<&IndexEntry<'a>> {
        let mut found: Vec<_> = self.query_intersecting(bbox).collect();
        found.sort_unstable_by_key(|e| e.index);
        found
    }
}
