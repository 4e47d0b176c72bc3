use crate::models::{Geometry, GeometryExt, LngLat};
use rstar::{RTree, RTreeObject, AABB};
use std::fmt;

/// Boundary envelope tagged with the boundary's position in storage order
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedBoundary {
    pub position: usize,
    envelope: AABB<[f64; 2]>,
}

impl IndexedBoundary {
    /// Index a boundary; returns None for empty geometries
    pub fn new(position: usize, boundary: &Geometry) -> Option<Self> {
        let (min, max) = boundary.bounding_box()?;
        Some(Self { position, envelope: AABB::from_corners(min, max) })
    }
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over district boundary envelopes.
///
/// Only a pre-filter: candidates still need an exact predicate check.
pub struct BoundaryIndex {
    tree: RTree<IndexedBoundary>,
}

impl Default for BoundaryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundaryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryIndex").field("len", &self.len()).finish()
    }
}

impl BoundaryIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build an index from `(position, boundary)` pairs
    pub fn from_boundaries<'a>(
        boundaries: impl IntoIterator<Item = (usize, &'a Geometry)>,
    ) -> Self {
        let indexed: Vec<IndexedBoundary> = boundaries
            .into_iter()
            .filter_map(|(position, boundary)| IndexedBoundary::new(position, boundary))
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    pub fn insert(&mut self, position: usize, boundary: &Geometry) {
        if let Some(indexed) = IndexedBoundary::new(position, boundary) {
            self.tree.insert(indexed);
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Positions whose envelope intersects the square of half-width `radius`
    /// around `point`, in ascending (storage) order
    pub fn candidates(&self, point: LngLat, radius: f64) -> Vec<usize> {
        let query = AABB::from_corners(
            [point[0] - radius, point[1] - radius],
            [point[0] + radius, point[1] + radius],
        );
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|indexed| indexed.position)
            .collect();
        positions.sort_unstable();
        positions
    }
}
