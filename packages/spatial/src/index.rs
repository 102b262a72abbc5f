//! R-tree index over a dataset's point positions.

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use suitability_map_criteria_models::GeoPoint;

/// A point position (`[longitude, latitude]`) tagged with its index in the
/// source collection.
type IndexedPosition = GeomWithData<[f64; 2], usize>;

/// Spatial index over the positions of a point collection.
///
/// Only positions and indices are stored; values stay in the source
/// collection so filtering never copies points.
pub struct PointIndex {
    tree: RTree<IndexedPosition>,
}

impl PointIndex {
    /// Bulk-loads an index over `points`.
    #[must_use]
    pub fn build(points: &[GeoPoint]) -> Self {
        let entries: Vec<IndexedPosition> = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.longitude, p.latitude], i))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indexed points inside `envelope`, as `(index, [longitude, latitude])`.
    pub fn candidates<'a>(
        &'a self,
        envelope: &AABB<[f64; 2]>,
    ) -> impl Iterator<Item = (usize, [f64; 2])> + 'a {
        self.tree
            .locate_in_envelope(envelope)
            .map(|entry| (entry.data, *entry.geom()))
    }
}

impl std::fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_are_limited_to_envelope() {
        let points = vec![
            GeoPoint::new(35.55, 45.40, 10.0),
            GeoPoint::new(35.60, 45.45, 20.0),
            GeoPoint::new(36.50, 46.40, 30.0),
        ];
        let index = PointIndex::build(&points);
        assert_eq!(index.len(), 3);

        let envelope = AABB::from_corners([45.39, 35.54], [45.46, 35.61]);
        let mut found: Vec<usize> = index.candidates(&envelope).map(|(i, _)| i).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn empty_index() {
        let index = PointIndex::build(&[]);
        assert!(index.is_empty());
        let envelope = AABB::from_corners([0.0, 0.0], [1.0, 1.0]);
        assert_eq!(index.candidates(&envelope).count(), 0);
    }
}
