//! Tolerance-buffered point-in-polygon filtering.

use geo::{Buffer, Intersects, MultiPolygon, Point, Polygon};
use rstar::AABB;
use suitability_map_criteria_models::GeoPoint;

use crate::{AnalysisArea, PointIndex, compute_envelope, polygon_envelope};

/// Boundary tolerance in degrees (roughly 100 m at mid latitudes).
pub const DEFAULT_TOLERANCE_DEGREES: f64 = 0.001;

/// A per-request containment test: the analysis polygon grown by a fixed
/// tolerance, plus its bounding envelope for cheap rejection.
///
/// Points strictly inside the polygon are always contained; points farther
/// than the tolerance outside it never are.
#[derive(Debug, Clone)]
pub struct ContainmentFilter {
    buffered: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl ContainmentFilter {
    /// Buffers `area` by `tolerance_degrees`.
    ///
    /// A non-positive (or non-finite) tolerance uses the polygon unchanged.
    #[must_use]
    pub fn new(area: &AnalysisArea, tolerance_degrees: f64) -> Self {
        let polygon = area.polygon();

        let buffered = if tolerance_degrees.is_finite() && tolerance_degrees > 0.0 {
            let grown = polygon.buffer(tolerance_degrees);
            if grown.0.is_empty() {
                log::warn!("Buffering analysis area produced no geometry, using it unbuffered");
                MultiPolygon(vec![polygon.clone()])
            } else {
                grown
            }
        } else {
            MultiPolygon(vec![polygon.clone()])
        };

        let envelope = envelope_for(&buffered, polygon);

        Self { buffered, envelope }
    }

    /// Bounding envelope of the buffered polygon, `[longitude, latitude]`.
    #[must_use]
    pub const fn envelope(&self) -> &AABB<[f64; 2]> {
        &self.envelope
    }

    /// Whether a coordinate is inside the buffered polygon (boundary
    /// included).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let lower = self.envelope.lower();
        let upper = self.envelope.upper();
        if longitude < lower[0] || longitude > upper[0] || latitude < lower[1] || latitude > upper[1]
        {
            return false;
        }

        self.buffered.intersects(&Point::new(longitude, latitude))
    }

    /// Indices of `points` inside the buffered polygon, in input order.
    ///
    /// Linear scan with an envelope pre-check; use [`Self::filter_indexed`]
    /// when an R-tree is available.
    pub fn filter<'a>(&'a self, points: &'a [GeoPoint]) -> impl Iterator<Item = usize> + 'a {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| self.contains(p.latitude, p.longitude))
            .map(|(i, _)| i)
    }

    /// Indices of indexed points inside the buffered polygon, ascending.
    ///
    /// The R-tree narrows candidates to the envelope before the exact test.
    /// Sorting keeps downstream aggregation order independent of the tree
    /// layout.
    #[must_use]
    pub fn filter_indexed(&self, index: &PointIndex) -> Vec<usize> {
        let mut hits: Vec<usize> = index
            .candidates(&self.envelope)
            .filter(|&(_, [longitude, latitude])| self.contains(latitude, longitude))
            .map(|(i, _)| i)
            .collect();
        hits.sort_unstable();
        hits
    }
}

/// Envelope of the buffered geometry, falling back to the unbuffered
/// polygon's bounds. Only an unbounded input yields the whole globe, which
/// still defers to the exact test.
fn envelope_for(buffered: &MultiPolygon<f64>, polygon: &Polygon<f64>) -> AABB<[f64; 2]> {
    compute_envelope(buffered)
        .or_else(|| {
            log::warn!("Buffered analysis area has no bounds, using the polygon's own");
            polygon_envelope(polygon)
        })
        .unwrap_or_else(|| AABB::from_corners([-180.0, -90.0], [180.0, 90.0]))
}
