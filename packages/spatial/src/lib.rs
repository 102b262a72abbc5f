#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for area suitability analysis.
//!
//! Validates user-drawn analysis polygons, builds R-tree indexes over point
//! datasets, and filters points against a tolerance-buffered polygon so
//! that grid points sitting on a hand-drawn boundary are not lost to
//! floating-point and digitization error.

mod area;
mod containment;
mod index;

pub use area::AnalysisArea;
pub use containment::{ContainmentFilter, DEFAULT_TOLERANCE_DEGREES};
pub use index::PointIndex;

use geo::{BoundingRect, MultiPolygon, Polygon, Rect};
use rstar::AABB;
use thiserror::Error;

/// Reasons an analysis area is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AreaError {
    /// Fewer than three distinct vertices were supplied.
    #[error("polygon needs at least 3 distinct vertices, found {found}")]
    TooFewVertices {
        /// Number of distinct vertices found.
        found: usize,
    },

    /// A vertex has a NaN or infinite coordinate.
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Position of the vertex in the input.
        index: usize,
    },

    /// A vertex lies outside the WGS84 coordinate range.
    #[error("vertex {index} ({latitude}, {longitude}) is outside WGS84 range")]
    CoordinateOutOfRange {
        /// Position of the vertex in the input.
        index: usize,
        /// Its latitude.
        latitude: f64,
        /// Its longitude.
        longitude: f64,
    },

    /// All vertices are collinear, so the polygon encloses nothing.
    #[error("polygon is degenerate (zero area)")]
    ZeroArea,

    /// The `GeoJSON` input could not be interpreted as a single polygon.
    #[error("invalid GeoJSON area: {0}")]
    InvalidGeoJson(String),
}

/// Compute the bounding box envelope for a [`MultiPolygon`] in
/// `[longitude, latitude]` order.
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect().map(rect_envelope)
}

/// Envelope of a single polygon in `[longitude, latitude]` order.
fn polygon_envelope(polygon: &Polygon<f64>) -> Option<AABB<[f64; 2]>> {
    polygon.bounding_rect().map(rect_envelope)
}

fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
