//! Point datasets supplied by the point store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Criterion, NormalizationRule};

/// A single pre-computed measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// WGS84 latitude in decimal degrees.
    pub latitude: f64,
    /// WGS84 longitude in decimal degrees.
    pub longitude: f64,
    /// Normalized suitability value (0-100).
    pub value: f64,
    /// Numeric attributes carried over from the source row (raw
    /// measurement, sub-indicators), keyed by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, f64>,
}

impl GeoPoint {
    /// Creates a point without metadata.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
            metadata: BTreeMap::new(),
        }
    }
}

/// Geographic extent of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    /// Southern edge.
    pub min_latitude: f64,
    /// Western edge.
    pub min_longitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
}

impl Coverage {
    /// Smallest extent covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_latitude: self.min_latitude.min(other.min_latitude),
            min_longitude: self.min_longitude.min(other.min_longitude),
            max_latitude: self.max_latitude.max(other.max_latitude),
            max_longitude: self.max_longitude.max(other.max_longitude),
        }
    }
}

/// Description of one dataset source, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Unit of the raw values.
    pub unit_label: String,
    /// Raw-to-score conversion.
    pub normalization: NormalizationRule,
    /// Number of points.
    pub point_count: usize,
}

/// The points of one source for a criterion, already normalized to 0-100.
///
/// A criterion may be measured by several sources (e.g. temperature and
/// vegetation for heat & greenspace); each keeps its own unit and rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionDataset {
    /// Criterion these points measure.
    pub criterion: Criterion,
    /// Unit of the raw measurement (e.g. "AQI", "°C", "people/km²").
    pub unit_label: String,
    /// Rule that produced the normalized values.
    pub normalization: NormalizationRule,
    points: Vec<GeoPoint>,
}

impl CriterionDataset {
    /// Creates a dataset, checking every point.
    ///
    /// # Errors
    ///
    /// Returns an error for the first point with a non-finite or
    /// out-of-range coordinate, or a value outside `[0, 100]`.
    pub fn new(
        criterion: Criterion,
        unit_label: impl Into<String>,
        normalization: NormalizationRule,
        points: Vec<GeoPoint>,
    ) -> Result<Self, InvalidPointError> {
        for (index, point) in points.iter().enumerate() {
            let valid_coords = point.latitude.is_finite()
                && point.longitude.is_finite()
                && (-90.0..=90.0).contains(&point.latitude)
                && (-180.0..=180.0).contains(&point.longitude);
            let valid_value = point.value.is_finite() && (0.0..=100.0).contains(&point.value);

            if !valid_coords || !valid_value {
                return Err(InvalidPointError {
                    criterion,
                    index,
                    latitude: point.latitude,
                    longitude: point.longitude,
                    value: point.value,
                });
            }
        }

        Ok(Self {
            criterion,
            unit_label: unit_label.into(),
            normalization,
            points,
        })
    }

    /// Returns the dataset's points.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of all points, or `None` when empty.
    #[must_use]
    pub fn coverage(&self) -> Option<Coverage> {
        let first = self.points.first()?;
        let at = |p: &GeoPoint| Coverage {
            min_latitude: p.latitude,
            min_longitude: p.longitude,
            max_latitude: p.latitude,
            max_longitude: p.longitude,
        };

        Some(
            self.points
                .iter()
                .fold(at(first), |acc, p| acc.union(at(p))),
        )
    }

    /// Unit, rule and size of this source.
    #[must_use]
    pub fn source_summary(&self) -> SourceSummary {
        SourceSummary {
            unit_label: self.unit_label.clone(),
            normalization: self.normalization,
            point_count: self.points.len(),
        }
    }
}

/// Error returned when a dataset contains a point outside the valid domain.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "invalid point #{index} in {criterion} dataset: ({latitude}, {longitude}) value {value} \
     (expected finite WGS84 coordinates and a value in 0-100)"
)]
pub struct InvalidPointError {
    /// Criterion of the offending dataset.
    pub criterion: Criterion,
    /// Index of the offending point.
    pub index: usize,
    /// Its latitude.
    pub latitude: f64,
    /// Its longitude.
    pub longitude: f64,
    /// Its normalized value.
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_outside_scale() {
        let err = CriterionDataset::new(
            Criterion::AirQuality,
            "AQI",
            NormalizationRule::Identity,
            vec![GeoPoint::new(35.5, 45.4, 50.0), GeoPoint::new(35.5, 45.4, 100.5)],
        )
        .unwrap_err();
        assert_eq!(err.index, 1);

        let source: &dyn std::error::Error = &err;
        assert!(source.to_string().starts_with("invalid point #1 in air_quality dataset"));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let result = CriterionDataset::new(
            Criterion::Topography,
            "%",
            NormalizationRule::Identity,
            vec![GeoPoint::new(f64::NAN, 45.4, 50.0)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn source_summary_reports_unit_and_rule() {
        let rule = NormalizationRule::HigherIsBetter { min: 0.0, max: 0.8 };
        let dataset = CriterionDataset::new(
            Criterion::HeatGreenspace,
            "NDVI",
            rule,
            vec![GeoPoint::new(35.5, 45.4, 60.0)],
        )
        .unwrap();

        let summary = dataset.source_summary();
        assert_eq!(summary.unit_label, "NDVI");
        assert_eq!(summary.normalization, rule);
        assert_eq!(summary.point_count, 1);
    }

    #[test]
    fn coverage_spans_all_points() {
        let dataset = CriterionDataset::new(
            Criterion::Population,
            "people/km²",
            NormalizationRule::Identity,
            vec![
                GeoPoint::new(35.4, 45.5, 10.0),
                GeoPoint::new(35.7, 45.2, 20.0),
            ],
        )
        .unwrap();
        let coverage = dataset.coverage().unwrap();
        assert!((coverage.min_latitude - 35.4).abs() < f64::EPSILON);
        assert!((coverage.max_latitude - 35.7).abs() < f64::EPSILON);
        assert!((coverage.min_longitude - 45.2).abs() < f64::EPSILON);
        assert!((coverage.max_longitude - 45.5).abs() < f64::EPSILON);
    }
}
