//! Per-criterion aggregation of contained points.

use std::collections::BTreeMap;

use suitability_map_criteria_models::{
    Criterion, CriterionResult, GeoPoint, MetricSummary, Status,
};

/// Descriptive statistics over the points of one criterion inside an area.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionStats {
    /// Number of contained points.
    pub count: usize,
    /// Arithmetic mean of their values. This is the criterion score.
    pub mean: f64,
    /// Lowest value.
    pub min: f64,
    /// Highest value.
    pub max: f64,
    /// Summaries of the points' numeric metadata.
    pub details: BTreeMap<String, MetricSummary>,
}

impl CriterionStats {
    /// Turns the statistics into a classified result with no
    /// recommendations yet.
    #[must_use]
    pub fn into_result(self, criterion: Criterion) -> CriterionResult {
        let status = Status::from_score(self.mean);
        CriterionResult {
            caption: criterion.status_caption(status),
            criterion,
            score: self.mean,
            status,
            point_count: self.count,
            min: self.min,
            max: self.max,
            details: self.details,
            recommendations: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    const fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    #[allow(clippy::cast_precision_loss)]
    fn summary(self) -> MetricSummary {
        MetricSummary {
            count: self.count,
            mean: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
        }
    }
}

/// Aggregates the points at `indices` of one source.
///
/// Returns `None` when `indices` is empty: a criterion with no contained
/// points is unavailable, never scored zero. Values are summed in index
/// order so the result does not depend on how the indices were found.
#[must_use]
pub fn aggregate(points: &[GeoPoint], indices: &[usize]) -> Option<CriterionStats> {
    let mut contained = indices.iter().filter_map(|&i| points.get(i));
    let first = contained.next()?;

    let mut values = Accumulator::new(first.value);
    let mut details: BTreeMap<String, MetricSummary> = first
        .metadata
        .iter()
        .map(|(name, &v)| (name.clone(), MetricSummary::of(v)))
        .collect();

    for point in contained {
        values.push(point.value);
        for (name, &v) in &point.metadata {
            details
                .entry(name.clone())
                .and_modify(|summary| *summary = summary.merge(MetricSummary::of(v)))
                .or_insert_with(|| MetricSummary::of(v));
        }
    }

    let values = values.summary();
    Some(CriterionStats {
        count: values.count,
        mean: values.mean.clamp(0.0, 100.0),
        min: values.min,
        max: values.max,
        details,
    })
}

/// Combines the statistics of a criterion's sources.
///
/// Each source counts equally: the score is the mean of the source means,
/// not of the pooled points, so a dense grid can't outweigh a sparse one.
/// Sources without contained points should be left out; `None` when none
/// remain.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn combine(sources: impl IntoIterator<Item = CriterionStats>) -> Option<CriterionStats> {
    let mut sources = sources.into_iter();
    let first = sources.next()?;

    let mut sources_seen = 1_usize;
    let mut mean_sum = first.mean;
    let mut combined = first;

    for stats in sources {
        sources_seen += 1;
        mean_sum += stats.mean;
        combined.count += stats.count;
        combined.min = combined.min.min(stats.min);
        combined.max = combined.max.max(stats.max);
        for (name, summary) in stats.details {
            combined
                .details
                .entry(name)
                .and_modify(|existing| *existing = existing.merge(summary))
                .or_insert(summary);
        }
    }

    combined.mean = (mean_sum / sources_seen as f64).clamp(0.0, 100.0);
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[f64]) -> Vec<GeoPoint> {
        values
            .iter()
            .map(|&v| GeoPoint::new(35.55, 45.40, v))
            .collect()
    }

    fn with_metadata(value: f64, metadata: &[(&str, f64)]) -> GeoPoint {
        let mut point = GeoPoint::new(35.55, 45.40, value);
        point.metadata = metadata
            .iter()
            .map(|&(name, v)| (name.to_string(), v))
            .collect();
        point
    }

    #[test]
    fn computes_mean_min_and_max() {
        let pts = points(&[90.0, 70.0, 30.0, 5.0]);
        let stats = aggregate(&pts, &[0, 1, 2]).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 190.0 / 3.0).abs() < 1e-9);
        assert!((stats.min - 30.0).abs() < f64::EPSILON);
        assert!((stats.max - 90.0).abs() < f64::EPSILON);
        assert!(stats.details.is_empty());
    }

    #[test]
    fn empty_subset_is_unavailable() {
        let pts = points(&[50.0]);
        assert!(aggregate(&pts, &[]).is_none());
        assert!(combine(Vec::new()).is_none());
    }

    #[test]
    fn raising_a_value_never_lowers_the_score() {
        let mut pts = points(&[40.0, 55.0, 61.0]);
        let before = aggregate(&pts, &[0, 1, 2]).unwrap().mean;
        pts[1].value = 80.0;
        let after = aggregate(&pts, &[0, 1, 2]).unwrap().mean;
        assert!(after >= before);
    }

    #[test]
    fn summarizes_metadata_of_contained_points() {
        let pts = vec![
            with_metadata(80.0, &[("slope_percentage", 4.0), ("elevation", 900.0)]),
            with_metadata(60.0, &[("slope_percentage", 8.0)]),
            with_metadata(10.0, &[("slope_percentage", 40.0), ("elevation", 1500.0)]),
        ];

        let stats = aggregate(&pts, &[0, 1]).unwrap();

        let slope = stats.details["slope_percentage"];
        assert_eq!(slope.count, 2);
        assert!((slope.mean - 6.0).abs() < 1e-9);
        assert!((slope.max - 8.0).abs() < f64::EPSILON);

        let elevation = stats.details["elevation"];
        assert_eq!(elevation.count, 1);
        assert!((elevation.min - 900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sources_count_equally() {
        let temperature = points(&[20.0]);
        let vegetation = points(&[80.0, 80.0, 80.0]);

        let stats = combine([
            aggregate(&temperature, &[0]).unwrap(),
            aggregate(&vegetation, &[0, 1, 2]).unwrap(),
        ])
        .unwrap();

        assert!((stats.mean - 50.0).abs() < 1e-9);
        assert_eq!(stats.count, 4);
        assert!((stats.min - 20.0).abs() < f64::EPSILON);
        assert!((stats.max - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn combined_details_keep_each_source_attribute() {
        let temperature = vec![with_metadata(30.0, &[("land_surface_temperature", 52.0)])];
        let vegetation = vec![with_metadata(50.0, &[("estimated_ndvi", 0.4)])];

        let stats = combine([
            aggregate(&temperature, &[0]).unwrap(),
            aggregate(&vegetation, &[0]).unwrap(),
        ])
        .unwrap();

        assert_eq!(stats.details.len(), 2);
        assert!((stats.details["estimated_ndvi"].mean - 0.4).abs() < 1e-9);
    }

    #[test]
    fn result_carries_status_caption_and_details() {
        let pts = vec![with_metadata(85.0, &[("schools", 3.0)])];
        let result = aggregate(&pts, &[0])
            .unwrap()
            .into_result(Criterion::AirQuality);
        assert_eq!(result.status, Status::Excellent);
        assert_eq!(result.caption, "Excellent Air Quality");
        assert_eq!(result.point_count, 1);
        assert_eq!(result.details["schools"].count, 1);
        assert!(result.recommendations.is_empty());
    }
}
