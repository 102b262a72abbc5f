#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Suitability criteria taxonomy, status classification, and result types.
//!
//! This crate defines the shared vocabulary of the area suitability engine:
//! the fixed set of assessment criteria, the single status threshold table
//! used by every criterion and by the composite score, and the plain
//! serializable result values returned to callers.

pub mod dataset;
pub mod normalization;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use dataset::{Coverage, CriterionDataset, GeoPoint, InvalidPointError, SourceSummary};
pub use normalization::{InvalidNormalizationError, NormalizationRule};

/// Minimum score classified as [`Status::Excellent`].
pub const EXCELLENT_THRESHOLD: f64 = 80.0;
/// Minimum score classified as [`Status::Good`].
pub const GOOD_THRESHOLD: f64 = 60.0;
/// Minimum score classified as [`Status::Moderate`].
pub const MODERATE_THRESHOLD: f64 = 40.0;

/// A suitability criterion backed by one point dataset.
///
/// Known criteria are a closed set so that rule lookups are exhaustive
/// matches. Dataset names that don't map to a known criterion are kept as
/// [`Criterion::Unregistered`] so they can still be scored, but they never
/// receive recommendations.
///
/// Variant order is the relevance order used when ranking recommendations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Criterion {
    /// Composite air quality index (NO2, PM, CO, ...).
    AirQuality,
    /// Land surface temperature combined with vegetation cover (NDVI).
    HeatGreenspace,
    /// Access to roads, utilities, and essential services.
    Infrastructure,
    /// Economic activity derived from nighttime lights.
    EconomicActivity,
    /// Population density relative to a sustainable optimum.
    Population,
    /// Slope and elevation suitability for construction.
    Topography,
    /// A dataset whose name doesn't match any known criterion.
    Unregistered(String),
}

impl Criterion {
    /// All known criteria, in relevance order.
    pub const REGISTERED: &[Self] = &[
        Self::AirQuality,
        Self::HeatGreenspace,
        Self::Infrastructure,
        Self::EconomicActivity,
        Self::Population,
        Self::Topography,
    ];

    /// Resolves a dataset name into a criterion.
    ///
    /// Matching is case-insensitive and accepts a few aliases used by the
    /// upstream datasets (e.g. `nightlights`, `population_density`).
    /// Anything else becomes [`Criterion::Unregistered`].
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "air_quality" | "aqi" => Self::AirQuality,
            "heat_greenspace" | "heat" | "greenspace" => Self::HeatGreenspace,
            "infrastructure" => Self::Infrastructure,
            "economic_activity" | "nightlights" => Self::EconomicActivity,
            "population" | "population_density" => Self::Population,
            "topography" | "terrain" => Self::Topography,
            _ => Self::Unregistered(name.trim().to_string()),
        }
    }

    /// Returns the canonical identifier of this criterion.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AirQuality => "air_quality",
            Self::HeatGreenspace => "heat_greenspace",
            Self::Infrastructure => "infrastructure",
            Self::EconomicActivity => "economic_activity",
            Self::Population => "population",
            Self::Topography => "topography",
            Self::Unregistered(name) => name,
        }
    }

    /// Returns a human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::AirQuality => "Air Quality",
            Self::HeatGreenspace => "Heat & Greenspace",
            Self::Infrastructure => "Infrastructure",
            Self::EconomicActivity => "Economic Activity",
            Self::Population => "Population Density",
            Self::Topography => "Topography",
            Self::Unregistered(name) => name,
        }
    }

    /// Whether this is one of the known criteria.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        !matches!(self, Self::Unregistered(_))
    }

    /// Returns the display caption for a status of this criterion
    /// (e.g. "High Heat Stress Risk").
    #[must_use]
    pub fn status_caption(&self, status: Status) -> String {
        let caption = match (self, status) {
            (Self::AirQuality, Status::Excellent) => "Excellent Air Quality",
            (Self::AirQuality, Status::Good) => "Good Air Quality",
            (Self::AirQuality, Status::Moderate) => "Moderate Air Quality",
            (Self::AirQuality, Status::Poor) => "Poor Air Quality",
            (Self::HeatGreenspace, Status::Excellent) => "Excellent Climate Conditions",
            (Self::HeatGreenspace, Status::Good) => "Good Climate Balance",
            (Self::HeatGreenspace, Status::Moderate) => "Moderate Heat Stress",
            (Self::HeatGreenspace, Status::Poor) => "High Heat Stress Risk",
            (Self::Infrastructure, Status::Excellent) => "Excellent Infrastructure Access",
            (Self::Infrastructure, Status::Good) => "Good Infrastructure Access",
            (Self::Infrastructure, Status::Moderate) => "Limited Infrastructure Access",
            (Self::Infrastructure, Status::Poor) => "Poor Infrastructure Access",
            (Self::EconomicActivity, Status::Excellent) => "Strong Economic Activity",
            (Self::EconomicActivity, Status::Good) => "Moderate Economic Activity",
            (Self::EconomicActivity, Status::Moderate) => "Developing Economic Area",
            (Self::EconomicActivity, Status::Poor) => "Limited Economic Activity",
            (Self::Population, Status::Excellent) => "Optimal Development Density",
            (Self::Population, Status::Good) => "Good Development Potential",
            (Self::Population, Status::Moderate) => "Moderate Development Suitability",
            (Self::Population, Status::Poor) => "Limited Development Potential",
            (Self::Topography, Status::Excellent) => "Excellent Terrain Suitability",
            (Self::Topography, Status::Good) => "Good Development Terrain",
            (Self::Topography, Status::Moderate) => "Moderate Terrain Challenges",
            (Self::Topography, Status::Poor) => "Difficult Terrain Conditions",
            (Self::Unregistered(name), status) => return format!("{name}: {status}"),
        };
        caption.to_string()
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Criterion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::resolve(s))
    }
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        Self::resolve(&value)
    }
}

impl From<Criterion> for String {
    fn from(value: Criterion) -> Self {
        value.id().to_string()
    }
}

/// Qualitative status derived from a 0-100 score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Score >= 80
    Excellent,
    /// 60 <= score < 80
    Good,
    /// 40 <= score < 60
    Moderate,
    /// Score < 40
    Poor,
}

impl Status {
    /// Classifies a score using the shared threshold table.
    ///
    /// Boundaries resolve to the higher band: exactly 80.0 is
    /// [`Status::Excellent`], exactly 40.0 is [`Status::Moderate`].
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if score >= GOOD_THRESHOLD {
            Self::Good
        } else if score >= MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Poor
        }
    }

    /// Returns all variants, best first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Excellent, Self::Good, Self::Moderate, Self::Poor]
    }

    /// Whether this status is [`Status::Moderate`] or worse.
    #[must_use]
    pub const fn needs_improvement(self) -> bool {
        matches!(self, Self::Moderate | Self::Poor)
    }
}

/// Overall development readiness of an area, derived from the overall
/// status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DevelopmentReadiness {
    /// Low risk; ready for investment.
    ReadyForDevelopment,
    /// Medium risk; minor improvements needed first.
    MinorImprovementsNeeded,
    /// High risk; major improvements required.
    MajorImprovementsRequired,
    /// Very high risk; comprehensive development needed.
    ComprehensiveDevelopmentNeeded,
}

impl From<Status> for DevelopmentReadiness {
    fn from(status: Status) -> Self {
        match status {
            Status::Excellent => Self::ReadyForDevelopment,
            Status::Good => Self::MinorImprovementsNeeded,
            Status::Moderate => Self::MajorImprovementsRequired,
            Status::Poor => Self::ComprehensiveDevelopmentNeeded,
        }
    }
}

/// Priority of a recommendation. Variant order is display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Must be addressed before development.
    Urgent,
    /// Improvement worth planning for.
    Standard,
    /// Conditions are good; keep them that way.
    Maintain,
}

/// A single advisory recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Human-readable recommendation text.
    pub text: String,
    /// How urgently this should be acted on.
    pub priority: Priority,
    /// Criteria this recommendation addresses. More than one for
    /// cross-criterion recommendations.
    pub criteria: BTreeSet<Criterion>,
}

impl Recommendation {
    /// Creates a recommendation for a single criterion.
    #[must_use]
    pub fn single(criterion: Criterion, priority: Priority, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority,
            criteria: BTreeSet::from([criterion]),
        }
    }

    /// Whether this recommendation spans more than one criterion.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        self.criteria.len() > 1
    }

    /// Whether this recommendation addresses the given criterion.
    #[must_use]
    pub fn involves(&self, criterion: &Criterion) -> bool {
        self.criteria.contains(criterion)
    }
}

/// The aggregated result for one criterion within an analysis area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
    /// Which criterion this result is for.
    pub criterion: Criterion,
    /// Mean normalized value of the contained points (0-100).
    pub score: f64,
    /// Status classified from `score`.
    pub status: Status,
    /// Criterion-specific display caption for `status`.
    pub caption: String,
    /// Number of dataset points inside the area.
    pub point_count: usize,
    /// Lowest contained value.
    pub min: f64,
    /// Highest contained value.
    pub max: f64,
    /// Breakdown of the contained points' numeric attributes (raw
    /// measurements and sub-indicators), keyed by attribute name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, MetricSummary>,
    /// Recommendations for this criterion, most urgent first.
    pub recommendations: Vec<Recommendation>,
}

/// Statistics of one numeric attribute over the points inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    /// Number of contained points carrying the attribute.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Lowest value.
    pub min: f64,
    /// Highest value.
    pub max: f64,
}

impl MetricSummary {
    /// Summary of a single observation.
    #[must_use]
    pub const fn of(value: f64) -> Self {
        Self {
            count: 1,
            mean: value,
            min: value,
            max: value,
        }
    }

    /// Folds `other` in, weighting each mean by its count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(self, other: Self) -> Self {
        let count = self.count + other.count;
        let mean = if count == 0 {
            0.0
        } else {
            (self.mean * self.count as f64 + other.mean * other.count as f64) / count as f64
        };
        Self {
            count,
            mean,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Why a criterion could not be scored for an area.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    /// No dataset is loaded for this criterion.
    NoDataset,
    /// A dataset is loaded but contains no points.
    EmptyDataset,
    /// None of the dataset's points fall inside the area.
    NoPointsInArea,
}

/// Overall assessment of an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallAssessment {
    /// At least one criterion had data.
    #[serde(rename_all = "camelCase")]
    Scored {
        /// Unweighted mean of the available criterion scores.
        score: f64,
        /// Status classified from `score`.
        status: Status,
        /// Readiness derived from `status`.
        readiness: DevelopmentReadiness,
    },
    /// No criterion had any point inside the area. Distinct from a low
    /// score: the area simply cannot be assessed.
    InsufficientData,
}

/// The complete analysis report for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResult {
    /// Overall score and status, or insufficient data.
    pub assessment: OverallAssessment,
    /// Geodesic area of the analyzed polygon in square kilometers.
    pub area_km2: f64,
    /// Total number of contained points across all criteria.
    pub analysis_points: usize,
    /// Results for every criterion that had data.
    pub per_criterion: BTreeMap<Criterion, CriterionResult>,
    /// Criteria that could not be scored, with the reason.
    pub unavailable: BTreeMap<Criterion, UnavailableReason>,
    /// Cross-criterion and per-criterion recommendations, most urgent
    /// first.
    pub global_recommendations: Vec<Recommendation>,
}

impl CompositeResult {
    /// Returns the overall score, or `None` for insufficient data.
    #[must_use]
    pub const fn overall_score(&self) -> Option<f64> {
        match self.assessment {
            OverallAssessment::Scored { score, .. } => Some(score),
            OverallAssessment::InsufficientData => None,
        }
    }

    /// Returns the overall status, or `None` for insufficient data.
    #[must_use]
    pub const fn overall_status(&self) -> Option<Status> {
        match self.assessment {
            OverallAssessment::Scored { status, .. } => Some(status),
            OverallAssessment::InsufficientData => None,
        }
    }

    /// Whether no criterion had data for this area.
    #[must_use]
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self.assessment, OverallAssessment::InsufficientData)
    }

    /// Whether some, but not all, evaluated criteria were unavailable.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.per_criterion.is_empty() && !self.unavailable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries_resolve_upward() {
        assert_eq!(Status::from_score(100.0), Status::Excellent);
        assert_eq!(Status::from_score(80.0), Status::Excellent);
        assert_eq!(Status::from_score(79.999), Status::Good);
        assert_eq!(Status::from_score(60.0), Status::Good);
        assert_eq!(Status::from_score(59.999), Status::Moderate);
        assert_eq!(Status::from_score(40.0), Status::Moderate);
        assert_eq!(Status::from_score(39.999), Status::Poor);
        assert_eq!(Status::from_score(0.0), Status::Poor);
    }

    #[test]
    fn resolve_known_names_and_aliases() {
        assert_eq!(Criterion::resolve("air_quality"), Criterion::AirQuality);
        assert_eq!(Criterion::resolve("Air Quality"), Criterion::AirQuality);
        assert_eq!(
            Criterion::resolve("nightlights"),
            Criterion::EconomicActivity
        );
        assert_eq!(
            Criterion::resolve("population-density"),
            Criterion::Population
        );
        assert_eq!(
            Criterion::resolve("noise_levels"),
            Criterion::Unregistered("noise_levels".to_string())
        );
    }

    #[test]
    fn registered_ids_roundtrip_through_resolve() {
        for criterion in Criterion::REGISTERED {
            assert!(criterion.is_registered());
            assert_eq!(&Criterion::resolve(criterion.id()), criterion);
        }
    }

    #[test]
    fn unregistered_sorts_after_known_criteria() {
        let unknown = Criterion::Unregistered("aaa".to_string());
        for criterion in Criterion::REGISTERED {
            assert!(criterion < &unknown);
        }
    }

    #[test]
    fn every_known_criterion_has_distinct_captions() {
        for criterion in Criterion::REGISTERED {
            let captions: BTreeSet<String> = Status::all()
                .iter()
                .map(|s| criterion.status_caption(*s))
                .collect();
            assert_eq!(captions.len(), 4, "{criterion} reuses a caption");
        }
    }

    #[test]
    fn captions_use_display_wording() {
        assert_eq!(
            Criterion::Infrastructure.status_caption(Status::Moderate),
            "Limited Infrastructure Access"
        );
        assert_eq!(
            Criterion::Infrastructure.status_caption(Status::Poor),
            "Poor Infrastructure Access"
        );
        assert_eq!(
            Criterion::Topography.status_caption(Status::Good),
            "Good Development Terrain"
        );
        assert_eq!(
            Criterion::Topography.status_caption(Status::Poor),
            "Difficult Terrain Conditions"
        );
    }

    #[test]
    fn priority_orders_urgent_first() {
        let mut priorities = vec![Priority::Maintain, Priority::Urgent, Priority::Standard];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::Urgent, Priority::Standard, Priority::Maintain]
        );
    }

    #[test]
    fn metric_summaries_merge_by_count() {
        let merged = MetricSummary {
            count: 3,
            mean: 10.0,
            min: 5.0,
            max: 15.0,
        }
        .merge(MetricSummary::of(30.0));

        assert_eq!(merged.count, 4);
        assert!((merged.mean - 15.0).abs() < 1e-9);
        assert!((merged.min - 5.0).abs() < f64::EPSILON);
        assert!((merged.max - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn readiness_follows_status() {
        assert_eq!(
            DevelopmentReadiness::from(Status::Excellent),
            DevelopmentReadiness::ReadyForDevelopment
        );
        assert_eq!(
            DevelopmentReadiness::from(Status::Poor),
            DevelopmentReadiness::ComprehensiveDevelopmentNeeded
        );
    }
}
