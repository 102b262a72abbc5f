#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the suitability map server.
//!
//! Analysis results are returned as
//! [`suitability_map_criteria_models::CompositeResult`] directly; the types
//! here cover requests, listings, and errors.

use serde::{Deserialize, Serialize};
use suitability_map_criteria_models::{Coverage, Criterion, SourceSummary};

/// Body of `POST /api/analyze`.
///
/// Exactly one of `vertices` or `geojson` must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Polygon vertices as `[latitude, longitude]` pairs.
    #[serde(default)]
    pub vertices: Option<Vec<[f64; 2]>>,
    /// A `GeoJSON` `Polygon` geometry or a `Feature` wrapping one.
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
    /// Boundary tolerance in degrees. Defaults to the server's setting.
    #[serde(default)]
    pub tolerance_degrees: Option<f64>,
}

/// A criterion as listed by `GET /api/criteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCriterionInfo {
    /// Criterion identifier.
    pub id: Criterion,
    /// Human-readable name.
    pub label: String,
    /// Whether recommendation rules exist for this criterion.
    pub registered: bool,
    /// Whether a dataset is loaded for it.
    pub available: bool,
    /// Loaded sources with their units and conversions. Empty when no
    /// dataset is loaded.
    pub sources: Vec<SourceSummary>,
    /// Number of loaded points.
    pub point_count: usize,
    /// Extent of the loaded points.
    pub coverage: Option<Coverage>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
