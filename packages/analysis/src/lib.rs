#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area suitability analysis engine.
//!
//! Given a user-drawn polygon, [`AreaAnalyzer`] finds the points of every
//! criterion dataset inside it, aggregates them into 0-100 scores,
//! classifies each score, combines the available scores into an overall
//! assessment, and synthesizes prioritized recommendations.
//!
//! Missing data is never scored as zero: a criterion without contained
//! points is reported as unavailable, and an area with no data at all is
//! [`OverallAssessment::InsufficientData`].
//!
//! [`OverallAssessment::InsufficientData`]: suitability_map_criteria_models::OverallAssessment::InsufficientData

pub mod aggregate;
pub mod composite;
pub mod orchestrator;
pub mod recommend;

use std::time::Instant;

use suitability_map_spatial::AreaError;
use thiserror::Error;

pub use orchestrator::{AreaAnalyzer, Phase};
pub use suitability_map_spatial::DEFAULT_TOLERANCE_DEGREES;

/// Reasons an analysis request is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The polygon failed validation.
    #[error("Invalid analysis area: {0}")]
    InvalidArea(#[from] AreaError),

    /// The caller's deadline passed before the analysis started.
    #[error("Analysis deadline already passed")]
    DeadlineExceeded,
}

/// Per-request settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Boundary tolerance in degrees.
    pub tolerance_degrees: f64,
    /// Reject the request if it starts at or after this instant.
    pub deadline: Option<Instant>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            tolerance_degrees: DEFAULT_TOLERANCE_DEGREES,
            deadline: None,
        }
    }
}
