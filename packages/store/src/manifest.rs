//! Dataset manifests: which files feed which criterion, and how their raw
//! values are normalized.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use suitability_map_criteria_models::{Criterion, NormalizationRule};

/// Manifest describing the standard datasets shipped with this crate.
///
/// Baked into the binary at compile time; its paths are relative to
/// [`crate::default_data_dir`].
pub const DEFAULT_MANIFEST: &str = include_str!("../datasets/default.toml");

/// A set of dataset sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// One entry per source file.
    #[serde(default)]
    pub datasets: Vec<DatasetSource>,
}

/// One CSV file contributing points to a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    /// Criterion name, resolved through [`Criterion::resolve`].
    pub criterion: Criterion,
    /// CSV path, relative to the manifest's directory unless absolute.
    pub path: PathBuf,
    /// Unit of the raw values.
    pub unit_label: String,
    /// Column holding latitudes.
    #[serde(default = "default_latitude_column")]
    pub latitude_column: String,
    /// Column holding longitudes.
    #[serde(default = "default_longitude_column")]
    pub longitude_column: String,
    /// Column holding raw values.
    pub value_column: String,
    /// Extra numeric columns copied into each point's metadata and
    /// summarized in analysis details. Blank cells are skipped.
    #[serde(default)]
    pub metadata_columns: Vec<String>,
    /// When set, only rows whose value in this column equals the column's
    /// maximum are loaded (e.g. the latest date of a time series).
    #[serde(default)]
    pub snapshot_column: Option<String>,
    /// Raw-to-score conversion.
    #[serde(default)]
    pub normalization: NormalizationRule,
}

fn default_latitude_column() -> String {
    "lat".to_string()
}

fn default_longitude_column() -> String {
    "lon".to_string()
}

/// Parses a manifest from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or doesn't match the
/// [`DatasetManifest`] schema.
pub fn parse_manifest(toml_str: &str) -> Result<DatasetManifest, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns the embedded default manifest.
///
/// # Errors
///
/// Returns an error if the embedded TOML is malformed (caught by tests).
pub fn default_manifest() -> Result<DatasetManifest, toml::de::Error> {
    parse_manifest(DEFAULT_MANIFEST)
}
