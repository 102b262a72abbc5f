#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geo point store.
//!
//! Holds the normalized, R-tree indexed point datasets of every criterion,
//! one per source. A store is built once (from a TOML manifest of CSV sources, or directly
//! from datasets) and is immutable afterwards, so it can be shared across
//! concurrent analyses behind an `Arc` without locking.

pub mod loader;
pub mod manifest;
pub mod progress;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use suitability_map_criteria_models::{
    Coverage, Criterion, CriterionDataset, InvalidNormalizationError, InvalidPointError,
    SourceSummary,
};
use suitability_map_spatial::PointIndex;
use thiserror::Error;

pub use manifest::{DEFAULT_MANIFEST, DatasetManifest, DatasetSource};
pub use progress::{NullProgress, ProgressCallback, null_progress};

/// Errors that can occur while loading datasets.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A manifest or data file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The CSV reader failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The manifest is not valid TOML or doesn't match the schema.
    #[error("Invalid dataset manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    /// A configured column is absent from the CSV header.
    #[error("{origin}: missing column '{column}'")]
    MissingColumn {
        /// Input being read.
        origin: String,
        /// Column name.
        column: String,
    },

    /// A cell that must be numeric isn't.
    #[error("{origin}:{line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        /// Input being read.
        origin: String,
        /// 1-based line number.
        line: usize,
        /// Column name.
        column: String,
        /// Offending cell.
        value: String,
    },

    /// A pre-normalized value lies outside 0-100.
    #[error("{origin}:{line}: value {value} is outside the 0-100 scale")]
    ValueOutOfRange {
        /// Input being read.
        origin: String,
        /// 1-based line number.
        line: usize,
        /// Offending value.
        value: f64,
    },

    /// A point failed dataset validation.
    #[error(transparent)]
    InvalidPoint(#[from] InvalidPointError),

    /// A normalization rule is unusable.
    #[error(transparent)]
    InvalidNormalization(#[from] InvalidNormalizationError),

    /// The same file is listed twice for one criterion.
    #[error("{path} is listed more than once for {criterion}")]
    DuplicateDataset {
        /// Criterion of the duplicated entry.
        criterion: Criterion,
        /// Duplicated path.
        path: String,
    },
}

/// Directory holding the standard datasets named by
/// [`manifest::DEFAULT_MANIFEST`].
#[must_use]
pub fn default_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("datasets")
}

/// A dataset together with its spatial index.
#[derive(Debug)]
pub struct IndexedDataset {
    dataset: CriterionDataset,
    index: PointIndex,
}

impl IndexedDataset {
    /// Indexes `dataset`.
    #[must_use]
    pub fn new(dataset: CriterionDataset) -> Self {
        let index = PointIndex::build(dataset.points());
        Self { dataset, index }
    }

    /// The underlying dataset.
    #[must_use]
    pub const fn dataset(&self) -> &CriterionDataset {
        &self.dataset
    }

    /// R-tree over the dataset's point positions.
    #[must_use]
    pub const fn index(&self) -> &PointIndex {
        &self.index
    }
}

/// Description of the datasets loaded for one criterion, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// Criterion identifier.
    pub criterion: Criterion,
    /// Human-readable criterion name.
    pub label: String,
    /// Each source in manifest order.
    pub sources: Vec<SourceSummary>,
    /// Number of points across all sources.
    pub point_count: usize,
    /// Bounding box of all points, if any.
    pub coverage: Option<Coverage>,
}

/// Immutable per-criterion point collections.
#[derive(Debug, Default)]
pub struct PointStore {
    datasets: BTreeMap<Criterion, Vec<IndexedDataset>>,
}

impl PointStore {
    /// Creates a store with no datasets.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a store from already-normalized datasets. Datasets sharing a
    /// criterion are kept as separate sources, in input order.
    #[must_use]
    pub fn from_datasets(datasets: impl IntoIterator<Item = CriterionDataset>) -> Self {
        let mut grouped: BTreeMap<Criterion, Vec<IndexedDataset>> = BTreeMap::new();
        for dataset in datasets {
            grouped
                .entry(dataset.criterion.clone())
                .or_default()
                .push(IndexedDataset::new(dataset));
        }

        Self { datasets: grouped }
    }

    /// Loads every source listed in the manifest file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the manifest or any data file can't be
    /// read or parsed.
    pub fn load(path: &Path, progress: &dyn ProgressCallback) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let manifest = manifest::parse_manifest(&contents)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        Self::from_manifest(&manifest, base_dir, progress)
    }

    /// Loads the standard datasets shipped with this crate.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a bundled file is missing or malformed.
    pub fn load_default(progress: &dyn ProgressCallback) -> Result<Self, StoreError> {
        let manifest = manifest::default_manifest()?;
        Self::from_manifest(&manifest, &default_data_dir(), progress)
    }

    /// Loads every source in `manifest`, resolving relative paths against
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] for the first source that fails to load, or
    /// if a source is listed twice.
    pub fn from_manifest(
        manifest: &DatasetManifest,
        base_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, StoreError> {
        let mut seen = BTreeSet::new();
        for source in &manifest.datasets {
            if !seen.insert((source.criterion.clone(), source.path.clone())) {
                return Err(StoreError::DuplicateDataset {
                    criterion: source.criterion.clone(),
                    path: source.path.display().to_string(),
                });
            }
        }

        progress.set_total(manifest.datasets.len() as u64);

        let mut datasets = Vec::with_capacity(manifest.datasets.len());
        for source in &manifest.datasets {
            progress.set_message(format!("{} ({})", source.criterion, source.path.display()));
            datasets.push(loader::load_source(source, base_dir)?);
            progress.inc(1);
        }

        let store = Self::from_datasets(datasets);
        progress.finish(format!("Loaded {} criteria", store.len()));

        log::info!(
            "Loaded {} criteria ({} points) from {} source(s)",
            store.len(),
            store.total_points(),
            manifest.datasets.len()
        );

        Ok(store)
    }

    /// Returns the sources loaded for `criterion`, if any.
    #[must_use]
    pub fn get(&self, criterion: &Criterion) -> Option<&[IndexedDataset]> {
        self.datasets.get(criterion).map(Vec::as_slice)
    }

    /// Criteria with a loaded dataset, in relevance order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.datasets.keys()
    }

    /// Number of criteria with a dataset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether no dataset is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Total number of points across all datasets.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.datasets
            .values()
            .flatten()
            .map(|d| d.dataset.len())
            .sum()
    }

    /// Describes the datasets of `criterion`, if any were loaded.
    #[must_use]
    pub fn summary(&self, criterion: &Criterion) -> Option<DatasetSummary> {
        let sources = self.datasets.get(criterion)?;
        Some(DatasetSummary {
            criterion: criterion.clone(),
            label: criterion.label().to_string(),
            sources: sources.iter().map(|d| d.dataset.source_summary()).collect(),
            point_count: sources.iter().map(|d| d.dataset.len()).sum(),
            coverage: sources
                .iter()
                .filter_map(|d| d.dataset.coverage())
                .reduce(Coverage::union),
        })
    }

    /// Describes every loaded criterion.
    #[must_use]
    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.datasets
            .keys()
            .filter_map(|criterion| self.summary(criterion))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use suitability_map_criteria_models::{GeoPoint, NormalizationRule};

    use super::*;

    fn dataset(criterion: Criterion, values: &[f64]) -> CriterionDataset {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| GeoPoint::new(35.55 + 0.001 * i as f64, 45.40, v))
            .collect();
        CriterionDataset::new(criterion, "score", NormalizationRule::Identity, points).unwrap()
    }

    #[test]
    fn keeps_sources_of_the_same_criterion_apart() {
        let store = PointStore::from_datasets([
            dataset(Criterion::HeatGreenspace, &[10.0, 20.0]),
            dataset(Criterion::HeatGreenspace, &[30.0]),
            dataset(Criterion::AirQuality, &[50.0]),
        ]);

        assert_eq!(store.len(), 2);
        let heat = store.get(&Criterion::HeatGreenspace).unwrap();
        assert_eq!(heat.len(), 2);
        assert_eq!(heat[0].dataset().len(), 2);
        assert_eq!(heat[0].index().len(), 2);
        assert_eq!(heat[1].dataset().len(), 1);
        assert_eq!(store.total_points(), 4);
    }

    #[test]
    fn criteria_iterate_in_relevance_order() {
        let store = PointStore::from_datasets([
            dataset(Criterion::Topography, &[1.0]),
            dataset(Criterion::Unregistered("noise".to_string()), &[1.0]),
            dataset(Criterion::AirQuality, &[1.0]),
        ]);
        let order: Vec<&Criterion> = store.criteria().collect();
        assert_eq!(order[0], &Criterion::AirQuality);
        assert_eq!(order[1], &Criterion::Topography);
        assert!(!order[2].is_registered());
    }

    #[test]
    fn rejects_duplicate_sources() {
        let manifest = manifest::parse_manifest(
            r#"
            [[datasets]]
            criterion = "topography"
            path = "t.csv"
            unit_label = "%"
            value_column = "v"

            [[datasets]]
            criterion = "terrain"
            path = "t.csv"
            unit_label = "%"
            value_column = "v"
            "#,
        )
        .unwrap();

        let err = PointStore::from_manifest(&manifest, Path::new("."), &NullProgress).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDataset { .. }));
    }

    #[test]
    fn loads_bundled_datasets() {
        let store = PointStore::load_default(&NullProgress).unwrap();

        for criterion in Criterion::REGISTERED {
            let sources = store.get(criterion).unwrap();
            assert!(
                sources.iter().all(|s| !s.dataset().is_empty()),
                "{criterion} has an empty source"
            );
        }

        // Air quality keeps only its latest monthly snapshot.
        let aq = store.get(&Criterion::AirQuality).unwrap();
        assert_eq!(aq.len(), 1);
        assert_eq!(aq[0].dataset().len(), 13 * 15);

        // Heat & greenspace has separate temperature and vegetation sources.
        let heat = store.summary(&Criterion::HeatGreenspace).unwrap();
        let units: Vec<&str> = heat.sources.iter().map(|s| s.unit_label.as_str()).collect();
        assert_eq!(units, vec!["°C", "NDVI"]);
        assert_ne!(heat.sources[0].normalization, heat.sources[1].normalization);
        assert_eq!(heat.point_count, 2 * 13 * 15);
    }

    #[test]
    fn summaries_report_sources_and_coverage() {
        let store = PointStore::from_datasets([
            dataset(Criterion::Population, &[10.0, 20.0]),
            dataset(Criterion::Population, &[30.0, 40.0, 50.0]),
        ]);
        let summaries = store.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].point_count, 5);
        assert_eq!(summaries[0].sources.len(), 2);
        assert_eq!(summaries[0].sources[1].point_count, 3);
        assert_eq!(summaries[0].label, "Population Density");

        let coverage = summaries[0].coverage.unwrap();
        assert!((coverage.max_latitude - 35.552).abs() < 1e-9);
    }
}
