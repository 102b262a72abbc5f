//! CSV loading and normalization of a single dataset source.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use suitability_map_criteria_models::{CriterionDataset, GeoPoint, NormalizationRule};

use crate::StoreError;
use crate::manifest::DatasetSource;

/// Loads one source file, resolving relative paths against `base_dir`.
///
/// # Errors
///
/// Returns a [`StoreError`] if the file can't be read or any row is
/// malformed.
pub fn load_source(source: &DatasetSource, base_dir: &Path) -> Result<CriterionDataset, StoreError> {
    let path = if source.path.is_absolute() {
        source.path.clone()
    } else {
        base_dir.join(&source.path)
    };

    log::debug!("Loading {} from {}", source.criterion, path.display());

    let file = std::fs::File::open(&path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    read_source(source, file, &path.display().to_string())
}

/// Reads one source from any CSV reader. `origin` names the input in
/// error messages.
///
/// # Errors
///
/// Returns a [`StoreError`] if a required column is missing, a number
/// doesn't parse, or a value falls outside the 0-100 scale after
/// normalization.
pub fn read_source<R: Read>(
    source: &DatasetSource,
    reader: R,
    origin: &str,
) -> Result<CriterionDataset, StoreError> {
    source.normalization.validate()?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StoreError::MissingColumn {
                origin: origin.to_string(),
                column: name.to_string(),
            })
    };

    let lat_idx = column(&source.latitude_column)?;
    let lon_idx = column(&source.longitude_column)?;
    let value_idx = column(&source.value_column)?;
    let snapshot_idx = source.snapshot_column.as_deref().map(column).transpose()?;
    let metadata_idx = source
        .metadata_columns
        .iter()
        .map(|name| column(name).map(|idx| (name.clone(), idx)))
        .collect::<Result<Vec<_>, _>>()?;

    let records = reader.records().collect::<Result<Vec<StringRecord>, _>>()?;

    let snapshot = snapshot_idx.and_then(|idx| {
        records
            .iter()
            .filter_map(|r| r.get(idx))
            .filter(|v| !v.is_empty())
            .max_by(|a, b| compare_snapshot(a, b))
            .map(|v| (idx, v.to_string()))
    });
    if let Some((_, latest)) = &snapshot {
        log::debug!("{origin}: keeping snapshot {latest}");
    }

    let mut points = Vec::with_capacity(records.len());
    let mut skipped = 0_usize;

    for (offset, record) in records.iter().enumerate() {
        // Header is line 1.
        let line = offset + 2;

        if let Some((idx, latest)) = &snapshot
            && record.get(*idx) != Some(latest.as_str())
        {
            continue;
        }

        let raw_value = record.get(value_idx).unwrap_or_default();
        if is_missing(raw_value) {
            skipped += 1;
            continue;
        }

        let latitude = parse_number(record, lat_idx, &source.latitude_column, line, origin)?;
        let longitude = parse_number(record, lon_idx, &source.longitude_column, line, origin)?;
        let raw = parse_number(record, value_idx, &source.value_column, line, origin)?;

        if source.normalization == NormalizationRule::Identity && !(0.0..=100.0).contains(&raw) {
            return Err(StoreError::ValueOutOfRange {
                origin: origin.to_string(),
                line,
                value: raw,
            });
        }

        let mut metadata = BTreeMap::new();
        for (name, idx) in &metadata_idx {
            if is_missing(record.get(*idx).unwrap_or_default()) {
                continue;
            }
            metadata.insert(name.clone(), parse_number(record, *idx, name, line, origin)?);
        }
        if source.normalization != NormalizationRule::Identity {
            metadata.insert(source.value_column.clone(), raw);
        }

        points.push(GeoPoint {
            latitude,
            longitude,
            value: source.normalization.normalize(raw),
            metadata,
        });
    }

    if skipped > 0 {
        log::warn!("{origin}: skipped {skipped} row(s) with no value");
    }

    log::debug!("{origin}: loaded {} point(s)", points.len());

    Ok(CriterionDataset::new(
        source.criterion.clone(),
        source.unit_label.clone(),
        source.normalization,
        points,
    )?)
}

fn parse_number(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: usize,
    origin: &str,
) -> Result<f64, StoreError> {
    let raw = record.get(idx).unwrap_or_default();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StoreError::InvalidNumber {
            origin: origin.to_string(),
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

/// Orders snapshot keys numerically when both parse as numbers, otherwise
/// lexicographically (ISO-8601 dates sort correctly either way).
fn compare_snapshot(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use suitability_map_criteria_models::Criterion;

    use super::*;

    fn source(value_column: &str, normalization: NormalizationRule) -> DatasetSource {
        DatasetSource {
            criterion: Criterion::AirQuality,
            path: PathBuf::from("test.csv"),
            unit_label: "AQI".to_string(),
            latitude_column: "lat".to_string(),
            longitude_column: "lon".to_string(),
            value_column: value_column.to_string(),
            metadata_columns: vec![],
            snapshot_column: None,
            normalization,
        }
    }

    #[test]
    fn normalizes_raw_values() {
        let csv = "lat,lon,aqi\n35.55,45.40,30\n35.56,45.41,80\n";
        let dataset = read_source(
            &source("aqi", NormalizationRule::LowerIsBetter { min: 0.0, max: 100.0 }),
            csv.as_bytes(),
            "test",
        )
        .unwrap();

        let values: Vec<f64> = dataset.points().iter().map(|p| p.value).collect();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 70.0).abs() < 1e-9);
        assert!((values[1] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_only_latest_snapshot() {
        let csv = "lat,lon,date,aqi\n\
                   35.55,45.40,2024-11-01,10\n\
                   35.55,45.40,2024-12-01,20\n\
                   35.56,45.41,2024-12-01,30\n\
                   35.56,45.41,2024-10-01,40\n";
        let mut src = source("aqi", NormalizationRule::Identity);
        src.snapshot_column = Some("date".to_string());

        let dataset = read_source(&src, csv.as_bytes(), "test").unwrap();
        let values: Vec<f64> = dataset.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![20.0, 30.0]);
    }

    #[test]
    fn numeric_snapshots_compare_numerically() {
        assert_eq!(compare_snapshot("9", "10"), Ordering::Less);
        assert_eq!(compare_snapshot("2024-09-01", "2024-10-01"), Ordering::Less);
    }

    #[test]
    fn captures_metadata_columns() {
        let csv = "lat,lon,score,schools\n35.55,45.40,60,3\n";
        let mut src = source("score", NormalizationRule::Identity);
        src.metadata_columns = vec!["schools".to_string()];

        let dataset = read_source(&src, csv.as_bytes(), "test").unwrap();
        assert_eq!(dataset.points()[0].metadata.get("schools"), Some(&3.0));
        // Identity values are the score already, so no raw copy is kept.
        assert!(!dataset.points()[0].metadata.contains_key("score"));
    }

    #[test]
    fn keeps_raw_measurement_for_converted_values() {
        let csv = "lat,lon,aqi\n35.55,45.40,30\n";
        let dataset = read_source(
            &source("aqi", NormalizationRule::LowerIsBetter { min: 0.0, max: 100.0 }),
            csv.as_bytes(),
            "test",
        )
        .unwrap();

        let point = &dataset.points()[0];
        assert_eq!(point.metadata.get("aqi"), Some(&30.0));
        assert!((point.value - 70.0).abs() < 1e-9);
    }

    #[test]
    fn skips_blank_metadata_and_rejects_non_numeric_metadata() {
        let mut src = source("score", NormalizationRule::Identity);
        src.metadata_columns = vec!["schools".to_string()];

        let csv = "lat,lon,score,schools\n35.55,45.40,60,\n";
        let dataset = read_source(&src, csv.as_bytes(), "test").unwrap();
        assert!(dataset.points()[0].metadata.is_empty());

        let csv = "lat,lon,score,schools\n35.55,45.40,60,many\n";
        let err = read_source(&src, csv.as_bytes(), "test").unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidNumber { line: 2, ref column, .. } if column == "schools")
        );
    }

    #[test]
    fn skips_rows_without_value() {
        let csv = "lat,lon,score\n35.55,45.40,\n35.56,45.41,nan\n35.57,45.42,50\n";
        let dataset =
            read_source(&source("score", NormalizationRule::Identity), csv.as_bytes(), "test")
                .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn rejects_identity_values_outside_scale() {
        let csv = "lat,lon,score\n35.55,45.40,50\n35.56,45.41,120\n";
        let err =
            read_source(&source("score", NormalizationRule::Identity), csv.as_bytes(), "test")
                .unwrap_err();
        assert!(matches!(err, StoreError::ValueOutOfRange { line: 3, .. }));
    }

    #[test]
    fn rejects_missing_columns() {
        let csv = "latitude,lon,score\n35.55,45.40,50\n";
        let err =
            read_source(&source("score", NormalizationRule::Identity), csv.as_bytes(), "test")
                .unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { ref column, .. } if column == "lat"));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let csv = "lat,lon,score\nnorth,45.40,50\n";
        let err =
            read_source(&source("score", NormalizationRule::Identity), csv.as_bytes(), "test")
                .unwrap_err();
        assert!(matches!(err, StoreError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let csv = "lat,lon,score\n135.55,45.40,50\n";
        let err =
            read_source(&source("score", NormalizationRule::Identity), csv.as_bytes(), "test")
                .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPoint(_)));
    }
}
