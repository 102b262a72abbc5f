#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for area suitability analysis.
//!
//! `analyze` scores a polygon and prints the report as JSON, `datasets`
//! lists what the point store holds, and `serve` starts the HTTP API.
//! Without a subcommand an interactive menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`suitability_map_cli_utils::init_logger`])
//! so dataset loading progress and log lines share the terminal cleanly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use suitability_map_analysis::{AnalysisOptions, AreaAnalyzer, DEFAULT_TOLERANCE_DEGREES};
use suitability_map_cli_utils::{IndicatifProgress, MultiProgress};
use suitability_map_criteria_models::CompositeResult;
use suitability_map_store::{DatasetSummary, PointStore};

#[derive(Parser)]
#[command(name = "suitability_map", about = "Area suitability analysis tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a polygon and print the report as JSON
    Analyze {
        /// `GeoJSON` file holding a Polygon (or a Feature wrapping one)
        #[arg(long, conflicts_with = "vertices", required_unless_present = "vertices")]
        polygon: Option<PathBuf>,

        /// Vertices as `lat,lon;lat,lon;...`
        #[arg(long, value_parser = parse_vertices)]
        vertices: Option<VertexList>,

        /// Dataset manifest (defaults to the bundled datasets)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Boundary tolerance in degrees
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_DEGREES)]
        tolerance: f64,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
    /// List loaded datasets with point counts and coverage
    Datasets {
        /// Dataset manifest (defaults to the bundled datasets)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Start the HTTP API server
    Serve {
        /// Dataset manifest (defaults to the bundled datasets)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

/// `(latitude, longitude)` vertices parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
struct VertexList(Vec<(f64, f64)>);

fn parse_vertices(s: &str) -> Result<VertexList, String> {
    s.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (lat, lon) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected 'lat,lon', got '{pair}'"))?;
            let lat: f64 = lat
                .trim()
                .parse()
                .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
            let lon: f64 = lon
                .trim()
                .parse()
                .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
            Ok((lat, lon))
        })
        .collect::<Result<Vec<_>, String>>()
        .map(VertexList)
}

/// Interactive menu entries.
enum Tool {
    Analyze,
    Datasets,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Analyze, Self::Datasets, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Analyze an area",
            Self::Datasets => "List datasets",
            Self::Server => "Start server",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = suitability_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Analyze {
            polygon,
            vertices,
            manifest,
            tolerance,
            pretty,
        }) => {
            let store = load_store(manifest.as_deref(), &multi)?;
            let analyzer = AreaAnalyzer::new(Arc::new(store));
            let options = AnalysisOptions {
                tolerance_degrees: tolerance,
                ..AnalysisOptions::default()
            };

            let result = match (polygon, vertices) {
                (Some(path), _) => {
                    let geojson = std::fs::read_to_string(&path)?;
                    analyzer.analyze_geojson(&geojson, &options)?
                }
                (None, Some(VertexList(vertices))) => analyzer.analyze(&vertices, &options)?,
                (None, None) => return Err("either --polygon or --vertices is required".into()),
            };

            print_report(&result, pretty)?;
        }
        Some(Commands::Datasets { manifest }) => {
            let store = load_store(manifest.as_deref(), &multi)?;
            print_datasets(&store.summaries());
        }
        Some(Commands::Serve { manifest }) => {
            let store = load_store(manifest.as_deref(), &multi)?;
            actix_web::rt::System::new()
                .block_on(suitability_map_server::run_server(Arc::new(store)))?;
        }
        None => interactive(&multi)?,
    }

    Ok(())
}

fn interactive(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Suitability Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Analyze => {
            let input: String = Input::new()
                .with_prompt("Vertices (lat,lon;lat,lon;...)")
                .interact_text()?;
            let VertexList(vertices) = parse_vertices(&input)?;

            let store = load_store(None, multi)?;
            let analyzer = AreaAnalyzer::new(Arc::new(store));
            let result = analyzer.analyze(&vertices, &AnalysisOptions::default())?;
            print_report(&result, true)?;
        }
        Tool::Datasets => {
            let store = load_store(None, multi)?;
            print_datasets(&store.summaries());
        }
        Tool::Server => {
            actix_web::rt::System::new()
                .block_on(suitability_map_server::interactive::run())
                .map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}

fn load_store(
    manifest: Option<&Path>,
    multi: &MultiProgress,
) -> Result<PointStore, suitability_map_store::StoreError> {
    let progress = IndicatifProgress::datasets_bar(multi);
    match manifest {
        Some(path) => PointStore::load(path, progress.as_ref()),
        None => PointStore::load_default(progress.as_ref()),
    }
}

fn print_report(result: &CompositeResult, pretty: bool) -> Result<(), serde_json::Error> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

fn print_datasets(summaries: &[DatasetSummary]) {
    println!(
        "{:<20} {:>8}  {:<16} COVERAGE (lat, lon)",
        "CRITERION", "POINTS", "UNIT"
    );
    for summary in summaries {
        let coverage = summary.coverage.map_or_else(
            || "-".to_string(),
            |c| {
                format!(
                    "{:.3}..{:.3}, {:.3}..{:.3}",
                    c.min_latitude, c.max_latitude, c.min_longitude, c.max_longitude
                )
            },
        );
        let units = summary
            .sources
            .iter()
            .map(|s| s.unit_label.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        println!(
            "{:<20} {:>8}  {:<16} {coverage}",
            summary.criterion.id(),
            summary.point_count,
            units
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn parses_vertex_lists() {
        let VertexList(vertices) = parse_vertices("35.55,45.40; 35.55,45.41;35.56, 45.41;").unwrap();
        assert_eq!(
            vertices,
            vec![(35.55, 45.40), (35.55, 45.41), (35.56, 45.41)]
        );
    }

    #[test]
    fn rejects_malformed_vertices() {
        assert!(parse_vertices("35.55;45.40").is_err());
        assert!(parse_vertices("north,45.40").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_requires_an_area() {
        assert!(Cli::try_parse_from(["suitability_map", "analyze"]).is_err());
        assert!(
            Cli::try_parse_from(["suitability_map", "analyze", "--vertices", "1,2;3,4;5,7"])
                .is_ok()
        );
    }
}
