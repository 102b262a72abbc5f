#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for area suitability analysis.
//!
//! Loads the point store once at startup and serves analyses of
//! user-drawn polygons from `POST /api/analyze`. The store is shared
//! read-only across workers.

mod handlers;
pub mod interactive;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use suitability_map_analysis::{AnalysisOptions, AreaAnalyzer};
use suitability_map_store::{NullProgress, PointStore, StoreError};

/// Environment variable naming a dataset manifest to load instead of the
/// bundled datasets.
pub const MANIFEST_ENV: &str = "SUITABILITY_MANIFEST";

/// Shared application state.
pub struct AppState {
    /// Analyzer over the loaded point store.
    pub analyzer: AreaAnalyzer,
    /// Defaults applied to every request.
    pub options: AnalysisOptions,
}

impl AppState {
    /// Creates state over `store` with default options.
    #[must_use]
    pub fn new(store: Arc<PointStore>) -> Self {
        Self {
            analyzer: AreaAnalyzer::new(store),
            options: AnalysisOptions::default(),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/criteria", web::get().to(handlers::criteria))
            .route("/analyze", web::post().to(handlers::analyze)),
    );
}

/// Loads the point store named by [`MANIFEST_ENV`], or the bundled
/// datasets when it is unset.
///
/// # Errors
///
/// Returns a [`StoreError`] if the manifest or any dataset fails to load.
pub fn load_store_from_env() -> Result<PointStore, StoreError> {
    match std::env::var(MANIFEST_ENV) {
        Ok(path) if !path.is_empty() => {
            log::info!("Loading datasets from {path}");
            PointStore::load(Path::new(&path), &NullProgress)
        }
        _ => {
            log::info!("Loading bundled datasets");
            PointStore::load_default(&NullProgress)
        }
    }
}

/// Starts the API server over `store`.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`).
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(store: Arc<PointStore>) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(store));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
