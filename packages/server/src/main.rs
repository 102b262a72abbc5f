#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for area suitability analysis.
//!
//! Datasets come from the manifest named by `SUITABILITY_MANIFEST`, or the
//! bundled Sulaimani datasets when it is unset.

use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let store = suitability_map_server::load_store_from_env()?;
    suitability_map_server::run_server(Arc::new(store)).await?;

    Ok(())
}
