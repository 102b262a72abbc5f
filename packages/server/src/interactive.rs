//! Interactive mode for the server.
//!
//! Prompts for the bind address, port, and dataset manifest before
//! starting the server.

use std::path::Path;
use std::sync::Arc;

use dialoguer::{Confirm, Input};
use suitability_map_store::{NullProgress, PointStore};

/// Prompts for server configuration, loads the datasets, and runs
/// [`super::run_server`].
///
/// An empty manifest answer uses the bundled datasets.
///
/// # Errors
///
/// Returns an error if the datasets fail to load or the server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("Suitability Map Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default("8080".to_string())
        .interact_text()
        .unwrap_or_else(|_| "8080".to_string());

    let manifest: String = Input::new()
        .with_prompt("Dataset manifest (empty for bundled datasets)")
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();

    // SAFETY: single-threaded at this point; read once by `run_server`.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    let store = if manifest.trim().is_empty() {
        PointStore::load_default(&NullProgress)?
    } else {
        PointStore::load(Path::new(manifest.trim()), &NullProgress)?
    };

    super::run_server(Arc::new(store)).await?;
    Ok(())
}
