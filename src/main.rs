// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metro Favorites API Server
//!
//! Saves favorite venues per metro station and serves public share
//! snapshots of them.

use metro_favorites::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{PlacesClient, StationCatalog},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Metro Favorites API");

    // Select the document store
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    // Load the station catalog
    let catalog = match &config.stations_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading stations");
            StationCatalog::load_from_file(path)?
        }
        None => StationCatalog::bundled()?,
    };

    let places = PlacesClient::new(
        config.google_maps_api_key.clone(),
        config.places_language.clone(),
        Duration::from_secs(config.places_timeout_secs),
    )?;

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::new(catalog),
        Arc::new(places),
    ));

    // Build router
    let app = metro_favorites::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("metro_favorites=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
