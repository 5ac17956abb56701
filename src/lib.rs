// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Metro Favorites: per-station favorite venues with public share snapshots
//!
//! This crate provides the backend API for saving favorite venues near metro
//! stations and publishing read-only snapshots of them via shareable links.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{
    FanOutPolicy, FavoritesService, InFlightGuards, PlaceLookup, RetryPolicy, SharedViewResolver,
    SnapshotPublisher, StationCatalog,
};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<StationCatalog>,
    pub places: Arc<dyn PlaceLookup>,
    pub favorites: FavoritesService,
    pub publisher: SnapshotPublisher,
    pub resolver: SharedViewResolver,
    pub in_flight: InFlightGuards,
}

impl AppState {
    /// Wire the services together over the given collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        catalog: Arc<StationCatalog>,
        places: Arc<dyn PlaceLookup>,
    ) -> Self {
        let retry = RetryPolicy {
            max_attempts: config.subscription_retry_attempts,
            base_delay: Duration::from_millis(config.subscription_retry_base_ms),
        };

        let favorites = FavoritesService::new(store.clone(), catalog.clone(), retry);
        let publisher = SnapshotPublisher::new(store.clone(), catalog.clone(), &config.frontend_url)
            .with_fan_out(config.map_share_concurrency, FanOutPolicy::SkipStation);
        let resolver = SharedViewResolver::new(store.clone(), catalog.clone());

        Self {
            config,
            store,
            catalog,
            places,
            favorites,
            publisher,
            resolver,
            in_flight: InFlightGuards::new(),
        }
    }
}
