// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod favorites;
pub mod inflight;
pub mod places;
pub mod publisher;
pub mod resolver;
pub mod stations;

pub use favorites::{FavoritesAdapter, FavoritesService, FavoritesSubscription, RetryPolicy};
pub use inflight::{InFlightGuards, OpKind};
pub use places::{PlaceLookup, PlacesClient};
pub use publisher::{FanOutPolicy, LinkSink, SnapshotPublisher};
pub use resolver::SharedViewResolver;
pub use stations::{StationCatalog, StationCatalogError};
