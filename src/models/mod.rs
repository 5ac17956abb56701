// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod favorite;
pub mod place;
pub mod share;
pub mod station;
pub mod user;

pub use favorite::{FavoriteStore, Scope, Venue, MAX_FAVORITES_PER_STATION};
pub use place::{OpeningHours, PhotoRef, PlaceDetails};
pub use share::{
    FullMapShare, FullMapShareView, ShareKind, ShareLink, SharedStationEntry, SharedStore,
    SharedStoreView, SingleStationShare, SingleStationShareView,
};
pub use station::{LatLng, Station, StationDataset};
pub use user::User;
