// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Public share snapshots and their read-only views.
//!
//! Share documents are denormalized copies: once written they never change,
//! and they hold no reference back to the owner's live favorites.

use crate::models::favorite::FavoriteStore;
use crate::models::station::Station;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Venue fields copied into a public share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SharedStore {
    pub name: String,
    pub address: String,
    pub google_place_id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_photo_url: Option<String>,
}

impl From<&FavoriteStore> for SharedStore {
    fn from(favorite: &FavoriteStore) -> Self {
        Self {
            name: favorite.name.clone(),
            address: favorite.address.clone(),
            google_place_id: favorite.google_place_id.clone(),
            lat: favorite.lat,
            lng: favorite.lng,
            rating: favorite.rating,
            main_photo_url: favorite.main_photo_url.clone(),
        }
    }
}

/// Snapshot of one station's favorites (`publicSharedViews`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStationShare {
    /// Document id; empty until the store assigns one
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: String,
    pub original_user_id: String,
    pub original_user_name: String,
    pub original_station_id: String,
    pub original_station_name: String,
    pub stores: Vec<SharedStore>,
    /// Store-assigned (RFC3339); empty until written
    #[serde(default)]
    pub created_at: String,
}

/// Snapshot of every station's favorites (`publicSharedFullMaps`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullMapShare {
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: String,
    pub original_user_id: String,
    pub original_user_name: String,
    pub all_stations_favorites: BTreeMap<String, Vec<SharedStore>>,
    #[serde(default)]
    pub created_at: String,
}

impl FullMapShare {
    /// Number of venues across all stations.
    pub fn total_stores(&self) -> usize {
        self.all_stations_favorites.values().map(Vec::len).sum()
    }
}

/// Which kind of share a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ShareKind {
    SingleStation,
    FullMap,
}

impl ShareKind {
    /// URL path segment for this kind.
    pub fn path_segment(self) -> &'static str {
        match self {
            ShareKind::SingleStation => "share",
            ShareKind::FullMap => "sharemap",
        }
    }
}

/// A published share: its opaque id and the public URL built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShareLink {
    pub kind: ShareKind,
    pub id: String,
    pub url: String,
}

impl ShareLink {
    /// Build `{origin}/share/{id}` or `{origin}/sharemap/{id}`.
    pub fn new(origin: &str, kind: ShareKind, id: String) -> Self {
        let url = format!(
            "{}/{}/{}",
            origin.trim_end_matches('/'),
            kind.path_segment(),
            id
        );
        Self { kind, id, url }
    }
}

// ─── Read-only views ─────────────────────────────────────────

/// A shared venue as shown to anonymous viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SharedStoreView {
    #[serde(flatten)]
    pub store: SharedStore,
    /// Google Maps search link for the venue
    pub maps_url: String,
}

impl From<SharedStore> for SharedStoreView {
    fn from(store: SharedStore) -> Self {
        let maps_url = format!(
            "https://www.google.com/maps/search/?api=1&query={}&query_place_id={}",
            urlencoding::encode(&store.name),
            urlencoding::encode(&store.google_place_id)
        );
        Self { store, maps_url }
    }
}

/// Read-only view of a single-station share.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SingleStationShareView {
    pub share_id: String,
    pub original_user_name: String,
    pub original_station_id: String,
    pub original_station_name: String,
    pub stores: Vec<SharedStoreView>,
    pub created_at: String,
    /// Catalog entry for the station, when the id is still known
    pub station: Option<Station>,
    /// False when the station cannot be placed on the diagram
    pub has_map_placement: bool,
}

/// One station's entry in a full-map view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SharedStationEntry {
    pub station_id: String,
    pub station_name: String,
    pub station: Option<Station>,
    pub has_map_placement: bool,
    pub favorites_count: usize,
    pub stores: Vec<SharedStoreView>,
}

/// Read-only view of a full-map share.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FullMapShareView {
    pub share_id: String,
    pub original_user_name: String,
    pub created_at: String,
    /// Catalog stations in catalog order, then ids the catalog no longer knows
    pub stations: Vec<SharedStationEntry>,
    pub total_stores: usize,
}

impl FullMapShareView {
    /// Entry for a station id, if present in the view.
    pub fn station(&self, station_id: &str) -> Option<&SharedStationEntry> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }
}
