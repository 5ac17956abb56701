// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Favorite venue models.
//!
//! A favorite lives under one (user, station) scope at
//! `users/{uid}/favoriteStoresByStation/{stationId}/stores/{storeDocId}`.

use crate::models::place::PlaceDetails;
use crate::services::places::PlaceLookup;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Maximum number of favorites in a single (user, station) scope.
pub const MAX_FAVORITES_PER_STATION: usize = 15;

/// Photo size used when resolving the main photo of a saved venue.
pub const MAIN_PHOTO_MAX_WIDTH: u32 = 300;
pub const MAIN_PHOTO_MAX_HEIGHT: u32 = 200;

/// The allow-listed venue fields copied into a favorite.
///
/// Everything else the places service returns is discarded at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[validate(length(min = 1, max = 512))]
    pub google_place_id: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours_text: Option<Vec<String>>,
}

impl Venue {
    /// Build a venue from a places lookup result, keeping only allow-listed fields.
    ///
    /// The main photo is resolved to a URL now; photo references are not persisted.
    pub fn from_place(place: &PlaceDetails, lookup: &dyn PlaceLookup) -> Self {
        let main_photo_url = place
            .photos
            .first()
            .map(|photo| lookup.photo_url(photo, MAIN_PHOTO_MAX_WIDTH, MAIN_PHOTO_MAX_HEIGHT));

        let opening_hours_text = place
            .opening_hours
            .as_ref()
            .map(|hours| hours.weekday_text.clone())
            .filter(|text| !text.is_empty());

        Self {
            google_place_id: place.place_id.clone(),
            name: place.name.clone(),
            address: place.formatted_address.clone(),
            lat: place.location.lat,
            lng: place.location.lng,
            rating: place.rating,
            user_ratings_total: place.user_ratings_total,
            main_photo_url,
            opening_hours_text,
        }
    }
}

/// A saved favorite as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FavoriteStore {
    /// Document id assigned by the store
    #[serde(alias = "_firestore_id")]
    pub id: String,
    pub google_place_id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours_text: Option<Vec<String>>,
    /// Store-assigned insertion time (RFC3339)
    pub added_at: String,
}

impl FavoriteStore {
    /// Materialize a stored favorite from its venue fields.
    pub fn from_venue(id: String, venue: &Venue, added_at: String) -> Self {
        Self {
            id,
            google_place_id: venue.google_place_id.clone(),
            name: venue.name.clone(),
            address: venue.address.clone(),
            lat: venue.lat,
            lng: venue.lng,
            rating: venue.rating,
            user_ratings_total: venue.user_ratings_total,
            main_photo_url: venue.main_photo_url.clone(),
            opening_hours_text: venue.opening_hours_text.clone(),
            added_at,
        }
    }

    /// The allow-listed venue fields of this favorite.
    pub fn venue(&self) -> Venue {
        Venue {
            google_place_id: self.google_place_id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            lat: self.lat,
            lng: self.lng,
            rating: self.rating,
            user_ratings_total: self.user_ratings_total,
            main_photo_url: self.main_photo_url.clone(),
            opening_hours_text: self.opening_hours_text.clone(),
        }
    }
}

/// One user's favorites for one station.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub user_id: String,
    pub station_id: String,
}

impl Scope {
    pub fn new(user_id: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            station_id: station_id.into(),
        }
    }

    /// Slash-separated collection path of this scope.
    pub fn collection_path(&self) -> String {
        format!(
            "users/{}/favoriteStoresByStation/{}/stores",
            self.user_id, self.station_id
        )
    }
}
