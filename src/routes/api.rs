// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FavoriteStore, PlaceDetails, ShareLink, Venue, MAX_FAVORITES_PER_STATION};
use crate::services::{FavoritesSubscription, OpKind};
use crate::time_utils::weekday_at_offset;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/stations/{station_id}/favorites",
            get(list_favorites).post(add_favorite),
        )
        .route(
            "/api/stations/{station_id}/favorites/stream",
            get(stream_favorites),
        )
        .route(
            "/api/stations/{station_id}/favorites/{favorite_id}",
            delete(remove_favorite),
        )
        .route("/api/places/{place_id}", get(get_place))
        .route("/api/shares/station", post(share_station))
        .route("/api/shares/map", post(share_map))
}

fn check_body<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

// ─── Favorites ───────────────────────────────────────────────

/// One station's favorites.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FavoritesResponse {
    pub station_id: String,
    pub favorites: Vec<FavoriteStore>,
    /// Maximum favorites allowed for the station
    pub limit: usize,
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(station_id): Path<String>,
) -> Result<Json<FavoritesResponse>> {
    let favorites = state.favorites.list(user.uid(), &station_id, None).await?;
    Ok(Json(FavoritesResponse {
        station_id,
        favorites,
        limit: MAX_FAVORITES_PER_STATION,
    }))
}

/// Body for adding a favorite.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    #[validate(length(min = 1, max = 512))]
    pub place_id: String,
}

/// Look the venue up, then save it.
async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(station_id): Path<String>,
    Json(body): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteStore>)> {
    check_body(&body)?;
    let _in_flight = state.in_flight.try_begin(user.uid(), OpKind::Add)?;

    let details = state.places.place_details(body.place_id.trim()).await?;
    let venue = Venue::from_place(&details, state.places.as_ref());
    let saved = state.favorites.add(user.uid(), &station_id, &venue).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((station_id, favorite_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let _in_flight = state.in_flight.try_begin(user.uid(), OpKind::Remove)?;
    state
        .favorites
        .remove(user.uid(), &station_id, &favorite_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Error payload of an `error` stream event.
#[derive(Serialize)]
struct StreamError {
    error: &'static str,
    message: String,
}

fn to_event(item: std::result::Result<Vec<FavoriteStore>, AppError>) -> Event {
    let event = match &item {
        Ok(list) => Event::default().event("favorites").json_data(list),
        Err(e) => Event::default().event("error").json_data(StreamError {
            error: e.code(),
            message: e.user_message(),
        }),
    };
    // Serializing these types cannot fail; fall back to a bare error event
    event.unwrap_or_else(|_| Event::default().event("error").data("{}"))
}

/// Live favorites as Server-Sent Events.
///
/// Every `favorites` event carries the full list. Closing the connection
/// drops the subscription.
async fn stream_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(station_id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, std::convert::Infallible>>>> {
    let subscription = state.favorites.subscribe(user.uid(), &station_id).await?;

    let events = stream::unfold(subscription, |mut sub: FavoritesSubscription| async move {
        let item = sub.next().await?;
        Some((Ok(to_event(item)), sub))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// ─── Places ──────────────────────────────────────────────────

/// Place details plus today's opening hours.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaceResponse {
    pub details: PlaceDetails,
    /// Resolved URL of the first photo
    pub main_photo_url: Option<String>,
    pub today_hours: Option<String>,
}

async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceResponse>> {
    if place_id.trim().is_empty() {
        return Err(AppError::Validation("Missing place id".to_string()));
    }

    let details = state.places.place_details(place_id.trim()).await?;
    let venue = Venue::from_place(&details, state.places.as_ref());
    let today = weekday_at_offset(chrono::Utc::now(), state.config.display_utc_offset_minutes);
    let today_hours = details
        .opening_hours
        .as_ref()
        .and_then(|hours| hours.today_summary(today));

    Ok(Json(PlaceResponse {
        main_photo_url: venue.main_photo_url,
        today_hours,
        details,
    }))
}

// ─── Shares ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShareStationRequest {
    #[validate(length(min = 1, max = 64))]
    pub station_id: String,
}

/// Publish the current favorites of one station.
async fn share_station(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ShareStationRequest>,
) -> Result<(StatusCode, Json<ShareLink>)> {
    check_body(&body)?;
    let _in_flight = state.in_flight.try_begin(user.uid(), OpKind::Publish)?;

    let station = state
        .catalog
        .get(&body.station_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown station {}", body.station_id)))?;
    let favorites = state
        .favorites
        .list(user.uid(), &station.id, Some(MAX_FAVORITES_PER_STATION))
        .await?;

    let link = state
        .publisher
        .publish_single_station(&user.0, station, &favorites)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Publish every station's favorites.
async fn share_map(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<ShareLink>)> {
    let _in_flight = state.in_flight.try_begin(user.uid(), OpKind::Publish)?;
    let link = state.publisher.publish_full_map(&user.0).await?;
    Ok((StatusCode::CREATED, Json(link)))
}
