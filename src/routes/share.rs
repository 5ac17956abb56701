// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Public routes: the station catalog and anonymous share viewing.
//!
//! Nothing here requires a session or writes data.

use crate::error::Result;
use crate::models::{FullMapShareView, SingleStationShareView, Station};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Shares never change once written.
const SHARE_CACHE_CONTROL: &str = "public, max-age=300";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stations", get(list_stations))
        .route("/api/public/share/{share_id}", get(get_station_share))
        .route("/api/public/sharemap/{share_id}", get(get_map_share))
}

/// Station catalog response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StationsResponse {
    pub line_colors: BTreeMap<String, String>,
    pub stations: Vec<Station>,
}

async fn list_stations(State(state): State<Arc<AppState>>) -> Json<StationsResponse> {
    Json(StationsResponse {
        line_colors: state.catalog.line_colors().clone(),
        stations: state.catalog.stations().to_vec(),
    })
}

async fn get_station_share(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<impl IntoResponse> {
    let view: SingleStationShareView = state.resolver.resolve_single_station(&share_id).await?;
    Ok(([(header::CACHE_CONTROL, SHARE_CACHE_CONTROL)], Json(view)))
}

async fn get_map_share(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<impl IntoResponse> {
    let view: FullMapShareView = state.resolver.resolve_full_map(&share_id).await?;
    Ok(([(header::CACHE_CONTROL, SHARE_CACHE_CONTROL)], Json(view)))
}
