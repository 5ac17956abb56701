// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Snapshot publisher.
//!
//! Copies favorites into public share documents and returns shareable links.
//! Shares are point-in-time copies; later edits to the source favorites do
//! not reach them.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::share::ShareKind;
use crate::models::user::{DEFAULT_MAP_SHARER_NAME, DEFAULT_SHARER_NAME};
use crate::models::{
    FavoriteStore, FullMapShare, Scope, ShareLink, SharedStore, SingleStationShare, Station, User,
    MAX_FAVORITES_PER_STATION,
};
use crate::services::favorites::check_segment;
use crate::services::stations::StationCatalog;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default number of concurrent station reads for a full-map share.
pub const DEFAULT_FAN_OUT: usize = 4;

/// What a full-map publish does when one station's read fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutPolicy {
    /// Log the failure and treat the station as having no favorites.
    #[default]
    SkipStation,
    /// Fail the whole publish with the station's `ReadFailure`.
    Abort,
}

/// Best-effort receiver for freshly published links (e.g. a clipboard).
#[async_trait]
pub trait LinkSink: Send + Sync {
    async fn deliver(&self, link: &ShareLink) -> anyhow::Result<()>;
}

/// Publishes share snapshots to the public collections.
#[derive(Clone)]
pub struct SnapshotPublisher {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<StationCatalog>,
    origin: String,
    fan_out: usize,
    policy: FanOutPolicy,
    sink: Option<Arc<dyn LinkSink>>,
}

impl SnapshotPublisher {
    /// `origin` is the public site origin links are built on.
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<StationCatalog>, origin: &str) -> Self {
        Self {
            store,
            catalog,
            origin: origin.trim_end_matches('/').to_string(),
            fan_out: DEFAULT_FAN_OUT,
            policy: FanOutPolicy::default(),
            sink: None,
        }
    }

    pub fn with_fan_out(mut self, fan_out: usize, policy: FanOutPolicy) -> Self {
        self.fan_out = fan_out.max(1);
        self.policy = policy;
        self
    }

    pub fn with_link_sink(mut self, sink: Arc<dyn LinkSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Publish the given favorites of one station.
    pub async fn publish_single_station(
        &self,
        user: &User,
        station: &Station,
        favorites: &[FavoriteStore],
    ) -> Result<ShareLink, AppError> {
        check_segment("user id", &user.uid)?;
        check_segment("station id", &station.id)?;
        if favorites.is_empty() {
            return Err(AppError::Validation(
                "Select a station with favorites before sharing".to_string(),
            ));
        }

        let share = SingleStationShare {
            id: String::new(),
            original_user_id: user.uid.clone(),
            original_user_name: user.share_name(DEFAULT_SHARER_NAME),
            original_station_id: station.id.clone(),
            original_station_name: station.name.clone(),
            stores: favorites.iter().map(SharedStore::from).collect(),
            created_at: String::new(),
        };

        let stored = self.store.insert_station_share(&share).await?;
        tracing::info!(
            user_id = %user.uid,
            station_id = %station.id,
            share_id = %stored.id,
            stores = stored.stores.len(),
            "Published station share"
        );

        let link = ShareLink::new(&self.origin, ShareKind::SingleStation, stored.id);
        self.deliver(&link).await;
        Ok(link)
    }

    /// Publish every station's favorites for a user.
    pub async fn publish_full_map(&self, user: &User) -> Result<ShareLink, AppError> {
        check_segment("user id", &user.uid)?;

        let all_stations_favorites = self.collect_all(&user.uid).await?;
        let share = FullMapShare {
            id: String::new(),
            original_user_id: user.uid.clone(),
            original_user_name: user.share_name(DEFAULT_MAP_SHARER_NAME),
            all_stations_favorites,
            created_at: String::new(),
        };

        let total = share.total_stores();
        if total == 0 {
            return Err(AppError::EmptyCollection);
        }

        let stored = self.store.insert_map_share(&share).await?;
        tracing::info!(
            user_id = %user.uid,
            share_id = %stored.id,
            stations = stored.all_stations_favorites.len(),
            stores = total,
            "Published full-map share"
        );

        let link = ShareLink::new(&self.origin, ShareKind::FullMap, stored.id);
        self.deliver(&link).await;
        Ok(link)
    }

    /// Read up to the per-station maximum for every catalog station.
    ///
    /// Reads run `fan_out` at a time; results stay in station-list order.
    async fn collect_all(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, Vec<SharedStore>>, AppError> {
        // Owned scopes keep the read futures free of catalog borrows
        let scopes: Vec<Scope> = self
            .catalog
            .stations()
            .iter()
            .map(|station| Scope::new(user_id, station.id.clone()))
            .collect();

        let reads = stream::iter(scopes)
            .map(|scope| {
                let store = self.store.clone();
                async move {
                    let result = store
                        .list_favorites(&scope, Some(MAX_FAVORITES_PER_STATION))
                        .await;
                    (scope.station_id, result)
                }
            })
            .buffered(self.fan_out)
            .collect::<Vec<_>>()
            .await;

        let mut by_station = BTreeMap::new();
        for (station_id, result) in reads {
            let favorites = match result {
                Ok(favorites) => favorites,
                Err(e) if self.policy == FanOutPolicy::SkipStation => {
                    tracing::warn!(
                        user_id,
                        station_id = %station_id,
                        error = %e,
                        "Skipping station in full-map share"
                    );
                    continue;
                }
                Err(e) => {
                    return Err(match e {
                        AppError::ReadFailure(msg) => AppError::ReadFailure(msg),
                        other => AppError::ReadFailure(other.to_string()),
                    })
                }
            };

            if !favorites.is_empty() {
                by_station.insert(
                    station_id,
                    favorites.iter().map(SharedStore::from).collect(),
                );
            }
        }

        Ok(by_station)
    }

    async fn deliver(&self, link: &ShareLink) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.deliver(link).await {
                tracing::warn!(error = %e, url = %link.url, "Could not deliver share link");
            }
        }
    }
}
