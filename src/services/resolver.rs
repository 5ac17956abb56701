// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolves public share ids to read-only views.
//!
//! Views are rebuilt from the share document and the station catalog only;
//! nothing here reads or writes the owner's live favorites.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::share::{SharedStationEntry, SharedStoreView};
use crate::models::{FullMapShareView, SharedStore, SingleStationShareView, Station};
use crate::services::stations::StationCatalog;
use std::sync::Arc;

/// Reject ids that cannot name a share document.
pub fn validate_share_id(share_id: &str) -> Result<&str, AppError> {
    if share_id.is_empty() {
        return Err(AppError::Validation("Missing share id".to_string()));
    }
    if share_id.trim() != share_id || share_id.contains('/') || share_id.len() > 128 {
        return Err(AppError::Validation("Malformed share id".to_string()));
    }
    Ok(share_id)
}

fn placement(station: Option<&Station>) -> bool {
    station.is_some_and(Station::has_real_coords)
}

fn store_views(stores: Vec<SharedStore>) -> Vec<SharedStoreView> {
    stores.into_iter().map(SharedStoreView::from).collect()
}

#[derive(Clone)]
pub struct SharedViewResolver {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<StationCatalog>,
}

impl SharedViewResolver {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<StationCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Resolve a single-station share.
    ///
    /// A station the catalog no longer knows still resolves, with
    /// `has_map_placement` false.
    pub async fn resolve_single_station(
        &self,
        share_id: &str,
    ) -> Result<SingleStationShareView, AppError> {
        let id = validate_share_id(share_id)?;
        let share = self
            .store
            .get_station_share(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Share {}", id)))?;

        let station = self.catalog.get(&share.original_station_id).cloned();
        if station.is_none() {
            tracing::warn!(
                share_id = id,
                station_id = %share.original_station_id,
                "Shared station not in catalog"
            );
        }

        Ok(SingleStationShareView {
            share_id: id.to_string(),
            original_user_name: share.original_user_name,
            original_station_id: share.original_station_id,
            original_station_name: share.original_station_name,
            stores: store_views(share.stores),
            created_at: share.created_at,
            has_map_placement: placement(station.as_ref()),
            station,
        })
    }

    /// Resolve a full-map share.
    ///
    /// Every catalog station appears in catalog order with its shared count,
    /// followed by shared station ids the catalog does not know.
    pub async fn resolve_full_map(&self, share_id: &str) -> Result<FullMapShareView, AppError> {
        let id = validate_share_id(share_id)?;
        let share = self
            .store
            .get_map_share(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Map share {}", id)))?;

        let total_stores = share.total_stores();
        let mut shared = share.all_stations_favorites;
        let mut stations = Vec::with_capacity(self.catalog.stations().len() + shared.len());

        for station in self.catalog.stations() {
            let stores = shared.remove(&station.id).unwrap_or_default();
            stations.push(SharedStationEntry {
                station_id: station.id.clone(),
                station_name: station.name.clone(),
                has_map_placement: station.has_real_coords(),
                station: Some(station.clone()),
                favorites_count: stores.len(),
                stores: store_views(stores),
            });
        }

        // Whatever is left was shared for stations the catalog dropped
        for (station_id, stores) in shared {
            stations.push(SharedStationEntry {
                station_name: station_id.clone(),
                station_id,
                station: None,
                has_map_placement: false,
                favorites_count: stores.len(),
                stores: store_views(stores),
            });
        }

        Ok(FullMapShareView {
            share_id: id.to_string(),
            original_user_name: share.original_user_name,
            created_at: share.created_at,
            stations,
            total_stores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_share_id() {
        assert_eq!(validate_share_id("abc").unwrap(), "abc");
        assert!(matches!(
            validate_share_id(" abc "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_share_id("abc\n"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_share_id("   "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(validate_share_id(""), Err(AppError::Validation(_))));
        assert!(matches!(
            validate_share_id("a/b"),
            Err(AppError::Validation(_))
        ));
    }
}
