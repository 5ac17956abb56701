// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Favorites (`users/{uid}/favoriteStoresByStation/{stationId}/stores`)
//! - Public single-station shares (`publicSharedViews`)
//! - Public full-map shares (`publicSharedFullMaps`)

use crate::db::{auto_id, collections, DocumentStore, FavoritesFeed, FEED_BUFFER};
use crate::error::AppError;
use crate::models::{FavoriteStore, FullMapShare, Scope, SingleStationShare, Venue};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use firestore::{FirestoreListenerTarget, FirestoreMemListenStateStorage, FirestoreQueryDirection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

/// Listener target id for favorites change feeds (one target per listener).
const FAVORITES_TARGET_ID: u32 = 1;

/// Favorite document as written. The document id is not stored as a field.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteDoc {
    google_place_id: String,
    name: String,
    address: String,
    lat: f64,
    lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    main_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    opening_hours_text: Option<Vec<String>>,
    added_at: String,
}

impl FavoriteDoc {
    fn new(venue: &Venue, added_at: &str) -> Self {
        Self {
            google_place_id: venue.google_place_id.clone(),
            name: venue.name.clone(),
            address: venue.address.clone(),
            lat: venue.lat,
            lng: venue.lng,
            rating: venue.rating,
            user_ratings_total: venue.user_ratings_total,
            main_photo_url: venue.main_photo_url.clone(),
            opening_hours_text: venue.opening_hours_text.clone(),
            added_at: added_at.to_string(),
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to connect to Firestore Emulator: {}",
                e
            ))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::ReadFailure("Database not connected (offline mode)".to_string())
        })
    }

    /// Like `get_client`, for write paths.
    fn get_write_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::WriteFailure("Database not connected (offline mode)".to_string())
        })
    }

    /// Parent document of a scope's `stores` collection.
    fn scope_parent(
        client: &firestore::FirestoreDb,
        scope: &Scope,
    ) -> Result<firestore::ParentPathBuilder, AppError> {
        client
            .parent_path(collections::USERS, &scope.user_id)
            .and_then(|p| p.at(collections::FAVORITES_BY_STATION, &scope.station_id))
            .map_err(|e| AppError::Validation(format!("Invalid favorites path: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── Favorite Operations ─────────────────────────────────────

    async fn list_favorites(
        &self,
        scope: &Scope,
        limit: Option<usize>,
    ) -> Result<Vec<FavoriteStore>, AppError> {
        let client = self.get_client()?;
        let parent = Self::scope_parent(client, scope)?;

        let query = client
            .fluent()
            .select()
            .from(collections::STORES)
            .parent(&parent)
            .order_by([("addedAt", FirestoreQueryDirection::Ascending)]);

        let query = match limit {
            Some(limit) => query.limit(limit as u32),
            None => query,
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::ReadFailure(e.to_string()))
    }

    async fn count_favorites(&self, scope: &Scope) -> Result<usize, AppError> {
        Ok(self.list_favorites(scope, None).await?.len())
    }

    async fn find_favorite_by_place(
        &self,
        scope: &Scope,
        google_place_id: &str,
    ) -> Result<Option<FavoriteStore>, AppError> {
        let client = self.get_client()?;
        let parent = Self::scope_parent(client, scope)?;
        let place_id = google_place_id.to_string();

        let matches: Vec<FavoriteStore> = client
            .fluent()
            .select()
            .from(collections::STORES)
            .parent(&parent)
            .filter(move |q| q.for_all([q.field("googlePlaceId").eq(place_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::ReadFailure(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    async fn get_favorite(
        &self,
        scope: &Scope,
        id: &str,
    ) -> Result<Option<FavoriteStore>, AppError> {
        let client = self.get_client()?;
        let parent = Self::scope_parent(client, scope)?;

        client
            .fluent()
            .select()
            .by_id_in(collections::STORES)
            .parent(&parent)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::ReadFailure(e.to_string()))
    }

    async fn insert_favorite(
        &self,
        scope: &Scope,
        venue: &Venue,
    ) -> Result<FavoriteStore, AppError> {
        let client = self.get_write_client()?;
        let parent = Self::scope_parent(client, scope)?;
        let id = auto_id()?;
        let added_at = now_rfc3339();

        let _: () = client
            .fluent()
            .insert()
            .into(collections::STORES)
            .document_id(&id)
            .parent(&parent)
            .object(&FavoriteDoc::new(venue, &added_at))
            .execute()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        Ok(FavoriteStore::from_venue(id, venue, added_at))
    }

    async fn delete_favorite(&self, scope: &Scope, id: &str) -> Result<(), AppError> {
        let client = self.get_write_client()?;
        let parent = Self::scope_parent(client, scope)?;

        client
            .fluent()
            .delete()
            .from(collections::STORES)
            .document_id(id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;
        Ok(())
    }

    /// Every listener event triggers a full re-read of the scope, so
    /// subscribers always receive complete lists.
    async fn watch_favorites(
        &self,
        scope: &Scope,
        cancel: CancellationToken,
    ) -> Result<FavoritesFeed, AppError> {
        let client = self.get_client()?;
        let parent = Self::scope_parent(client, scope)?;

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::ReadFailure(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .from(collections::STORES)
            .parent(&parent)
            .listen()
            .add_target(FirestoreListenerTarget::new(FAVORITES_TARGET_ID), &mut listener)
            .map_err(|e| AppError::ReadFailure(format!("Failed to add listen target: {}", e)))?;

        let changed = Arc::new(Notify::new());
        let notify = changed.clone();
        listener
            .start(move |_event| {
                let notify = notify.clone();
                async move {
                    notify.notify_one();
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::ReadFailure(format!("Failed to start listener: {}", e)))?;

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let db = self.clone();
        let scope = scope.clone();

        tokio::spawn(async move {
            let initial = db.list_favorites(&scope, None).await;
            let mut failed = initial.is_err();

            if tx.send(initial).await.is_ok() && !failed {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tx.closed() => break,
                        _ = changed.notified() => {
                            let next = db.list_favorites(&scope, None).await;
                            failed = next.is_err();
                            if tx.send(next).await.is_err() || failed {
                                break;
                            }
                        }
                    }
                }
            }

            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down favorites listener");
            }
            tracing::debug!(
                path = %scope.collection_path(),
                failed,
                "Favorites feed closed"
            );
        });

        Ok(rx)
    }

    // ─── Share Operations ────────────────────────────────────────

    async fn insert_station_share(
        &self,
        share: &SingleStationShare,
    ) -> Result<SingleStationShare, AppError> {
        let client = self.get_write_client()?;
        let mut stored = share.clone();
        stored.id = auto_id()?;
        stored.created_at = now_rfc3339();

        let _: () = client
            .fluent()
            .insert()
            .into(collections::PUBLIC_SHARED_VIEWS)
            .document_id(&stored.id)
            .object(&stored)
            .execute()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        Ok(stored)
    }

    async fn get_station_share(&self, id: &str) -> Result<Option<SingleStationShare>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PUBLIC_SHARED_VIEWS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::ReadFailure(e.to_string()))
    }

    async fn insert_map_share(&self, share: &FullMapShare) -> Result<FullMapShare, AppError> {
        let client = self.get_write_client()?;
        let mut stored = share.clone();
        stored.id = auto_id()?;
        stored.created_at = now_rfc3339();

        let _: () = client
            .fluent()
            .insert()
            .into(collections::PUBLIC_SHARED_FULL_MAPS)
            .document_id(&stored.id)
            .object(&stored)
            .execute()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        Ok(stored)
    }

    async fn get_map_share(&self, id: &str) -> Result<Option<FullMapShare>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PUBLIC_SHARED_FULL_MAPS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::ReadFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue() -> Venue {
        Venue {
            google_place_id: "p1".to_string(),
            name: "Cafe A".to_string(),
            address: "1 Main St".to_string(),
            lat: 22.6,
            lng: 120.3,
            rating: None,
            user_ratings_total: None,
            main_photo_url: None,
            opening_hours_text: None,
        }
    }

    // Insert payloads must be owned documents that also deserialize
    fn assert_insertable<T: Serialize + Send + Sync + for<'de> Deserialize<'de>>(_: &T) {}

    #[test]
    fn test_favorite_doc_omits_absent_fields() {
        let doc = FavoriteDoc::new(&venue(), "2026-01-01T00:00:00.000000Z");
        assert_insertable(&doc);

        let json = serde_json::to_value(&doc).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["googlePlaceId"], "p1");
        assert_eq!(obj["addedAt"], "2026-01-01T00:00:00.000000Z");
        for key in ["rating", "userRatingsTotal", "mainPhotoUrl", "openingHoursText"] {
            assert!(!obj.contains_key(key), "{} should be omitted", key);
        }
    }

    #[test]
    fn test_favorite_doc_keeps_present_fields() {
        let mut v = venue();
        v.rating = Some(4.5);
        v.opening_hours_text = Some(vec!["Monday: Closed".to_string()]);
        let doc = FavoriteDoc::new(&v, "2026-01-01T00:00:00.000000Z");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["rating"], 4.5);
        assert_eq!(json["openingHoursText"][0], "Monday: Closed");

        let back: FavoriteDoc = serde_json::from_value(json).unwrap();
        assert_eq!(back.rating, Some(4.5));
        assert!(back.main_photo_url.is_none());
    }
}
