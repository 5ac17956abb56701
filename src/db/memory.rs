// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore semantics the services depend on (auto ids,
//! store-assigned timestamps, full-list change feeds) so it can stand in for
//! the remote store in tests and local development. Fault injection hooks let
//! tests exercise the read/write failure paths.

use crate::db::{auto_id, DocumentStore, FavoritesFeed, FEED_BUFFER};
use crate::error::AppError;
use crate::models::{FavoriteStore, FullMapShare, Scope, SingleStationShare, Venue};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
enum StoreEvent {
    Changed(Scope),
    FeedsInterrupted,
}

struct Inner {
    favorites: DashMap<Scope, Vec<FavoriteStore>>,
    station_shares: DashMap<String, SingleStationShare>,
    map_shares: DashMap<String, FullMapShare>,
    changes: broadcast::Sender<StoreEvent>,
    failing_stations: DashSet<String>,
    fail_writes: AtomicBool,
    fail_share_reads: AtomicBool,
    writes: AtomicUsize,
}

/// In-memory [`DocumentStore`].
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                favorites: DashMap::new(),
                station_shares: DashMap::new(),
                map_shares: DashMap::new(),
                changes,
                failing_stations: DashSet::new(),
                fail_writes: AtomicBool::new(false),
                fail_share_reads: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    // ─── Fault injection ─────────────────────────────────────────

    /// Make every read of this station's scopes fail.
    pub fn fail_reads_for_station(&self, station_id: &str) {
        self.inner.failing_stations.insert(station_id.to_string());
    }

    /// Make every write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every public share read fail (or succeed again).
    pub fn set_fail_share_reads(&self, fail: bool) {
        self.inner.fail_share_reads.store(fail, Ordering::SeqCst);
    }

    /// Deliver a read failure to every open change feed.
    pub fn interrupt_feeds(&self) {
        let _ = self.inner.changes.send(StoreEvent::FeedsInterrupted);
    }

    /// Clear all injected faults.
    pub fn heal(&self) {
        self.inner.failing_stations.clear();
        self.set_fail_writes(false);
        self.set_fail_share_reads(false);
    }

    // ─── Inspection ──────────────────────────────────────────────

    /// Number of successful writes (inserts and deletes).
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn station_share_count(&self) -> usize {
        self.inner.station_shares.len()
    }

    pub fn map_share_count(&self) -> usize {
        self.inner.map_shares.len()
    }

    // ─── Internals ───────────────────────────────────────────────

    fn check_read(&self, scope: &Scope) -> Result<(), AppError> {
        if self.inner.failing_stations.contains(&scope.station_id) {
            return Err(AppError::ReadFailure(format!(
                "Injected read failure for {}",
                scope.collection_path()
            )));
        }
        Ok(())
    }

    fn check_share_read(&self, id: &str) -> Result<(), AppError> {
        if self.inner.fail_share_reads.load(Ordering::SeqCst) {
            return Err(AppError::ReadFailure(format!(
                "Injected read failure for share {}",
                id
            )));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::WriteFailure("Injected write failure".to_string()));
        }
        Ok(())
    }

    fn record_write(&self, scope: Option<&Scope>) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(scope) = scope {
            // No receivers is fine
            let _ = self.inner.changes.send(StoreEvent::Changed(scope.clone()));
        }
    }

    fn snapshot(&self, scope: &Scope) -> Result<Vec<FavoriteStore>, AppError> {
        self.check_read(scope)?;
        Ok(self
            .inner
            .favorites
            .get(scope)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_favorites(
        &self,
        scope: &Scope,
        limit: Option<usize>,
    ) -> Result<Vec<FavoriteStore>, AppError> {
        let mut list = self.snapshot(scope)?;
        if let Some(limit) = limit {
            list.truncate(limit);
        }
        Ok(list)
    }

    async fn count_favorites(&self, scope: &Scope) -> Result<usize, AppError> {
        Ok(self.snapshot(scope)?.len())
    }

    async fn find_favorite_by_place(
        &self,
        scope: &Scope,
        google_place_id: &str,
    ) -> Result<Option<FavoriteStore>, AppError> {
        Ok(self
            .snapshot(scope)?
            .into_iter()
            .find(|f| f.google_place_id == google_place_id))
    }

    async fn get_favorite(
        &self,
        scope: &Scope,
        id: &str,
    ) -> Result<Option<FavoriteStore>, AppError> {
        Ok(self.snapshot(scope)?.into_iter().find(|f| f.id == id))
    }

    async fn insert_favorite(
        &self,
        scope: &Scope,
        venue: &Venue,
    ) -> Result<FavoriteStore, AppError> {
        self.check_write()?;
        let favorite = FavoriteStore::from_venue(auto_id()?, venue, now_rfc3339());

        self.inner
            .favorites
            .entry(scope.clone())
            .or_default()
            .push(favorite.clone());
        self.record_write(Some(scope));

        Ok(favorite)
    }

    async fn delete_favorite(&self, scope: &Scope, id: &str) -> Result<(), AppError> {
        self.check_write()?;
        if let Some(mut list) = self.inner.favorites.get_mut(scope) {
            list.retain(|f| f.id != id);
        }
        self.record_write(Some(scope));
        Ok(())
    }

    async fn watch_favorites(
        &self,
        scope: &Scope,
        cancel: CancellationToken,
    ) -> Result<FavoritesFeed, AppError> {
        // Subscribe before the initial read so no change slips between the two
        let mut events = self.inner.changes.subscribe();
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let store = self.clone();
        let scope = scope.clone();

        tokio::spawn(async move {
            let initial = store.snapshot(&scope);
            let failed = initial.is_err();
            if tx.send(initial).await.is_err() || failed {
                return;
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => {
                        let next = match event {
                            Ok(StoreEvent::Changed(changed)) if changed == scope => store.snapshot(&scope),
                            Ok(StoreEvent::Changed(_)) => continue,
                            Ok(StoreEvent::FeedsInterrupted) => Err(AppError::ReadFailure(
                                "Change feed interrupted".to_string(),
                            )),
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(skipped = n, "Change feed lagged, resending snapshot");
                                store.snapshot(&scope)
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        };

                        let failed = next.is_err();
                        if tx.send(next).await.is_err() || failed {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn insert_station_share(
        &self,
        share: &SingleStationShare,
    ) -> Result<SingleStationShare, AppError> {
        self.check_write()?;
        let mut stored = share.clone();
        stored.id = auto_id()?;
        stored.created_at = now_rfc3339();

        self.inner
            .station_shares
            .insert(stored.id.clone(), stored.clone());
        self.record_write(None);
        Ok(stored)
    }

    async fn get_station_share(&self, id: &str) -> Result<Option<SingleStationShare>, AppError> {
        self.check_share_read(id)?;
        Ok(self
            .inner
            .station_shares
            .get(id)
            .map(|share| share.value().clone()))
    }

    async fn insert_map_share(&self, share: &FullMapShare) -> Result<FullMapShare, AppError> {
        self.check_write()?;
        let mut stored = share.clone();
        stored.id = auto_id()?;
        stored.created_at = now_rfc3339();

        self.inner.map_shares.insert(stored.id.clone(), stored.clone());
        self.record_write(None);
        Ok(stored)
    }

    async fn get_map_share(&self, id: &str) -> Result<Option<FullMapShare>, AppError> {
        self.check_share_read(id)?;
        Ok(self.inner.map_shares.get(id).map(|share| share.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(place_id: &str) -> Venue {
        Venue {
            google_place_id: place_id.to_string(),
            name: format!("Venue {}", place_id),
            address: String::new(),
            lat: 1.0,
            lng: 1.0,
            rating: None,
            user_ratings_total: None,
            main_photo_url: None,
            opening_hours_text: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let scope = Scope::new("u1", "O7");

        let saved = store.insert_favorite(&scope, &venue("p1")).await.unwrap();
        assert_eq!(saved.id.len(), 20);
        assert!(!saved.added_at.is_empty());

        let listed = store.list_favorites(&scope, None).await.unwrap();
        assert_eq!(listed, vec![saved]);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let store = MemoryStore::new();
        store
            .insert_favorite(&Scope::new("u1", "O7"), &venue("p1"))
            .await
            .unwrap();

        assert_eq!(store.count_favorites(&Scope::new("u1", "O5")).await.unwrap(), 0);
        assert_eq!(store.count_favorites(&Scope::new("u2", "O7")).await.unwrap(), 0);
        assert_eq!(store.count_favorites(&Scope::new("u1", "O7")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_limit_keeps_oldest() {
        let store = MemoryStore::new();
        let scope = Scope::new("u1", "O7");
        for i in 0..5 {
            store
                .insert_favorite(&scope, &venue(&format!("p{}", i)))
                .await
                .unwrap();
        }

        let limited = store.list_favorites(&scope, Some(2)).await.unwrap();
        let ids: Vec<_> = limited.iter().map(|f| f.google_place_id.as_str()).collect();
        assert_eq!(ids, ["p0", "p1"]);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = MemoryStore::new();
        let scope = Scope::new("u1", "O7");

        store.set_fail_writes(true);
        let err = store.insert_favorite(&scope, &venue("p1")).await.unwrap_err();
        assert!(matches!(err, AppError::WriteFailure(_)));
        assert_eq!(store.write_count(), 0);

        store.heal();
        store.fail_reads_for_station("O7");
        let err = store.list_favorites(&scope, None).await.unwrap_err();
        assert!(matches!(err, AppError::ReadFailure(_)));
    }

    #[tokio::test]
    async fn test_watch_delivers_initial_and_changes() {
        let store = MemoryStore::new();
        let scope = Scope::new("u1", "O7");
        let cancel = CancellationToken::new();
        let mut feed = store.watch_favorites(&scope, cancel.clone()).await.unwrap();

        assert!(feed.recv().await.unwrap().unwrap().is_empty());

        store.insert_favorite(&scope, &venue("p1")).await.unwrap();
        // Changes in other scopes are not delivered
        store
            .insert_favorite(&Scope::new("u1", "O5"), &venue("p2"))
            .await
            .unwrap();

        let list = feed.recv().await.unwrap().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].google_place_id, "p1");

        cancel.cancel();
        assert!(feed.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_interrupted_feed_ends_with_error() {
        let store = MemoryStore::new();
        let scope = Scope::new("u1", "O7");
        let mut feed = store
            .watch_favorites(&scope, CancellationToken::new())
            .await
            .unwrap();
        feed.recv().await.unwrap().unwrap();

        store.interrupt_feeds();
        assert!(matches!(
            feed.recv().await.unwrap(),
            Err(AppError::ReadFailure(_))
        ));
        assert!(feed.recv().await.is_none());
    }
}
