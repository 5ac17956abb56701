// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites store adapter.
//!
//! Mediates every read and mutation of one user's favorites for one station:
//! - Capacity and uniqueness checks before insert
//! - Live subscriptions that redeliver the full list on every change
//! - Bounded restart of failed subscriptions

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{FavoriteStore, Scope, Venue, MAX_FAVORITES_PER_STATION};
use crate::services::stations::StationCatalog;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use validator::Validate;

/// Per-scope locks serializing check-then-insert within this process.
pub type ScopeLocks = Arc<DashMap<Scope, Arc<Mutex<()>>>>;

/// Held scope lock. Dropping it releases the lock and forgets the scope's
/// entry when no other task holds or waits on it.
struct ScopeGuard<'a> {
    locks: &'a ScopeLocks,
    scope: Scope,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.scope, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Upper bound on the delay between subscription restarts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Restart policy for failed subscriptions.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Restarts allowed after consecutive failures; 0 disables restarts.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before restart number `attempt` (1-based), doubling each time.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

/// Validate a path segment used to address a scope or document.
pub(crate) fn check_segment(kind: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Missing {}", kind)));
    }
    if value.contains('/') {
        return Err(AppError::Validation(format!("Malformed {}", kind)));
    }
    Ok(())
}

fn check_venue(venue: &Venue) -> Result<(), AppError> {
    if venue.google_place_id.trim().is_empty() || venue.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Venue needs a place id and a name".to_string(),
        ));
    }
    if !venue.lat.is_finite() || !venue.lng.is_finite() {
        return Err(AppError::Validation("Venue coordinates are invalid".to_string()));
    }
    venue
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Favorites operations over a [`DocumentStore`].
#[derive(Clone)]
pub struct FavoritesService {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<StationCatalog>,
    scope_locks: ScopeLocks,
    retry: RetryPolicy,
}

impl FavoritesService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<StationCatalog>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            scope_locks: Arc::new(DashMap::new()),
            retry,
        }
    }

    /// Scope of a user's favorites at a catalog station.
    fn scope_for(&self, user_id: &str, station_id: &str) -> Result<Scope, AppError> {
        check_segment("user id", user_id)?;
        check_segment("station id", station_id)?;
        if !self.catalog.contains(station_id) {
            return Err(AppError::Validation(format!(
                "Unknown station {}",
                station_id
            )));
        }
        Ok(Scope::new(user_id, station_id))
    }

    /// Take the scope's lock, creating its entry on first use.
    async fn lock_scope(&self, scope: &Scope) -> ScopeGuard<'_> {
        let lock = self
            .scope_locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        ScopeGuard {
            locks: &self.scope_locks,
            scope: scope.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Save a venue as a favorite.
    ///
    /// Fails with `CapacityExceeded` when the scope is full and `Duplicate`
    /// when the place is already saved; neither writes anything.
    pub async fn add(
        &self,
        user_id: &str,
        station_id: &str,
        venue: &Venue,
    ) -> Result<FavoriteStore, AppError> {
        let scope = self.scope_for(user_id, station_id)?;
        check_venue(venue)?;

        let _guard = self.lock_scope(&scope).await;
        self.insert_checked(&scope, venue).await
    }

    /// Check-then-insert; callers hold the scope lock.
    async fn insert_checked(&self, scope: &Scope, venue: &Venue) -> Result<FavoriteStore, AppError> {
        let (user_id, station_id) = (scope.user_id.as_str(), scope.station_id.as_str());
        let count = self.store.count_favorites(scope).await?;
        if count >= MAX_FAVORITES_PER_STATION {
            tracing::info!(
                user_id,
                station_id,
                count,
                "Favorite rejected, station is full"
            );
            return Err(AppError::CapacityExceeded {
                limit: MAX_FAVORITES_PER_STATION,
            });
        }

        if self
            .store
            .find_favorite_by_place(scope, &venue.google_place_id)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate(venue.google_place_id.clone()));
        }

        let saved = self.store.insert_favorite(scope, venue).await?;
        tracing::info!(
            user_id,
            station_id,
            favorite_id = %saved.id,
            place_id = %saved.google_place_id,
            "Favorite added"
        );
        Ok(saved)
    }

    /// Delete a favorite by document id.
    pub async fn remove(
        &self,
        user_id: &str,
        station_id: &str,
        favorite_id: &str,
    ) -> Result<(), AppError> {
        let scope = self.scope_for(user_id, station_id)?;
        check_segment("favorite id", favorite_id)?;

        {
            let _guard = self.lock_scope(&scope).await;
            if self.store.get_favorite(&scope, favorite_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Favorite {}", favorite_id)));
            }
            self.store.delete_favorite(&scope, favorite_id).await?;
        }

        tracing::info!(user_id, station_id, favorite_id, "Favorite removed");
        Ok(())
    }

    /// One-shot read of a scope, oldest first.
    pub async fn list(
        &self,
        user_id: &str,
        station_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FavoriteStore>, AppError> {
        let scope = self.scope_for(user_id, station_id)?;
        self.store.list_favorites(&scope, limit).await
    }

    /// Open an independent live subscription to a scope.
    pub async fn subscribe(
        &self,
        user_id: &str,
        station_id: &str,
    ) -> Result<FavoritesSubscription, AppError> {
        let scope = self.scope_for(user_id, station_id)?;
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(crate::db::FEED_BUFFER);

        tokio::spawn(run_feed(
            self.store.clone(),
            scope.clone(),
            cancel.clone(),
            tx,
            self.retry,
        ));

        tracing::debug!(user_id, station_id, "Subscription opened");
        Ok(FavoritesSubscription {
            scope,
            cancel,
            updates: rx,
            current: Vec::new(),
        })
    }
}

enum FeedEnd {
    /// Cancelled, or nobody is listening any more.
    Stopped,
    Failed(AppError),
}

/// Forward one store feed until it fails or the subscription goes away.
async fn pump(
    store: &Arc<dyn DocumentStore>,
    scope: &Scope,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<Result<Vec<FavoriteStore>, AppError>>,
    failures: &mut u32,
) -> FeedEnd {
    let feed = tokio::select! {
        _ = cancel.cancelled() => return FeedEnd::Stopped,
        feed = store.watch_favorites(scope, cancel.child_token()) => feed,
    };
    let mut feed = match feed {
        Ok(feed) => feed,
        Err(e) => return FeedEnd::Failed(e),
    };

    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => return FeedEnd::Stopped,
            item = feed.recv() => item,
        };
        match item {
            Some(Ok(list)) => {
                *failures = 0;
                if tx.send(Ok(list)).await.is_err() {
                    return FeedEnd::Stopped;
                }
            }
            Some(Err(e)) => return FeedEnd::Failed(e),
            None if cancel.is_cancelled() => return FeedEnd::Stopped,
            None => {
                return FeedEnd::Failed(AppError::ReadFailure(
                    "Change feed closed".to_string(),
                ))
            }
        }
    }
}

/// Subscription supervisor: forwards feed deliveries and restarts failed feeds.
async fn run_feed(
    store: Arc<dyn DocumentStore>,
    scope: Scope,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<Vec<FavoriteStore>, AppError>>,
    retry: RetryPolicy,
) {
    let mut failures = 0u32;

    loop {
        let err = match pump(&store, &scope, &cancel, &tx, &mut failures).await {
            FeedEnd::Stopped => return,
            FeedEnd::Failed(e) => e,
        };

        // Subscribers only ever see ReadFailure from a feed
        let err = match err {
            AppError::ReadFailure(msg) => AppError::ReadFailure(msg),
            other => AppError::ReadFailure(other.to_string()),
        };
        tracing::warn!(
            user_id = %scope.user_id,
            station_id = %scope.station_id,
            error = %err,
            "Favorites subscription failed"
        );
        if tx.send(Err(err)).await.is_err() {
            return;
        }

        failures += 1;
        if failures > retry.max_attempts {
            tracing::warn!(
                user_id = %scope.user_id,
                station_id = %scope.station_id,
                attempts = retry.max_attempts,
                "Giving up on favorites subscription"
            );
            return;
        }

        let delay = retry.delay(failures);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Restarting subscription");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// A live view of one scope.
///
/// Each delivery is the complete current list. A failure is delivered once as
/// `ReadFailure` and resets [`current`](Self::current) to empty. Dropping the
/// subscription cancels it.
pub struct FavoritesSubscription {
    scope: Scope,
    cancel: CancellationToken,
    updates: mpsc::Receiver<Result<Vec<FavoriteStore>, AppError>>,
    current: Vec<FavoriteStore>,
}

impl FavoritesSubscription {
    /// Wait for the next delivery. `None` once cancelled or ended.
    pub async fn next(&mut self) -> Option<Result<Vec<FavoriteStore>, AppError>> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let item = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            item = self.updates.recv() => item?,
        };

        // Drop deliveries queued before a cancel
        if self.cancel.is_cancelled() {
            return None;
        }

        match &item {
            Ok(list) => self.current = list.clone(),
            Err(_) => self.current.clear(),
        }
        Some(item)
    }

    /// Last delivered list.
    pub fn current(&self) -> &[FavoriteStore] {
        &self.current
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Tear down the subscription. Safe to call more than once.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(
                user_id = %self.scope.user_id,
                station_id = %self.scope.station_id,
                "Subscription cancelled"
            );
            self.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Handle that cancels this subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for FavoritesSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One UI surface's view of favorites: at most one active subscription.
pub struct FavoritesAdapter {
    service: FavoritesService,
    active: Mutex<Option<CancellationToken>>,
}

impl FavoritesAdapter {
    pub fn new(service: FavoritesService) -> Self {
        Self {
            service,
            active: Mutex::new(None),
        }
    }

    /// Subscribe to a scope, tearing down the previous subscription first.
    pub async fn subscribe(
        &self,
        user_id: &str,
        station_id: &str,
    ) -> Result<FavoritesSubscription, AppError> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.cancel();
        }

        let subscription = self.service.subscribe(user_id, station_id).await?;
        *active = Some(subscription.cancel_handle());
        Ok(subscription)
    }

    /// Tear down the active subscription, if any.
    pub async fn unsubscribe(&self) {
        if let Some(previous) = self.active.lock().await.take() {
            previous.cancel();
        }
    }

    pub async fn add(
        &self,
        user_id: &str,
        station_id: &str,
        venue: &Venue,
    ) -> Result<FavoriteStore, AppError> {
        self.service.add(user_id, station_id, venue).await
    }

    pub async fn remove(
        &self,
        user_id: &str,
        station_id: &str,
        favorite_id: &str,
    ) -> Result<(), AppError> {
        self.service.remove(user_id, station_id, favorite_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> FavoritesService {
        FavoritesService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StationCatalog::bundled().unwrap()),
            RetryPolicy::default(),
        )
    }

    fn cafe(place_id: &str) -> Venue {
        Venue {
            google_place_id: place_id.to_string(),
            name: "Cafe".to_string(),
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
    async fn test_failed_removes_leave_no_locks() {
        let favorites = service();
        for i in 0..100 {
            let _ = favorites.remove("user-1", &format!("junk-{}", i), "nope").await;
            let _ = favorites.remove("user-1", "O7", &format!("nope-{}", i)).await;
        }
        assert!(favorites.scope_locks.is_empty());
    }

    #[tokio::test]
    async fn test_locks_released_after_concurrent_adds() {
        let favorites = service();
        let mut handles = Vec::new();
        for i in 0..20 {
            let favorites = favorites.clone();
            handles.push(tokio::spawn(async move {
                favorites.add("user-1", "O7", &cafe(&format!("p{}", i))).await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        assert!(favorites.scope_locks.is_empty());
        assert_eq!(
            favorites.list("user-1", "O7", None).await.unwrap().len(),
            MAX_FAVORITES_PER_STATION
        );
    }

    #[tokio::test]
    async fn test_unknown_station_rejected() {
        let favorites = service();
        assert!(matches!(
            favorites.add("user-1", "NOT-A-STATION", &cafe("p1")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            favorites.list("user-1", "NOT-A-STATION", None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            favorites.subscribe("user-1", "NOT-A-STATION").await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let retry = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(retry.delay(1), Duration::from_millis(100));
        assert_eq!(retry.delay(2), Duration::from_millis(200));
        assert_eq!(retry.delay(4), Duration::from_millis(800));
        assert_eq!(retry.delay(40), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_check_segment() {
        assert!(check_segment("station id", "O7").is_ok());
        assert!(matches!(
            check_segment("station id", "  "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            check_segment("station id", "a/b"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_check_venue_rejects_nan() {
        let venue = Venue {
            google_place_id: "p1".to_string(),
            name: "Cafe A".to_string(),
            address: String::new(),
            lat: f64::NAN,
            lng: 1.0,
            rating: None,
            user_ratings_total: None,
            main_photo_url: None,
            opening_hours_text: None,
        };
        assert!(matches!(check_venue(&venue), Err(AppError::Validation(_))));
    }
}
