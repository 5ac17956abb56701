//! Database layer.
//!
//! Services talk to the remote document store through [`DocumentStore`], so the
//! Firestore client can be swapped for the in-memory store in tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{FavoriteStore, FullMapShare, Scope, SingleStationShare, Venue};
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user container of station scopes (`users/{uid}/favoriteStoresByStation/{stationId}`)
    pub const FAVORITES_BY_STATION: &str = "favoriteStoresByStation";
    /// Favorites inside one station scope
    pub const STORES: &str = "stores";
    /// Public single-station snapshots
    pub const PUBLIC_SHARED_VIEWS: &str = "publicSharedViews";
    /// Public full-map snapshots
    pub const PUBLIC_SHARED_FULL_MAPS: &str = "publicSharedFullMaps";
}

/// Capacity of a change feed channel.
pub const FEED_BUFFER: usize = 16;

/// Full-list snapshots of one scope. Ends after delivering an error.
pub type FavoritesFeed = mpsc::Receiver<Result<Vec<FavoriteStore>, AppError>>;

/// Remote document store operations used by the services.
///
/// Reads return [`AppError::ReadFailure`] on transport errors, writes return
/// [`AppError::WriteFailure`]. Lists come back in `addedAt` order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Favorites in a scope, oldest first, at most `limit` when given.
    async fn list_favorites(
        &self,
        scope: &Scope,
        limit: Option<usize>,
    ) -> Result<Vec<FavoriteStore>, AppError>;

    /// Number of favorites in a scope.
    async fn count_favorites(&self, scope: &Scope) -> Result<usize, AppError>;

    /// Favorite with the given place id, if saved in this scope.
    async fn find_favorite_by_place(
        &self,
        scope: &Scope,
        google_place_id: &str,
    ) -> Result<Option<FavoriteStore>, AppError>;

    /// Favorite by document id.
    async fn get_favorite(&self, scope: &Scope, id: &str)
        -> Result<Option<FavoriteStore>, AppError>;

    /// Append a favorite. The store assigns the document id and `addedAt`.
    async fn insert_favorite(&self, scope: &Scope, venue: &Venue)
        -> Result<FavoriteStore, AppError>;

    /// Delete a favorite by document id.
    async fn delete_favorite(&self, scope: &Scope, id: &str) -> Result<(), AppError>;

    /// Open a change feed on a scope.
    ///
    /// The current list is delivered first, then the full list again after
    /// every change. The feed stops when `cancel` fires or the receiver is
    /// dropped.
    async fn watch_favorites(
        &self,
        scope: &Scope,
        cancel: CancellationToken,
    ) -> Result<FavoritesFeed, AppError>;

    /// Insert a single-station share. Returns it with `id` and `createdAt` set.
    async fn insert_station_share(
        &self,
        share: &SingleStationShare,
    ) -> Result<SingleStationShare, AppError>;

    async fn get_station_share(&self, id: &str) -> Result<Option<SingleStationShare>, AppError>;

    /// Insert a full-map share. Returns it with `id` and `createdAt` set.
    async fn insert_map_share(&self, share: &FullMapShare) -> Result<FullMapShare, AppError>;

    async fn get_map_share(&self, id: &str) -> Result<Option<FullMapShare>, AppError>;
}

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const AUTO_ID_LEN: usize = 20;
// Largest multiple of the alphabet size that fits in a byte; bytes above it are rejected.
const AUTO_ID_BYTE_LIMIT: u8 = 248;

/// Generate a 20-character document id in the Firestore auto-id format.
pub fn auto_id() -> Result<String, AppError> {
    let rng = SystemRandom::new();
    let mut id = String::with_capacity(AUTO_ID_LEN);
    let mut buf = [0u8; AUTO_ID_LEN * 2];

    while id.len() < AUTO_ID_LEN {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        for &b in buf.iter().filter(|&&b| b < AUTO_ID_BYTE_LIMIT) {
            if id.len() == AUTO_ID_LEN {
                break;
            }
            id.push(AUTO_ID_ALPHABET[(b as usize) % AUTO_ID_ALPHABET.len()] as char);
        }
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_auto_id_format() {
        let id = auto_id().unwrap();
        assert_eq!(id.len(), AUTO_ID_LEN);
        assert!(id.bytes().all(|b| AUTO_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_auto_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| auto_id().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
