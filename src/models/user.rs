//! Signed-in user identity.

use serde::{Deserialize, Serialize};

/// Generic owner label for single-station shares.
pub const DEFAULT_SHARER_NAME: &str = "一位使用者";
/// Generic owner label for full-map shares.
pub const DEFAULT_MAP_SHARER_NAME: &str = "一位熱心的分享者";

/// Identity from the auth provider. Read-only to this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque auth provider uid
    pub uid: String,
    /// Display name (may be None if not set)
    pub display_name: Option<String>,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
}

impl User {
    /// Name shown on published shares: display name, then email, then `fallback`.
    pub fn share_name(&self, fallback: &str) -> String {
        [self.display_name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}
