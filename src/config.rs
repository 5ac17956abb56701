//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. A `.env` file is honored for local development.

use std::env;
use std::str::FromStr;

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Firestore => "firestore",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Public site origin; share links are built on it
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    pub store_backend: StoreBackend,
    /// Optional station dataset overriding the bundled one
    pub stations_path: Option<String>,
    /// Concurrent station reads when publishing a full map
    pub map_share_concurrency: usize,
    /// Subscription restarts after consecutive failures
    pub subscription_retry_attempts: u32,
    pub subscription_retry_base_ms: u64,
    pub places_timeout_secs: u64,
    /// Response language for place lookups
    pub places_language: String,
    /// Viewers' UTC offset, used to pick "today" for opening hours
    pub display_utc_offset_minutes: i32,

    // --- Secrets ---
    /// Google Maps Platform key for the Places API
    pub google_maps_api_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            stations_path: None,
            map_share_concurrency: 4,
            subscription_retry_attempts: 5,
            subscription_retry_base_ms: 500,
            places_timeout_secs: 10,
            places_language: "zh-TW".to_string(),
            display_utc_offset_minutes: 8 * 60,
            google_maps_api_key: "test_maps_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        Ok(Self {
            port: parse_or("PORT", defaults.port)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend: parse_or("STORE_BACKEND", StoreBackend::Firestore)?,
            stations_path: env::var("STATIONS_PATH").ok().filter(|p| !p.trim().is_empty()),
            map_share_concurrency: parse_or(
                "MAP_SHARE_CONCURRENCY",
                defaults.map_share_concurrency,
            )?,
            subscription_retry_attempts: parse_or(
                "SUBSCRIPTION_RETRY_ATTEMPTS",
                defaults.subscription_retry_attempts,
            )?,
            subscription_retry_base_ms: parse_or(
                "SUBSCRIPTION_RETRY_BASE_MS",
                defaults.subscription_retry_base_ms,
            )?,
            places_timeout_secs: parse_or("PLACES_TIMEOUT_SECS", defaults.places_timeout_secs)?,
            places_language: env::var("PLACES_LANGUAGE").unwrap_or(defaults.places_language),
            display_utc_offset_minutes: parse_or(
                "DISPLAY_UTC_OFFSET_MINUTES",
                defaults.display_utc_offset_minutes,
            )?,

            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_MAPS_API_KEY"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
