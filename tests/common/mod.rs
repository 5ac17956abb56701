// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use metro_favorites::config::Config;
use metro_favorites::db::{FirestoreDb, MemoryStore};
use metro_favorites::error::AppError;
use metro_favorites::middleware::auth::create_jwt;
use metro_favorites::models::place::{DayTime, OpeningHours, OpeningPeriod};
use metro_favorites::models::station::DiagramCoords;
use metro_favorites::models::{
    LatLng, PhotoRef, PlaceDetails, Station, StationDataset, User, Venue,
};
use metro_favorites::routes::create_router;
use metro_favorites::services::{PlaceLookup, StationCatalog};
use metro_favorites::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique id for test isolation against a shared store.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

#[allow(dead_code)]
pub fn test_user(uid: &str) -> User {
    User {
        uid: uid.to_string(),
        display_name: Some("Test User".to_string()),
        email: Some("test@example.com".to_string()),
    }
}

/// Station without map coordinates, for catalogs built in tests.
#[allow(dead_code)]
pub fn unplaced_station(id: &str) -> Station {
    Station {
        id: id.to_string(),
        name: id.to_string(),
        lines: vec![],
        coords: DiagramCoords {
            x: "50%".to_string(),
            y: "50%".to_string(),
        },
        plus_code: None,
        real_coords: None,
    }
}

/// Bundled stations plus an unplaced "Central" station.
#[allow(dead_code)]
pub fn test_catalog() -> Arc<StationCatalog> {
    let mut dataset: StationDataset =
        serde_json::from_str(include_str!("../../data/stations.json"))
            .expect("Bundled stations should parse");
    dataset.stations.push(unplaced_station("Central"));
    Arc::new(StationCatalog::from_dataset(dataset).expect("Test catalog should load"))
}

/// Minimal venue with the given place id.
#[allow(dead_code)]
pub fn venue(place_id: &str, name: &str) -> Venue {
    Venue {
        google_place_id: place_id.to_string(),
        name: name.to_string(),
        address: format!("{} address", name),
        lat: 1.0,
        lng: 1.0,
        rating: None,
        user_ratings_total: None,
        main_photo_url: None,
        opening_hours_text: None,
    }
}

/// Places lookup backed by a fixed table.
#[derive(Default)]
pub struct FakePlaces {
    places: Mutex<HashMap<String, PlaceDetails>>,
}

#[allow(dead_code)]
impl FakePlaces {
    /// Places `p1` through `p20`, plus `photo-place` with photos and hours.
    pub fn seeded() -> Self {
        let fake = Self::default();
        for i in 1..=20 {
            fake.insert(plain_place(&format!("p{}", i), &format!("Cafe {}", i)));
        }

        let mut rich = plain_place("photo-place", "Noodle House");
        rich.rating = Some(4.6);
        rich.user_ratings_total = Some(321);
        rich.photos = vec![PhotoRef {
            photo_reference: "ref-1".to_string(),
            width: 1024,
            height: 768,
        }];
        rich.opening_hours = Some(OpeningHours {
            open_now: Some(true),
            weekday_text: vec!["Monday: 11:00 AM – 9:00 PM".to_string()],
            periods: (0..7)
                .map(|day| OpeningPeriod {
                    open: DayTime {
                        day,
                        hours: 11,
                        minutes: 0,
                    },
                    close: Some(DayTime {
                        day,
                        hours: 21,
                        minutes: 0,
                    }),
                })
                .collect(),
        });
        fake.insert(rich);
        fake
    }

    pub fn insert(&self, details: PlaceDetails) {
        self.places
            .lock()
            .unwrap()
            .insert(details.place_id.clone(), details);
    }
}

#[allow(dead_code)]
pub fn plain_place(place_id: &str, name: &str) -> PlaceDetails {
    PlaceDetails {
        place_id: place_id.to_string(),
        name: name.to_string(),
        formatted_address: format!("{} address", name),
        location: LatLng {
            lat: 22.63,
            lng: 120.31,
        },
        rating: None,
        user_ratings_total: None,
        photos: vec![],
        opening_hours: None,
        website: None,
        phone_number: None,
        types: vec![],
    }
}

#[async_trait]
impl PlaceLookup for FakePlaces {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, AppError> {
        self.places
            .lock()
            .unwrap()
            .get(place_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Place {}", place_id)))
    }

    fn photo_url(&self, photo: &PhotoRef, max_width: u32, max_height: u32) -> String {
        format!(
            "https://photos.test/{}?w={}&h={}",
            photo.photo_reference, max_width, max_height
        )
    }
}

/// Create a test app over an in-memory store and fake places lookup.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    let config = Config {
        frontend_url: "https://metro.test".to_string(),
        subscription_retry_attempts: 0,
        ..Config::default()
    };
    let store = MemoryStore::new();

    let state = Arc::new(AppState::new(
        config,
        Arc::new(store.clone()),
        test_catalog(),
        Arc::new(FakePlaces::seeded()),
    ));

    (create_router(state.clone()), state, store)
}

/// Session token for `user` signed with the test config key.
#[allow(dead_code)]
pub fn create_test_jwt(user: &User) -> String {
    create_jwt(user, &Config::default().jwt_signing_key).expect("Failed to create JWT")
}
