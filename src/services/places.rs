// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Places API client for venue lookups.
//!
//! Handles:
//! - Place details by place id
//! - Photo reference to image URL resolution
//! - Quota errors (surfaced as a retryable places error)

use crate::error::AppError;
use crate::models::place::{OpeningHours, OpeningPeriod, PhotoRef, PlaceDetails};
use crate::models::station::LatLng;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Fields requested from the details endpoint.
const DETAIL_FIELDS: &str = "name,formatted_address,geometry/location,place_id,rating,\
user_ratings_total,photos,opening_hours,types,website,formatted_phone_number";

/// Venue lookup service.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Fetch details for a place id.
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, AppError>;

    /// Resolve a photo reference to an image URL of at most the given size.
    fn photo_url(&self, photo: &PhotoRef, max_width: u32, max_height: u32) -> String;
}

/// Google Places API client.
#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl PlacesClient {
    /// Create a new client with an API key.
    pub fn new(api_key: String, language: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            api_key,
            language,
        })
    }

    /// Point the client at a different endpoint (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, AppError> {
        let url = format!("{}/details/json", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("language", self.language.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::PlacesApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PlacesApi(format!("HTTP {}: {}", status, body)));
        }

        let body: DetailsResponse = response
            .json()
            .await
            .map_err(|e| AppError::PlacesApi(format!("Invalid response: {}", e)))?;

        body.into_details(place_id)
    }

    fn photo_url(&self, photo: &PhotoRef, max_width: u32, max_height: u32) -> String {
        format!(
            "{}/photo?maxwidth={}&maxheight={}&photo_reference={}&key={}",
            self.base_url,
            max_width,
            max_height,
            urlencoding::encode(&photo.photo_reference),
            urlencoding::encode(&self.api_key)
        )
    }
}

// ─── Wire format ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    result: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Option<RawGeometry>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    #[serde(default)]
    photos: Vec<RawPhoto>,
    opening_hours: Option<RawOpeningHours>,
    website: Option<String>,
    formatted_phone_number: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    photo_reference: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
    #[serde(default)]
    periods: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
struct RawPeriod {
    open: RawDayTime,
    close: Option<RawDayTime>,
}

/// Day plus "HHMM" time, as the details endpoint returns it.
#[derive(Debug, Deserialize)]
struct RawDayTime {
    day: u8,
    time: String,
}

impl RawDayTime {
    fn parse(&self) -> Option<crate::models::place::DayTime> {
        if self.time.len() != 4 || !self.time.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours = self.time[..2].parse().ok()?;
        let minutes = self.time[2..].parse().ok()?;
        Some(crate::models::place::DayTime {
            day: self.day,
            hours,
            minutes,
        })
    }
}

impl DetailsResponse {
    fn into_details(self, requested_id: &str) -> Result<PlaceDetails, AppError> {
        match self.status.as_str() {
            "OK" => {}
            "NOT_FOUND" | "ZERO_RESULTS" | "INVALID_REQUEST" => {
                return Err(AppError::NotFound(format!("Place {}", requested_id)));
            }
            "OVER_QUERY_LIMIT" => {
                tracing::warn!("Places API quota exceeded");
                return Err(AppError::PlacesApi("Quota exceeded".to_string()));
            }
            other => {
                return Err(AppError::PlacesApi(format!(
                    "{}: {}",
                    other,
                    self.error_message.unwrap_or_default()
                )));
            }
        }

        let raw = self
            .result
            .ok_or_else(|| AppError::PlacesApi("Missing result".to_string()))?;

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Place has no name".to_string()))?;
        let location = raw
            .geometry
            .map(|g| g.location)
            .ok_or_else(|| AppError::Validation("Place has no location".to_string()))?;

        let opening_hours = raw.opening_hours.map(|hours| OpeningHours {
            open_now: hours.open_now,
            weekday_text: hours.weekday_text,
            periods: hours
                .periods
                .iter()
                .filter_map(|p| {
                    Some(OpeningPeriod {
                        open: p.open.parse()?,
                        close: p.close.as_ref().and_then(RawDayTime::parse),
                    })
                })
                .collect(),
        });

        Ok(PlaceDetails {
            place_id: raw.place_id.unwrap_or_else(|| requested_id.to_string()),
            name,
            formatted_address: raw.formatted_address.unwrap_or_default(),
            location,
            rating: raw.rating,
            user_ratings_total: raw.user_ratings_total,
            photos: raw
                .photos
                .into_iter()
                .map(|p| PhotoRef {
                    photo_reference: p.photo_reference,
                    width: p.width,
                    height: p.height,
                })
                .collect(),
            opening_hours,
            website: raw.website,
            phone_number: raw.formatted_phone_number,
            types: raw.types,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "OK",
        "result": {
            "place_id": "ChIJabc",
            "name": "Cafe A",
            "formatted_address": "No. 1, Wufu 1st Rd",
            "geometry": { "location": { "lat": 22.63, "lng": 120.31 } },
            "rating": 4.4,
            "user_ratings_total": 120,
            "photos": [{ "photo_reference": "ref-1", "width": 800, "height": 600 }],
            "opening_hours": {
                "open_now": true,
                "weekday_text": ["Monday: 9:00 AM – 5:00 PM"],
                "periods": [
                    { "open": { "day": 1, "time": "0900" }, "close": { "day": 1, "time": "1700" } },
                    { "open": { "day": 2, "time": "bad" } }
                ]
            },
            "types": ["cafe", "food"]
        }
    }"#;

    fn client() -> PlacesClient {
        PlacesClient::new("key".into(), "zh-TW".into(), Duration::from_secs(5))
            .unwrap()
            .with_base_url("https://places.test/api")
    }

    #[test]
    fn test_parse_details() {
        let body: DetailsResponse = serde_json::from_str(SAMPLE).unwrap();
        let details = body.into_details("ChIJabc").unwrap();

        assert_eq!(details.name, "Cafe A");
        assert_eq!(details.location.lat, 22.63);
        assert_eq!(details.user_ratings_total, Some(120));
        assert_eq!(details.photos.len(), 1);

        let hours = details.opening_hours.unwrap();
        assert_eq!(hours.open_now, Some(true));
        // The malformed period is dropped
        assert_eq!(hours.periods.len(), 1);
        assert_eq!(hours.periods[0].close.unwrap().hours, 17);
    }

    #[test]
    fn test_not_found_status() {
        let body: DetailsResponse =
            serde_json::from_str(r#"{"status": "NOT_FOUND"}"#).unwrap();
        assert!(matches!(
            body.into_details("missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_quota_status() {
        let body: DetailsResponse =
            serde_json::from_str(r#"{"status": "OVER_QUERY_LIMIT"}"#).unwrap();
        assert!(matches!(
            body.into_details("p"),
            Err(AppError::PlacesApi(_))
        ));
    }

    #[test]
    fn test_photo_url() {
        let url = client().photo_url(
            &PhotoRef {
                photo_reference: "a b".into(),
                width: 0,
                height: 0,
            },
            300,
            200,
        );
        assert_eq!(
            url,
            "https://places.test/api/photo?maxwidth=300&maxheight=200&photo_reference=a%20b&key=key"
        );
    }

    #[test]
    fn test_venue_from_place_applies_allow_list() {
        use crate::models::Venue;

        let body: DetailsResponse = serde_json::from_str(SAMPLE).unwrap();
        let details = body.into_details("ChIJabc").unwrap();
        let venue = Venue::from_place(&details, &client());

        assert_eq!(venue.google_place_id, "ChIJabc");
        assert_eq!(venue.rating, Some(4.4));
        assert_eq!(
            venue.main_photo_url.as_deref(),
            Some("https://places.test/api/photo?maxwidth=300&maxheight=200&photo_reference=ref-1&key=key")
        );
        assert_eq!(
            venue.opening_hours_text,
            Some(vec!["Monday: 9:00 AM – 5:00 PM".to_string()])
        );
    }
}
