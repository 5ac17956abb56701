// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Venue details as returned by the places lookup service.

use crate::models::station::LatLng;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Label used for days the venue is closed.
pub const CLOSED_LABEL: &str = "Closed";
/// Label used for open-ended periods.
pub const OPEN_ENDED_LABEL: &str = "(open)";

/// Venue details from the places service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub location: LatLng,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    pub opening_hours: Option<OpeningHours>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Opaque photo handle. Resolvable to an image URL at any later time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoRef {
    pub photo_reference: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Weekly schedule plus live open/closed state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
    /// One line per day, Monday first (e.g., "Monday: 9:00 AM – 5:00 PM")
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub periods: Vec<OpeningPeriod>,
}

/// A single open interval. `close` is absent for venues open around the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OpeningPeriod {
    pub open: DayTime,
    pub close: Option<DayTime>,
}

/// Day of week (0 = Sunday) and wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayTime {
    pub day: u8,
    pub hours: u8,
    pub minutes: u8,
}

impl DayTime {
    fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hours, self.minutes)
    }
}

impl OpeningHours {
    /// Summarize today's opening hours.
    ///
    /// Structured periods win over the weekday text. Returns `None` when
    /// neither source covers the given day.
    pub fn today_summary(&self, weekday: chrono::Weekday) -> Option<String> {
        let day = weekday.num_days_from_sunday() as u8;

        let todays: Vec<String> = self
            .periods
            .iter()
            .filter(|p| p.open.day == day)
            .map(|p| match &p.close {
                Some(close) => format!("{} – {}", p.open.hhmm(), close.hhmm()),
                None => format!("{} – {}", p.open.hhmm(), OPEN_ENDED_LABEL),
            })
            .collect();
        if !todays.is_empty() {
            return Some(todays.join(", "));
        }

        weekday_text_summary(&self.weekday_text, weekday)
    }
}

/// Today's line from Monday-first weekday text, without its day prefix.
pub fn weekday_text_summary(weekday_text: &[String], weekday: chrono::Weekday) -> Option<String> {
    let line = weekday_text.get(weekday.num_days_from_monday() as usize)?;

    if line.contains("Closed") || line.contains("休息") {
        return Some(CLOSED_LABEL.to_string());
    }

    // Localized text may use a full-width colon
    let time_part = match line.split_once([':', '：']) {
        Some((_, rest)) => rest.trim(),
        None => line.trim(),
    };
    if time_part.is_empty() {
        None
    } else {
        Some(time_part.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn week() -> Vec<String> {
        vec![
            "Monday: 9:00 AM – 5:00 PM".to_string(),
            "Tuesday: 9:00 AM – 5:00 PM".to_string(),
            "Wednesday: Closed".to_string(),
            "Thursday: 9:00 AM – 5:00 PM".to_string(),
            "Friday: 9:00 AM – 9:00 PM".to_string(),
            "Saturday: 10:00 AM – 9:00 PM".to_string(),
            "Sunday: 10:00 AM – 6:00 PM".to_string(),
        ]
    }

    #[test]
    fn test_weekday_text_strips_day_prefix() {
        assert_eq!(
            weekday_text_summary(&week(), Weekday::Fri).as_deref(),
            Some("9:00 AM – 9:00 PM")
        );
        assert_eq!(
            weekday_text_summary(&week(), Weekday::Sun).as_deref(),
            Some("10:00 AM – 6:00 PM")
        );
    }

    #[test]
    fn test_closed_day() {
        assert_eq!(
            weekday_text_summary(&week(), Weekday::Wed).as_deref(),
            Some(CLOSED_LABEL)
        );

        let zh = vec!["星期一: 休息".to_string()];
        assert_eq!(
            weekday_text_summary(&zh, Weekday::Mon).as_deref(),
            Some(CLOSED_LABEL)
        );
    }

    #[test]
    fn test_full_width_colon() {
        let zh = vec!["星期一：11:00 – 21:00".to_string()];
        assert_eq!(
            weekday_text_summary(&zh, Weekday::Mon).as_deref(),
            Some("11:00 – 21:00")
        );
    }

    #[test]
    fn test_missing_day_is_none() {
        assert_eq!(weekday_text_summary(&[], Weekday::Mon), None);
    }

    #[test]
    fn test_periods_take_precedence() {
        let hours = OpeningHours {
            open_now: Some(true),
            weekday_text: week(),
            periods: vec![
                OpeningPeriod {
                    open: DayTime { day: 1, hours: 8, minutes: 0 },
                    close: Some(DayTime { day: 1, hours: 12, minutes: 30 }),
                },
                OpeningPeriod {
                    open: DayTime { day: 1, hours: 17, minutes: 5 },
                    close: Some(DayTime { day: 1, hours: 22, minutes: 0 }),
                },
                OpeningPeriod {
                    open: DayTime { day: 2, hours: 8, minutes: 0 },
                    close: None,
                },
            ],
        };

        assert_eq!(
            hours.today_summary(Weekday::Mon).as_deref(),
            Some("08:00 – 12:30, 17:05 – 22:00")
        );
        assert_eq!(
            hours.today_summary(Weekday::Tue).as_deref(),
            Some("08:00 – (open)")
        );
        // No periods for Friday: falls back to the text
        assert_eq!(
            hours.today_summary(Weekday::Fri).as_deref(),
            Some("9:00 AM – 9:00 PM")
        );
    }
}
