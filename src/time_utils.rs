// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, Utc, Weekday};

/// Format a UTC timestamp as RFC3339 with microseconds and a `Z` suffix.
///
/// The fixed width keeps lexical order equal to chronological order, which the
/// stores rely on when sorting by `addedAt`.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time, formatted with [`format_utc_rfc3339`].
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Weekday at `now` for viewers `offset_minutes` east of UTC.
///
/// Offsets outside ±24h fall back to UTC.
pub fn weekday_at_offset(now: DateTime<Utc>, offset_minutes: i32) -> Weekday {
    match offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
    {
        Some(offset) => now.with_timezone(&offset).weekday(),
        None => now.weekday(),
    }
}
