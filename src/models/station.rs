// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Metro station reference data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A metro station from the bundled dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Station {
    /// Stable short code (e.g., "O7")
    pub id: String,
    /// Display name
    pub name: String,
    /// Line identifiers, in the order they are drawn
    pub lines: Vec<String>,
    /// Position on the static diagram image
    pub coords: DiagramCoords,
    /// Plus Code near the station exit, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_code: Option<String>,
    /// Real-world position. Stations without one cannot be shown on the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_coords: Option<LatLng>,
}

impl Station {
    /// Whether this station can be placed on an interactive map.
    pub fn has_real_coords(&self) -> bool {
        self.real_coords.is_some()
    }
}

/// Percentage-based position on the diagram (e.g., `"43.45%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DiagramCoords {
    pub x: String,
    pub y: String,
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// On-disk layout of the station dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDataset {
    /// Line id -> hex color
    #[serde(default)]
    pub line_colors: BTreeMap<String, String>,
    pub stations: Vec<Station>,
}
