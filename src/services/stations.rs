// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Station catalog loading and lookup.

use crate::models::station::{Station, StationDataset};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Dataset compiled into the binary.
const BUNDLED_STATIONS: &str = include_str!("../../data/stations.json");

/// Immutable catalog of metro stations, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
    line_colors: BTreeMap<String, String>,
}

impl StationCatalog {
    /// Load the dataset bundled with the binary.
    pub fn bundled() -> Result<Self, StationCatalogError> {
        Self::load_from_json(BUNDLED_STATIONS)
    }

    /// Load stations from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StationCatalogError> {
        let json_data = fs::read_to_string(path.as_ref())
            .map_err(|e| StationCatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load stations from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, StationCatalogError> {
        let dataset: StationDataset = serde_json::from_str(json_data)
            .map_err(|e| StationCatalogError::ParseError(e.to_string()))?;
        Self::from_dataset(dataset)
    }

    /// Build a catalog, rejecting blank or repeated station ids.
    pub fn from_dataset(dataset: StationDataset) -> Result<Self, StationCatalogError> {
        let mut index = HashMap::with_capacity(dataset.stations.len());

        for (pos, station) in dataset.stations.iter().enumerate() {
            let id = station.id.trim();
            if id.is_empty() || id.contains('/') {
                return Err(StationCatalogError::InvalidId(station.id.clone()));
            }
            if index.insert(station.id.clone(), pos).is_some() {
                return Err(StationCatalogError::DuplicateId(station.id.clone()));
            }
        }

        tracing::info!(count = dataset.stations.len(), "Loaded stations");
        Ok(Self {
            stations: dataset.stations,
            index,
            line_colors: dataset.line_colors,
        })
    }

    /// All stations, in dataset order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Look up a station by id.
    pub fn get(&self, station_id: &str) -> Option<&Station> {
        self.index.get(station_id).map(|&pos| &self.stations[pos])
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.index.contains_key(station_id)
    }

    /// Line id -> display color.
    pub fn line_colors(&self) -> &BTreeMap<String, String> {
        &self.line_colors
    }
}

/// Errors from station catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum StationCatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse station data: {0}")]
    ParseError(String),

    #[error("Invalid station id: {0:?}")]
    InvalidId(String),

    #[error("Duplicate station id: {0}")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_dataset_loads() {
        let catalog = StationCatalog::bundled().unwrap();
        assert!(!catalog.stations().is_empty());

        let station = catalog.get("O7").expect("O7 should be bundled");
        assert_eq!(station.name, "文化中心");
        assert!(station.has_real_coords());
        assert_eq!(catalog.line_colors()["orange"], "#FF6F00");
    }

    #[test]
    fn test_unknown_station() {
        let catalog = StationCatalog::bundled().unwrap();
        assert!(catalog.get("Z99").is_none());
        assert!(!catalog.contains("Z99"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"stations": [
            {"id": "A1", "name": "One", "lines": [], "coords": {"x": "1%", "y": "1%"}},
            {"id": "A1", "name": "Two", "lines": [], "coords": {"x": "2%", "y": "2%"}}
        ]}"#;
        assert!(matches!(
            StationCatalog::load_from_json(json),
            Err(StationCatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_path_like_ids_rejected() {
        let json = r#"{"stations": [
            {"id": "A/1", "name": "One", "lines": [], "coords": {"x": "1%", "y": "1%"}}
        ]}"#;
        assert!(matches!(
            StationCatalog::load_from_json(json),
            Err(StationCatalogError::InvalidId(_))
        ));
    }

    #[test]
    fn test_missing_real_coords_is_allowed() {
        let json = r#"{"stations": [
            {"id": "A1", "name": "One", "lines": ["red"], "coords": {"x": "1%", "y": "1%"}}
        ]}"#;
        let catalog = StationCatalog::load_from_json(json).unwrap();
        assert!(!catalog.get("A1").unwrap().has_real_coords());
    }
}
