//! Run manifest

use chrono::{DateTime, Utc};
use feature_engine::SeriesSummary;
use serde::{Deserialize, Serialize};

/// One exported vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u64,
    /// File name relative to the run directory
    pub file: String,
    pub label: String,
    /// Raw trajectory length before resampling
    pub samples: usize,
    pub x: SeriesSummary,
    pub y: SeriesSummary,
}

/// A vehicle left out of the export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedEntry {
    pub id: u64,
    pub reason: String,
}

/// Summary of one export run, written as `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub maneuver: String,
    pub created_at: DateTime<Utc>,
    pub vehicles: Vec<ManifestEntry>,
    pub excluded: Vec<ExcludedEntry>,
}
