//! Dataset Writer Implementation

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use feature_engine::{AbstractVehicle, SeriesSummary};
use ndarray::Array1;
use ndarray_npy::NpzWriter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{ExcludedEntry, ExportError, Manifest, ManifestEntry};

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Parent directory of all run directories
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "assets/parsed".to_string(),
        }
    }
}

/// Run identifier from the current time: `<unix_secs>-<micros>`
pub fn run_id_now() -> String {
    let now = Utc::now();
    format!("{}-{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Writes the records of one run
pub struct DatasetWriter {
    run_id: String,
    run_dir: PathBuf,
    /// Upper-cased maneuver, used for file names and default labels
    maneuver: String,
    vehicles: Vec<ManifestEntry>,
    excluded: Vec<ExcludedEntry>,
}

impl DatasetWriter {
    /// Create a writer with a fresh run directory under `config.output_dir`
    pub fn create(config: &ExportConfig, maneuver: &str) -> Result<Self, ExportError> {
        Self::with_run_id(&config.output_dir, &run_id_now(), maneuver)
    }

    /// Create a writer for an explicit run id
    pub fn with_run_id(base: impl AsRef<Path>, run_id: &str, maneuver: &str) -> Result<Self, ExportError> {
        let run_dir = base.as_ref().join(run_id);
        std::fs::create_dir_all(&run_dir)?;
        info!("Exporting dataset to {}", run_dir.display());

        Ok(Self {
            run_id: run_id.to_string(),
            run_dir,
            maneuver: maneuver.to_uppercase(),
            vehicles: Vec::new(),
            excluded: Vec::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn maneuver(&self) -> &str {
        &self.maneuver
    }

    /// Number of vehicles written so far
    pub fn exported_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Write one vehicle as `{MANEUVER}_{id}.npz` with arrays `x_sig`, `y_sig`
    /// and `label` (see the crate docs for the label encoding). `xs`/`ys` is
    /// the raw trajectory, summarised in the manifest.
    ///
    /// On error no record for the vehicle is left in the run directory.
    pub fn write_vehicle(
        &mut self,
        vehicle: &AbstractVehicle,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<PathBuf, ExportError> {
        if self.vehicles.iter().any(|v| v.id == vehicle.id()) {
            return Err(ExportError::Duplicate(vehicle.id()));
        }

        let label = vehicle
            .label()
            .map(str::to_uppercase)
            .unwrap_or_else(|| self.maneuver.clone());
        let file_name = format!("{}_{}.npz", self.maneuver, vehicle.id());
        let path = self.run_dir.join(&file_name);

        // Only complete records ever carry the `.npz` name.
        let partial = self.run_dir.join(format!("{}.part", file_name));
        if let Err(e) = write_npz(&partial, vehicle, &label).and_then(|()| {
            std::fs::rename(&partial, &path).map_err(ExportError::from)
        }) {
            if partial.exists() {
                if let Err(cleanup) = std::fs::remove_file(&partial) {
                    warn!("Failed to remove {}: {}", partial.display(), cleanup);
                }
            }
            return Err(e);
        }

        debug!("Wrote vehicle {} to {}", vehicle.id(), path.display());

        self.vehicles.push(ManifestEntry {
            id: vehicle.id(),
            file: file_name,
            label,
            samples: xs.len(),
            x: SeriesSummary::compute(xs),
            y: SeriesSummary::compute(ys),
        });

        Ok(path)
    }

    /// Record a vehicle that will not be exported
    pub fn record_excluded(&mut self, id: u64, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Vehicle {} excluded from export: {}", id, reason);
        self.excluded.push(ExcludedEntry { id, reason });
    }

    /// Write `manifest.json` and return the manifest
    pub fn finish(self) -> Result<Manifest, ExportError> {
        let manifest = Manifest {
            run_id: self.run_id,
            maneuver: self.maneuver,
            created_at: Utc::now(),
            vehicles: self.vehicles,
            excluded: self.excluded,
        };

        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| ExportError::SerializationError(e.to_string()))?;
        std::fs::write(self.run_dir.join("manifest.json"), json)?;

        info!(
            "Export finished: {} vehicles, {} excluded",
            manifest.vehicles.len(),
            manifest.excluded.len()
        );
        Ok(manifest)
    }
}

fn write_npz(path: &Path, vehicle: &AbstractVehicle, label: &str) -> Result<(), ExportError> {
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array("x_sig", &Array1::from(vehicle.signal().x_sig().to_vec()))
        .map_err(|e| ExportError::Npz(e.to_string()))?;
    npz.add_array("y_sig", &Array1::from(vehicle.signal().y_sig().to_vec()))
        .map_err(|e| ExportError::Npz(e.to_string()))?;
    npz.add_array("label", &Array1::from(label.as_bytes().to_vec()))
        .map_err(|e| ExportError::Npz(e.to_string()))?;
    npz.finish().map_err(|e| ExportError::Npz(e.to_string()))?;
    Ok(())
}
