//! Dataset Export
//!
//! Persists labeled vehicle features for classifier training: one `.npz`
//! record per vehicle inside a run-identified directory, plus a JSON manifest.
//!
//! Record layout:
//! - `x_sig`, `y_sig`: 1-D `f64` arrays of length L
//! - `label`: 1-D `u8` array holding the whole UTF-8 label, not a one-element
//!   string array. numpy readers recover it with
//!   `bytes(record["label"]).decode()`; indexing `label[0]` yields one byte.

mod manifest;
mod writer;

pub use manifest::{ExcludedEntry, Manifest, ManifestEntry};
pub use writer::{run_id_now, DatasetWriter, ExportConfig};

use thiserror::Error;

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("NPZ encoding error: {0}")]
    Npz(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Vehicle {0} already exported")]
    Duplicate(u64),
}
