//! Maneuver Trajectory Pipeline
//!
//! Drives the step loop over four pre-recorded camera angles:
//! - Synchronized frame batches, detected per camera in parallel
//! - Tracking controller updated once per step
//! - Parallel Fourier feature extraction over finalized tracks
//! - Optional dataset export and interactive trajectory inspection

pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod plot;

pub use cli::{Cli, Invocation};
pub use config::{LoggingConfig, PipelineConfig};
pub use orchestrator::{Orchestrator, PipelineRun, RunReport};
pub use plot::run_plot_prompt;

use std::str::FromStr;

use dataset_export::ExportError;
use feature_engine::FeatureExtractionError;
use frame_source::CaptureError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracking::TrackingError;
use vehicle_detector::DetectionError;

/// Number of camera paths a run requires
pub const REQUIRED_PATHS: usize = 4;

/// Label used when no maneuver is given
pub const DEFAULT_MANEUVER: &str = "DEFAULT";

/// Startup errors; nothing runs after one of these
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("--parse requires --maneuver")]
    MissingManeuver,

    #[error("--video-path-list must contain {expected} paths, got {got}")]
    PathCount { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Pipeline setup and export errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Capture setup failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Detector setup failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Tracking setup failed: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Feature setup failed: {0}")]
    Features(#[from] FeatureExtractionError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Install the global fmt subscriber at the configured level
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigurationError> {
    let level = Level::from_str(&config.level)
        .map_err(|_| ConfigurationError::Invalid(format!("unknown log level '{}'", config.level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigurationError::Logging(e.to_string()))
}
