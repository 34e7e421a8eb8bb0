//! Trajectory Feature Engine
//!
//! Converts variable-length pixel trajectories into fixed-length
//! frequency-domain feature vectors for maneuver classification.

mod features;
mod fft;
mod resample;
mod statistics;

pub use features::{AbstractVehicle, Signal};
pub use fft::{FeatureConfig, FourierFeatureBuilder};
pub use resample::resample;
pub use statistics::SeriesSummary;

use thiserror::Error;

/// Errors during feature extraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureExtractionError {
    #[error("Vehicle {id}: empty trajectory")]
    EmptyTrajectory { id: u64 },

    #[error("Vehicle {id}: x has {xs} samples but y has {ys}")]
    LengthMismatch { id: u64, xs: usize, ys: usize },

    #[error("Vehicle {id}: non-finite sample at index {index}")]
    NonFinite { id: u64, index: usize },

    #[error("Signal length must be at least 1")]
    InvalidLength,
}
