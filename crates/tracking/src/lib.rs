//! Vehicle Tracking
//!
//! Turns per-step detections from every camera into persistent per-vehicle
//! tracks:
//! - Greedy nearest-distance correspondence against predicted positions
//! - Track lifecycle (creation, continuation, loss)
//! - Append-only position history retained after loss
//! - Trajectory lookup by id or creation order

pub mod config;
pub mod controller;
pub mod matching;
pub mod query;
pub mod track;

pub use config::{MotionModel, TrackingConfig};
pub use controller::{StepDetections, TrackingController, TrackingStats};
pub use matching::{greedy_assign, Assignment, Prediction};
pub use query::{TrackSet, Trajectory, TrajectoryLookupError, TrajectoryQuery};
pub use track::{Position, Track, TrackStatus};

use thiserror::Error;

/// Tracking error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error("Out-of-order batch: frame {received} after frame {last}")]
    OutOfOrder { last: usize, received: usize },

    #[error("Invalid tracking configuration: {0}")]
    InvalidConfig(String),
}
