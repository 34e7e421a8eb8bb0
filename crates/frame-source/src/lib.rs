//! Frame Source Library for Maneuver Capture
//!
//! Presents pre-recorded, already frame-aligned videos as decoded frames.
//! Supports:
//! - Image-sequence sources (one directory of extracted frames per camera)
//! - In-memory sources for tests and synthetic scenes
//! - Stride-stepped batch synchronization across all viewing angles

pub mod frame;
pub mod source;
pub mod sync;

pub use frame::VideoFrame;
pub use source::{FrameSource, ImageSequenceSource, MemorySource};
pub use sync::{BatchSynchronizer, CameraFrame, FrameBatch};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Capture error types
#[derive(Error, Debug, Clone)]
pub enum CaptureError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },

    #[error("Frame step must be at least 1")]
    InvalidStep,

    #[error("No frame sources configured")]
    NoSources,
}

/// Fixed viewing angle of a camera around the scene, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraAngle(pub u16);

impl CameraAngle {
    pub fn degrees(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for CameraAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Viewing angles, one per source, in the order paths are supplied
    pub angles: Vec<u16>,
    /// Frames advanced per step on every camera
    pub step: usize,
    /// Accepted frame file extensions for image-sequence sources
    pub extensions: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            angles: vec![0, 90, 180, 270],
            step: 1,
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl CaptureConfig {
    /// Camera angles as typed values
    pub fn camera_angles(&self) -> Vec<CameraAngle> {
        self.angles.iter().copied().map(CameraAngle).collect()
    }
}
