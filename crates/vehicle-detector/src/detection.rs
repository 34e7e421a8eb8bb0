//! Vehicle detections

use frame_source::CameraAngle;
use serde::{Deserialize, Serialize};

/// A single vehicle detection in one frame of one camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Centroid x (pixels)
    pub x: f64,

    /// Centroid y (pixels)
    pub y: f64,

    /// Detection confidence
    pub confidence: f32,

    /// Camera the detection came from
    pub angle: CameraAngle,

    /// Frame the detection belongs to
    pub frame_index: usize,
}

impl Detection {
    pub fn new(x: f64, y: f64, confidence: f32, angle: CameraAngle, frame_index: usize) -> Self {
        Self {
            x,
            y,
            confidence,
            angle,
            frame_index,
        }
    }

    /// Euclidean pixel distance to a point
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Whether both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
