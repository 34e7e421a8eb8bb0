//! Tracking configuration

use serde::{Deserialize, Serialize};

use crate::TrackingError;

/// How a track's position is predicted for the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModel {
    /// Last known position
    Static,
    /// Last position advanced by the velocity between the last two positions
    ConstantVelocity,
}

/// Tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Maximum pixel distance between prediction and detection for a match (D)
    pub max_match_distance: f64,

    /// Consecutive missed steps after which a track is lost (K)
    pub max_missed_steps: u32,

    /// Position prediction model
    pub motion_model: MotionModel,

    /// Frame width in pixels; detections beyond it are dropped
    pub frame_width: Option<f64>,

    /// Frame height in pixels; detections beyond it are dropped
    pub frame_height: Option<f64>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_match_distance: 50.0,
            max_missed_steps: 5,
            motion_model: MotionModel::ConstantVelocity,
            frame_width: None,
            frame_height: None,
        }
    }
}

impl TrackingConfig {
    /// Check numeric ranges
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !self.max_match_distance.is_finite() || self.max_match_distance <= 0.0 {
            return Err(TrackingError::InvalidConfig(format!(
                "max_match_distance must be a positive number, got {}",
                self.max_match_distance
            )));
        }
        for (name, bound) in [("frame_width", self.frame_width), ("frame_height", self.frame_height)] {
            if let Some(v) = bound {
                if !v.is_finite() || v <= 0.0 {
                    return Err(TrackingError::InvalidConfig(format!(
                        "{} must be positive, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether a coordinate lies inside the frame
    pub fn in_bounds(&self, x: f64, y: f64) -> bool {
        x >= 0.0
            && y >= 0.0
            && self.frame_width.map_or(true, |w| x <= w)
            && self.frame_height.map_or(true, |h| y <= h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TrackingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_distance() {
        let config = TrackingConfig {
            max_match_distance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TrackingConfig {
            max_match_distance: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounds() {
        let config = TrackingConfig {
            frame_width: Some(640.0),
            frame_height: Some(480.0),
            ..Default::default()
        };
        assert!(config.in_bounds(0.0, 0.0));
        assert!(config.in_bounds(640.0, 480.0));
        assert!(!config.in_bounds(641.0, 10.0));
        assert!(!config.in_bounds(-1.0, 10.0));
    }
}
