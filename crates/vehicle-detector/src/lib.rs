//! Vehicle Detection
//!
//! Maps one decoded frame to zero or more vehicle centroids:
//! - Motion detection (frame differencing and blob grouping)
//! - ONNX object detection (YOLO-style models via tract)
//!
//! Consumers depend only on the [`Detector`] trait, so any implementation can
//! be substituted without touching the tracking code.

pub mod config;
pub mod detection;
pub mod motion;
pub mod onnx;

pub use config::{DetectorConfig, DetectorKind, MotionConfig};
pub use detection::Detection;
pub use motion::MotionDetector;
pub use onnx::OnnxDetector;

use frame_source::{CameraAngle, VideoFrame};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Detection error types
#[derive(Error, Debug, Clone)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Per-frame vehicle detection capability
pub trait Detector: Send {
    /// Detect vehicles in `frame`, captured from `angle`
    fn detect(&mut self, frame: &VideoFrame, angle: CameraAngle) -> Result<Vec<Detection>, DetectionError>;
}

/// Builds one detector per camera
///
/// Model weights are loaded once and shared; per-camera state (such as the
/// previous frame of a motion detector) is never shared between viewpoints.
pub struct DetectorFactory {
    config: DetectorConfig,
    model: Option<Arc<onnx::OnnxPlan>>,
}

impl DetectorFactory {
    /// Create a factory, loading the model if the config asks for one
    pub fn new(config: DetectorConfig) -> Result<Self, DetectionError> {
        let model = match config.kind {
            DetectorKind::Onnx => {
                let path = config.model_path.as_deref().ok_or_else(|| {
                    DetectionError::ModelLoad("onnx detector requires model_path".to_string())
                })?;
                Some(onnx::load_plan(path, config.input_size)?)
            }
            DetectorKind::Motion => None,
        };

        info!("Detector factory ready: kind={:?}", config.kind);
        Ok(Self { config, model })
    }

    /// Create a detector for one camera
    pub fn create(&self) -> Box<dyn Detector> {
        match &self.model {
            Some(plan) => Box::new(OnnxDetector::new(Arc::clone(plan), &self.config)),
            None => Box::new(MotionDetector::new(self.config.motion.clone(), self.config.min_confidence)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onnx_without_model_path() {
        let config = DetectorConfig {
            kind: DetectorKind::Onnx,
            model_path: None,
            ..Default::default()
        };
        assert!(matches!(DetectorFactory::new(config), Err(DetectionError::ModelLoad(_))));
    }

    #[test]
    fn test_onnx_missing_model_file() {
        let config = DetectorConfig {
            kind: DetectorKind::Onnx,
            model_path: Some("/nonexistent/yolov5s.onnx".to_string()),
            ..Default::default()
        };
        assert!(matches!(DetectorFactory::new(config), Err(DetectionError::ModelLoad(_))));
    }

    #[test]
    fn test_motion_factory_creates_independent_detectors() {
        let factory = DetectorFactory::new(DetectorConfig::default()).unwrap();
        let mut a = factory.create();
        let mut b = factory.create();

        let blank = VideoFrame::blank(32, 32, 0);
        let mut moved = VideoFrame::blank(32, 32, 1);
        moved.fill_rect(8, 8, 8, 8, [255, 255, 255]);

        assert!(a.detect(&blank, CameraAngle(0)).unwrap().is_empty());
        assert_eq!(a.detect(&moved, CameraAngle(0)).unwrap().len(), 1);
        // b has never seen a frame, so it has no reference to diff against.
        assert!(b.detect(&moved, CameraAngle(90)).unwrap().is_empty());
    }
}
