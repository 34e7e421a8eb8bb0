//! Detector configuration

use serde::{Deserialize, Serialize};

/// Which detector implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Frame-differencing blob detector
    Motion,
    /// YOLO-style ONNX model
    Onnx,
}

/// Motion detector tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Per-pixel grayscale difference that counts as change
    pub diff_threshold: u8,

    /// Side length of the grouping grid cell (pixels)
    pub cell_size: u32,

    /// Fraction of changed pixels for a cell to count as active
    pub min_cell_fill: f32,

    /// Minimum number of active cells in a blob
    pub min_area_cells: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            diff_threshold: 25,
            cell_size: 4,
            min_cell_fill: 0.25,
            min_area_cells: 2,
        }
    }
}

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Implementation to use
    pub kind: DetectorKind,

    /// Detection confidence threshold
    pub min_confidence: f32,

    /// ONNX model path (required for `onnx`)
    pub model_path: Option<String>,

    /// Square model input size (pixels)
    pub input_size: u32,

    /// IoU above which overlapping boxes are suppressed
    pub iou_threshold: f32,

    /// Model class indices treated as vehicles (COCO car, motorcycle, bus, truck)
    pub vehicle_classes: Vec<usize>,

    /// Motion detector tuning
    pub motion: MotionConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Motion,
            min_confidence: 0.25,
            model_path: None,
            input_size: 640,
            iou_threshold: 0.45,
            vehicle_classes: vec![2, 3, 5, 7],
            motion: MotionConfig::default(),
        }
    }
}
