//! ONNX object detection (YOLOv5-style output)
//!
//! The model takes a `1x3xSxS` RGB tensor in `[0, 1]` and produces
//! `1xNx(5+C)` rows of `cx, cy, w, h, objectness, class scores...` in input
//! pixel coordinates.

use std::sync::Arc;

use frame_source::{CameraAngle, VideoFrame};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::{Detection, DetectionError, Detector, DetectorConfig};

/// Optimized, runnable tract plan
pub type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Load and optimize an ONNX model for a fixed square input
pub fn load_plan(path: &str, input_size: u32) -> Result<Arc<OnnxPlan>, DetectionError> {
    info!("Loading detection model from {}", path);
    let size = input_size as usize;

    let plan = tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| DetectionError::ModelLoad(e.to_string()))?;

    Ok(Arc::new(plan))
}

/// Candidate box in frame pixels
#[derive(Debug, Clone, Copy)]
struct BoxCandidate {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    score: f32,
}

impl BoxCandidate {
    fn iou(&self, other: &BoxCandidate) -> f32 {
        let (ax1, ay1, ax2, ay2) = self.corners();
        let (bx1, by1, bx2, by2) = other.corners();

        let iw = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let ih = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let inter = iw * ih;
        let union = self.w * self.h + other.w * other.h - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.w / 2.0,
            self.cy - self.h / 2.0,
            self.cx + self.w / 2.0,
            self.cy + self.h / 2.0,
        )
    }
}

/// Model-backed detector; the plan is shared between cameras
pub struct OnnxDetector {
    plan: Arc<OnnxPlan>,
    input_size: u32,
    min_confidence: f32,
    iou_threshold: f32,
    vehicle_classes: Vec<usize>,
}

impl OnnxDetector {
    pub fn new(plan: Arc<OnnxPlan>, config: &DetectorConfig) -> Self {
        Self {
            plan,
            input_size: config.input_size,
            min_confidence: config.min_confidence,
            iou_threshold: config.iou_threshold,
            vehicle_classes: config.vehicle_classes.clone(),
        }
    }

    fn preprocess(&self, frame: &VideoFrame) -> Tensor {
        let size = self.input_size as usize;
        let resized = frame.resize(self.input_size, self.input_size);
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            resized.data[(y * size + x) * 3 + c] as f32 / 255.0
        });
        input.into()
    }
}

impl Detector for OnnxDetector {
    fn detect(&mut self, frame: &VideoFrame, angle: CameraAngle) -> Result<Vec<Detection>, DetectionError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DetectionError::InvalidFrame("empty frame".to_string()));
        }

        let input = self.preprocess(frame);
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let shape = view.shape().to_vec();
        let cols = *shape.last().ok_or_else(|| DetectionError::Inference("scalar output".to_string()))?;
        let flat: Vec<f32> = view.iter().copied().collect();

        let scale_x = frame.width as f32 / self.input_size as f32;
        let scale_y = frame.height as f32 / self.input_size as f32;
        let kept = decode_predictions(
            &flat,
            cols,
            &self.vehicle_classes,
            self.min_confidence,
            self.iou_threshold,
        )?;

        debug!(
            "Camera {} frame {}: {} vehicles (output shape {:?})",
            angle,
            frame.frame_index,
            kept.len(),
            shape
        );

        Ok(kept
            .into_iter()
            .map(|b| {
                Detection::new(
                    (b.cx * scale_x) as f64,
                    (b.cy * scale_y) as f64,
                    b.score,
                    angle,
                    frame.frame_index,
                )
            })
            .collect())
    }
}

/// Decode flat prediction rows, keep vehicle classes above threshold, and
/// apply greedy non-maximum suppression
fn decode_predictions(
    flat: &[f32],
    cols: usize,
    vehicle_classes: &[usize],
    min_confidence: f32,
    iou_threshold: f32,
) -> Result<Vec<BoxCandidate>, DetectionError> {
    if cols < 6 || flat.len() % cols != 0 {
        return Err(DetectionError::Inference(format!(
            "unexpected prediction layout: {} values, {} columns",
            flat.len(),
            cols
        )));
    }

    let mut candidates: Vec<BoxCandidate> = flat
        .chunks(cols)
        .filter_map(|row| {
            let objectness = row[4];
            let class_score = vehicle_classes
                .iter()
                .filter_map(|&c| row.get(5 + c).copied())
                .fold(0.0f32, f32::max);
            let score = objectness * class_score;
            (score >= min_confidence && score.is_finite()).then_some(BoxCandidate {
                cx: row[0],
                cy: row[1],
                w: row[2],
                h: row[3],
                score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<BoxCandidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) < iou_threshold) {
            kept.push(candidate);
        }
    }

    Ok(kept)
}
