//! Motion detection by frame differencing
//!
//! Each frame is compared against the previous one from the same camera.
//! Changed pixels are binned into a coarse grid, active cells are grouped into
//! 8-connected blobs, and every blob large enough yields one centroid.

use std::collections::VecDeque;

use frame_source::{CameraAngle, VideoFrame};
use tracing::debug;

use crate::{Detection, DetectionError, Detector, MotionConfig};

/// Accumulated change inside one grid cell
#[derive(Debug, Clone, Copy, Default)]
struct CellChange {
    changed: u32,
    total: u32,
    sum_x: f64,
    sum_y: f64,
}

/// Frame-differencing blob detector (stateful, one per camera)
pub struct MotionDetector {
    config: MotionConfig,
    min_confidence: f32,
    /// Grayscale of the previous frame with its dimensions
    previous: Option<(u32, u32, Vec<u8>)>,
}

impl MotionDetector {
    pub fn new(config: MotionConfig, min_confidence: f32) -> Self {
        Self {
            config,
            min_confidence,
            previous: None,
        }
    }

    fn diff_cells(&self, prev: &[u8], curr: &[u8], width: u32, height: u32) -> (Vec<CellChange>, usize, usize) {
        let cell = self.config.cell_size.max(1);
        let grid_w = width.div_ceil(cell) as usize;
        let grid_h = height.div_ceil(cell) as usize;
        let mut cells = vec![CellChange::default(); grid_w * grid_h];

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                let c = &mut cells[(y / cell) as usize * grid_w + (x / cell) as usize];
                c.total += 1;
                if prev[idx].abs_diff(curr[idx]) > self.config.diff_threshold {
                    c.changed += 1;
                    c.sum_x += x as f64;
                    c.sum_y += y as f64;
                }
            }
        }

        (cells, grid_w, grid_h)
    }

    fn group_blobs(&self, cells: &[CellChange], grid_w: usize, grid_h: usize) -> Vec<(f64, f64, f32)> {
        let active: Vec<bool> = cells
            .iter()
            .map(|c| c.total > 0 && c.changed as f32 / c.total as f32 >= self.config.min_cell_fill)
            .collect();
        let mut visited = vec![false; cells.len()];
        let mut blobs = Vec::new();

        for start in 0..cells.len() {
            if !active[start] || visited[start] {
                continue;
            }

            // Breadth-first region growing over 8-connected active cells
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            let mut area = 0usize;
            let mut acc = CellChange::default();

            while let Some(idx) = queue.pop_front() {
                area += 1;
                let c = cells[idx];
                acc.changed += c.changed;
                acc.total += c.total;
                acc.sum_x += c.sum_x;
                acc.sum_y += c.sum_y;

                let (cx, cy) = ((idx % grid_w) as i64, (idx / grid_w) as i64);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if nx < 0 || ny < 0 || nx >= grid_w as i64 || ny >= grid_h as i64 {
                            continue;
                        }
                        let n = ny as usize * grid_w + nx as usize;
                        if active[n] && !visited[n] {
                            visited[n] = true;
                            queue.push_back(n);
                        }
                    }
                }
            }

            if area < self.config.min_area_cells || acc.changed == 0 {
                continue;
            }

            let confidence = acc.changed as f32 / acc.total as f32;
            blobs.push((
                acc.sum_x / acc.changed as f64,
                acc.sum_y / acc.changed as f64,
                confidence,
            ));
        }

        blobs
    }
}

impl Detector for MotionDetector {
    fn detect(&mut self, frame: &VideoFrame, angle: CameraAngle) -> Result<Vec<Detection>, DetectionError> {
        let expected = (frame.width * frame.height * 3) as usize;
        if frame.data.len() != expected {
            return Err(DetectionError::InvalidFrame(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }

        let gray = frame.to_grayscale();
        let previous = self.previous.replace((frame.width, frame.height, gray));

        let Some((prev_w, prev_h, prev)) = previous else {
            return Ok(Vec::new());
        };
        if prev_w != frame.width || prev_h != frame.height {
            debug!("Camera {} changed resolution, resetting reference frame", angle);
            return Ok(Vec::new());
        }

        let curr = match &self.previous {
            Some((_, _, g)) => g,
            None => return Ok(Vec::new()),
        };
        let (cells, grid_w, grid_h) = self.diff_cells(&prev, curr, frame.width, frame.height);

        let detections: Vec<Detection> = self
            .group_blobs(&cells, grid_w, grid_h)
            .into_iter()
            .filter(|&(_, _, confidence)| confidence >= self.min_confidence)
            .map(|(x, y, confidence)| Detection::new(x, y, confidence, angle, frame.frame_index))
            .collect();

        debug!(
            "Camera {} frame {}: {} motion blobs",
            angle,
            frame.frame_index,
            detections.len()
        );

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MotionDetector {
        MotionDetector::new(MotionConfig::default(), 0.25)
    }

    fn frame_with_rect(index: usize, x: u32, y: u32) -> VideoFrame {
        let mut frame = VideoFrame::blank(64, 48, index);
        frame.fill_rect(x, y, 8, 8, [255, 255, 255]);
        frame
    }

    #[test]
    fn test_first_frame_has_no_reference() {
        let mut det = detector();
        let out = det.detect(&frame_with_rect(0, 8, 8), CameraAngle(0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_appearing_object_centroid() {
        let mut det = detector();
        det.detect(&VideoFrame::blank(64, 48, 0), CameraAngle(0)).unwrap();

        let out = det.detect(&frame_with_rect(1, 8, 8), CameraAngle(0)).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].x - 11.5).abs() < 1e-9);
        assert!((out[0].y - 11.5).abs() < 1e-9);
        assert_eq!(out[0].frame_index, 1);
        assert_eq!(out[0].angle, CameraAngle(0));
    }

    #[test]
    fn test_separate_objects_separate_blobs() {
        let mut det = detector();
        det.detect(&VideoFrame::blank(64, 48, 0), CameraAngle(0)).unwrap();

        let mut frame = frame_with_rect(1, 4, 4);
        frame.fill_rect(44, 32, 8, 8, [255, 255, 255]);
        let out = det.detect(&frame, CameraAngle(0)).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_static_scene_no_detections() {
        let mut det = detector();
        det.detect(&frame_with_rect(0, 8, 8), CameraAngle(0)).unwrap();
        let out = det.detect(&frame_with_rect(1, 8, 8), CameraAngle(0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_small_noise_filtered() {
        let mut det = detector();
        det.detect(&VideoFrame::blank(64, 48, 0), CameraAngle(0)).unwrap();

        let mut frame = VideoFrame::blank(64, 48, 1);
        frame.fill_rect(30, 30, 1, 1, [255, 255, 255]);
        assert!(det.detect(&frame, CameraAngle(0)).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let mut det = detector();
        let frame = VideoFrame::new(vec![0; 10], 64, 48, 0);
        assert!(matches!(
            det.detect(&frame, CameraAngle(0)),
            Err(DetectionError::InvalidFrame(_))
        ));
    }
}
