//! Stride-stepped batch synchronization
//!
//! Advances every camera by the same stride and stops after
//! `floor(min_frame_count / step)` batches. Inputs are assumed to be
//! frame-aligned already; no timestamp alignment happens here.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{CameraAngle, CaptureError, FrameSource, VideoFrame};

/// One camera's contribution to a batch
#[derive(Debug)]
pub struct CameraFrame {
    /// Viewing angle of the camera
    pub angle: CameraAngle,
    /// Decoded frame, `None` if the camera is exhausted or failed to decode
    pub frame: Option<VideoFrame>,
    /// Decode failure for this camera, if any
    pub error: Option<CaptureError>,
}

/// Frames of all cameras at one step
#[derive(Debug)]
pub struct FrameBatch {
    /// Zero-based step number
    pub step_index: usize,
    /// Frame offset shared by every camera at this step
    pub frame_index: usize,
    /// One entry per camera, in source order
    pub frames: Vec<CameraFrame>,
}

impl FrameBatch {
    /// Number of cameras whose frame could not be read
    pub fn failed_count(&self) -> usize {
        self.frames.iter().filter(|f| f.error.is_some()).count()
    }
}

struct SyncedCamera {
    angle: CameraAngle,
    source: Box<dyn FrameSource>,
}

/// Presents N frame sources as one batch source
pub struct BatchSynchronizer {
    cameras: Vec<SyncedCamera>,
    /// Frames advanced per batch
    step: usize,
    /// Batches available in total
    total_steps: usize,
    /// Batches handed out so far
    steps_taken: usize,
}

impl BatchSynchronizer {
    /// Create a synchronizer over `(angle, source)` pairs
    pub fn new(
        sources: Vec<(CameraAngle, Box<dyn FrameSource>)>,
        step: usize,
    ) -> Result<Self, CaptureError> {
        if step == 0 {
            return Err(CaptureError::InvalidStep);
        }
        if sources.is_empty() {
            return Err(CaptureError::NoSources);
        }

        let min_frame_count = sources
            .iter()
            .map(|(_, s)| s.frame_count())
            .min()
            .unwrap_or(0);
        let total_steps = min_frame_count / step;

        info!(
            "Synchronizing {} cameras: min_frames={}, step={}, steps={}",
            sources.len(),
            min_frame_count,
            step,
            total_steps
        );

        Ok(Self {
            cameras: sources
                .into_iter()
                .map(|(angle, source)| SyncedCamera { angle, source })
                .collect(),
            step,
            total_steps,
            steps_taken: 0,
        })
    }

    /// Number of batches this synchronizer will produce
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Number of batches produced so far
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Frame stride
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of cameras
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Frame count of the shortest source
    pub fn min_frame_count(&self) -> usize {
        self.cameras
            .iter()
            .map(|c| c.source.frame_count())
            .min()
            .unwrap_or(0)
    }

    /// Read the frame at the current offset on every camera, then advance all
    /// offsets by `step`. Returns `None` once all batches are consumed.
    pub fn next_batch(&mut self) -> Option<FrameBatch> {
        if self.steps_taken >= self.total_steps {
            return None;
        }

        let step_index = self.steps_taken;
        let offset = step_index * self.step;
        let step = self.step;

        // Camera reads are independent; collect() is the barrier for the batch.
        let frames: Vec<CameraFrame> = self
            .cameras
            .par_iter_mut()
            .map(|camera| read_camera(camera, offset, step))
            .collect();

        self.steps_taken += 1;
        debug!("Batch {} at frame {} ready", step_index, offset);

        Some(FrameBatch {
            step_index,
            frame_index: offset,
            frames,
        })
    }
}

fn read_camera(camera: &mut SyncedCamera, offset: usize, step: usize) -> CameraFrame {
    let source = camera.source.as_mut();
    let position = source.position();
    if position < offset {
        source.skip(offset - position);
    }

    let (frame, error) = match source.next_frame() {
        Ok(frame) => (frame, None),
        Err(e) => {
            warn!("Camera {} failed at frame {}: {}", camera.angle, offset, e);
            (None, Some(e))
        }
    };

    // Land on the next batch offset regardless of how the read went.
    let target = offset + step;
    let position = source.position();
    if position < target {
        source.skip(target - position);
    }

    CameraFrame {
        angle: camera.angle,
        frame,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use proptest::prelude::*;

    fn sources(counts: &[usize]) -> Vec<(CameraAngle, Box<dyn FrameSource>)> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                (
                    CameraAngle((i * 90) as u16),
                    Box::new(MemorySource::blank(n, 2, 2)) as Box<dyn FrameSource>,
                )
            })
            .collect()
    }

    /// Source that fails to decode one specific frame
    struct FlakySource {
        inner: MemorySource,
        bad_index: usize,
    }

    impl FrameSource for FlakySource {
        fn frame_count(&self) -> usize {
            self.inner.frame_count()
        }

        fn position(&self) -> usize {
            self.inner.position()
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
            let index = self.inner.position();
            let frame = self.inner.next_frame()?;
            if index == self.bad_index {
                return Err(CaptureError::Decode {
                    index,
                    reason: "corrupt".to_string(),
                });
            }
            Ok(frame)
        }

        fn skip(&mut self, n: usize) -> usize {
            self.inner.skip(n)
        }
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(matches!(
            BatchSynchronizer::new(sources(&[5]), 0),
            Err(CaptureError::InvalidStep)
        ));
    }

    #[test]
    fn test_no_sources_rejected() {
        assert!(matches!(
            BatchSynchronizer::new(Vec::new(), 1),
            Err(CaptureError::NoSources)
        ));
    }

    #[test]
    fn test_bounded_by_shortest_source() {
        let mut sync = BatchSynchronizer::new(sources(&[10, 7, 12, 9]), 2).unwrap();
        assert_eq!(sync.total_steps(), 3);

        let mut offsets = Vec::new();
        while let Some(batch) = sync.next_batch() {
            assert_eq!(batch.frames.len(), 4);
            for cam in &batch.frames {
                let frame = cam.frame.as_ref().unwrap();
                assert_eq!(frame.frame_index, batch.frame_index);
            }
            offsets.push(batch.frame_index);
        }

        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(sync.steps_taken(), 3);
    }

    #[test]
    fn test_decode_failure_isolated_to_camera() {
        let flaky = FlakySource {
            inner: MemorySource::blank(4, 2, 2),
            bad_index: 1,
        };
        let mut all = sources(&[4]);
        all.push((CameraAngle(90), Box::new(flaky)));

        let mut sync = BatchSynchronizer::new(all, 1).unwrap();
        let _ = sync.next_batch().unwrap();
        let second = sync.next_batch().unwrap();

        assert_eq!(second.failed_count(), 1);
        assert!(second.frames[0].frame.is_some());
        assert!(second.frames[1].frame.is_none());

        let third = sync.next_batch().unwrap();
        assert_eq!(third.frames[1].frame.as_ref().unwrap().frame_index, 2);
    }

    proptest! {
        #[test]
        fn prop_iterations_match_floor(
            counts in proptest::collection::vec(1usize..40, 1..5),
            step in 1usize..6,
        ) {
            let min = *counts.iter().min().unwrap();
            let mut sync = BatchSynchronizer::new(sources(&counts), step).unwrap();

            let mut iterations = 0;
            while let Some(batch) = sync.next_batch() {
                for cam in &batch.frames {
                    prop_assert!(cam.frame.is_some());
                }
                prop_assert!(batch.frame_index < min);
                iterations += 1;
            }
            prop_assert_eq!(iterations, min / step);
        }
    }
}
