//! Tracking controller
//!
//! Single writer of track state. Each call to [`TrackingController::receiver`]
//! consumes one step's detections from all cameras:
//! 1. predict every active track's position at the step's frame
//! 2. greedily match predictions to detections within `max_match_distance`
//! 3. extend matched tracks, age unmatched ones, open tracks for leftovers

use std::collections::BTreeMap;

use tracing::{debug, info};
use vehicle_detector::Detection;

use crate::matching::{greedy_assign, Prediction};
use crate::query::{TrackSet, TrajectoryQuery};
use crate::{MotionModel, Position, Track, TrackingConfig, TrackingError};

/// Detections of every camera for one step
#[derive(Debug, Clone, Default)]
pub struct StepDetections {
    /// Frame offset shared by all cameras at this step
    pub frame_index: usize,
    /// Pooled detections; camera of origin is not used for identity
    pub detections: Vec<Detection>,
}

impl StepDetections {
    pub fn new(frame_index: usize, detections: Vec<Detection>) -> Self {
        Self {
            frame_index,
            detections,
        }
    }
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    /// Steps consumed
    pub steps: usize,
    /// Detections received
    pub detections_received: usize,
    /// Detections dropped for invalid coordinates or frame index
    pub detections_dropped: usize,
    /// Detections that extended an existing track
    pub matches: usize,
    /// Tracks opened
    pub tracks_created: usize,
    /// Tracks that transitioned to lost
    pub tracks_lost: usize,
}

/// Maintains live tracks across steps
pub struct TrackingController {
    config: TrackingConfig,
    /// All tracks ever created, keyed by id
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
    last_frame: Option<usize>,
    stats: TrackingStats,
}

impl TrackingController {
    /// Create a controller after validating its configuration
    pub fn new(config: TrackingConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        info!(
            "Creating tracking controller: D={}px, K={}, motion={:?}",
            config.max_match_distance, config.max_missed_steps, config.motion_model
        );
        Ok(Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 0,
            last_frame: None,
            stats: TrackingStats::default(),
        })
    }

    /// Consume one step of detections.
    ///
    /// Rejects a step whose frame index does not advance past the previous
    /// step, leaving all state untouched.
    pub fn receiver(&mut self, step: &StepDetections) -> Result<(), TrackingError> {
        if let Some(last) = self.last_frame {
            if step.frame_index <= last {
                return Err(TrackingError::OutOfOrder {
                    last,
                    received: step.frame_index,
                });
            }
        }
        self.last_frame = Some(step.frame_index);
        self.stats.steps += 1;
        self.stats.detections_received += step.detections.len();

        let detections: Vec<Detection> = step
            .detections
            .iter()
            .filter(|d| self.accepts(d, step.frame_index))
            .copied()
            .collect();
        let dropped = step.detections.len() - detections.len();
        if dropped > 0 {
            debug!("Frame {}: dropped {} invalid detections", step.frame_index, dropped);
            self.stats.detections_dropped += dropped;
        }

        let predictions: Vec<Prediction> = self
            .tracks
            .values()
            .filter(|t| t.is_active())
            .filter_map(|t| self.predict(t, step.frame_index))
            .collect();

        if predictions.is_empty() && !detections.is_empty() {
            debug!("Frame {}: no active tracks to match", step.frame_index);
        }

        let assignment = greedy_assign(&predictions, &detections, self.config.max_match_distance);

        for &(track_id, j) in &assignment.matches {
            let d = &detections[j];
            if let Some(track) = self.tracks.get_mut(&track_id) {
                if track.append(Position {
                    x: d.x,
                    y: d.y,
                    frame_index: step.frame_index,
                }) {
                    self.stats.matches += 1;
                }
            }
        }

        for track_id in &assignment.unmatched_tracks {
            if let Some(track) = self.tracks.get_mut(track_id) {
                if track.miss(self.config.max_missed_steps) {
                    info!(
                        "Track {} lost at frame {} after {} missed steps ({} positions)",
                        track_id,
                        step.frame_index,
                        track.missed_count(),
                        track.len()
                    );
                    self.stats.tracks_lost += 1;
                }
            }
        }

        for &j in &assignment.unmatched_detections {
            let d = &detections[j];
            let id = self.next_id;
            self.next_id += 1;
            self.tracks.insert(
                id,
                Track::new(
                    id,
                    Position {
                        x: d.x,
                        y: d.y,
                        frame_index: step.frame_index,
                    },
                ),
            );
            self.stats.tracks_created += 1;
            debug!(
                "Track {} created at ({:.1}, {:.1}) frame {} from camera {}",
                id, d.x, d.y, step.frame_index, d.angle
            );
        }

        debug!(
            "Frame {}: {} matched, {} missed, {} new, {} active",
            step.frame_index,
            assignment.matches.len(),
            assignment.unmatched_tracks.len(),
            assignment.unmatched_detections.len(),
            self.active_count()
        );

        Ok(())
    }

    fn accepts(&self, d: &Detection, frame_index: usize) -> bool {
        d.is_finite() && self.config.in_bounds(d.x, d.y) && d.frame_index == frame_index
    }

    fn predict(&self, track: &Track, frame_index: usize) -> Option<Prediction> {
        let positions = track.positions();
        let last = positions.last()?;
        let (mut x, mut y) = (last.x, last.y);

        if self.config.motion_model == MotionModel::ConstantVelocity && positions.len() >= 2 {
            let prev = &positions[positions.len() - 2];
            let span = (last.frame_index - prev.frame_index) as f64;
            let ahead = frame_index.saturating_sub(last.frame_index) as f64;
            if span > 0.0 {
                x += (last.x - prev.x) / span * ahead;
                y += (last.y - prev.y) / span * ahead;
            }
        }

        Some(Prediction {
            track_id: track.id(),
            x,
            y,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> TrackingStats {
        self.stats
    }

    /// All tracks in creation order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn track(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn active_count(&self) -> usize {
        self.tracks.values().filter(|t| t.is_active()).count()
    }

    pub fn lost_count(&self) -> usize {
        self.tracks.len() - self.active_count()
    }

    /// End the stream and hand over every track, lost ones included
    pub fn finalize(self) -> TrackSet {
        info!(
            "Finalizing {} tracks ({} active, {} lost) after {} steps",
            self.tracks.len(),
            self.active_count(),
            self.lost_count(),
            self.stats.steps
        );
        TrackSet::new(self.tracks.into_values().collect())
    }
}

impl TrajectoryQuery for TrackingController {
    fn ordered_tracks(&self) -> Vec<&Track> {
        self.tracks.values().collect()
    }
}
