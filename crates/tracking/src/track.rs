//! Tracks and their position history

use serde::{Deserialize, Serialize};

/// Centroid of a vehicle in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub frame_index: usize,
}

/// Track lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Eligible for matching
    Active,
    /// Missed too many consecutive steps; history kept, never matched again
    Lost,
}

/// Persistent identity of one vehicle across frames
///
/// History is append-only and strictly ordered by frame index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    id: u64,
    positions: Vec<Position>,
    status: TrackStatus,
    missed_count: u32,
}

impl Track {
    /// Create an active track seeded with its first position
    pub(crate) fn new(id: u64, first: Position) -> Self {
        Self {
            id,
            positions: vec![first],
            status: TrackStatus::Active,
            missed_count: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn missed_count(&self) -> u32 {
        self.missed_count
    }

    pub fn is_active(&self) -> bool {
        self.status == TrackStatus::Active
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn last_position(&self) -> Option<&Position> {
        self.positions.last()
    }

    /// X coordinates in frame order
    pub fn xs(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.x).collect()
    }

    /// Y coordinates in frame order
    pub fn ys(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.y).collect()
    }

    /// Append a matched position and clear the miss counter.
    ///
    /// Returns `false` without modifying the track if the position is not
    /// strictly after the last one.
    pub(crate) fn append(&mut self, position: Position) -> bool {
        if let Some(last) = self.positions.last() {
            if position.frame_index <= last.frame_index {
                return false;
            }
        }
        self.positions.push(position);
        self.missed_count = 0;
        true
    }

    /// Record a step without a match; returns `true` if this miss lost the track
    pub(crate) fn miss(&mut self, max_missed_steps: u32) -> bool {
        if self.status == TrackStatus::Lost {
            return false;
        }
        self.missed_count += 1;
        if self.missed_count >= max_missed_steps {
            self.status = TrackStatus::Lost;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64, frame_index: usize) -> Position {
        Position { x, y: 0.0, frame_index }
    }

    #[test]
    fn test_append_requires_increasing_frames() {
        let mut track = Track::new(0, pos(0.0, 3));
        assert!(!track.append(pos(1.0, 3)));
        assert!(!track.append(pos(1.0, 2)));
        assert!(track.append(pos(1.0, 4)));
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_miss_then_lost() {
        let mut track = Track::new(0, pos(0.0, 0));
        assert!(!track.miss(2));
        assert_eq!(track.status(), TrackStatus::Active);
        assert!(track.miss(2));
        assert_eq!(track.status(), TrackStatus::Lost);
        // Further misses are ignored once lost
        assert!(!track.miss(2));
        assert_eq!(track.missed_count(), 2);
    }

    #[test]
    fn test_append_resets_misses() {
        let mut track = Track::new(0, pos(0.0, 0));
        track.miss(5);
        track.miss(5);
        assert!(track.append(pos(2.0, 3)));
        assert_eq!(track.missed_count(), 0);
    }
}
