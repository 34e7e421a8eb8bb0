//! Trajectory lookup

use serde::Serialize;
use thiserror::Error;

use crate::{Track, TrackStatus};

/// Position series of one track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub id: u64,
    pub status: TrackStatus,
    pub frames: Vec<usize>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl Trajectory {
    fn from_track(track: &Track) -> Self {
        Self {
            id: track.id(),
            status: track.status(),
            frames: track.positions().iter().map(|p| p.frame_index).collect(),
            xs: track.xs(),
            ys: track.ys(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrajectoryLookupError {
    #[error("No track with id {0}")]
    NotFound(u64),

    #[error("Track index {index} out of range (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Read access to track position series
pub trait TrajectoryQuery {
    /// Tracks in creation order
    fn ordered_tracks(&self) -> Vec<&Track>;

    /// Series of the track with `id`
    fn trajectory(&self, id: u64) -> Result<Trajectory, TrajectoryLookupError> {
        self.ordered_tracks()
            .into_iter()
            .find(|t| t.id() == id)
            .map(Trajectory::from_track)
            .ok_or(TrajectoryLookupError::NotFound(id))
    }

    /// Series of the `index`-th track in creation order
    fn trajectory_at(&self, index: usize) -> Result<Trajectory, TrajectoryLookupError> {
        let tracks = self.ordered_tracks();
        tracks
            .get(index)
            .map(|t| Trajectory::from_track(t))
            .ok_or(TrajectoryLookupError::OutOfRange {
                index,
                len: tracks.len(),
            })
    }
}

/// Finalized tracks at the end of a run, ordered by id
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub(crate) fn new(mut tracks: Vec<Track>) -> Self {
        tracks.sort_by_key(|t| t.id());
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn as_slice(&self) -> &[Track] {
        &self.tracks
    }
}

impl TrajectoryQuery for TrackSet {
    fn ordered_tracks(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }
}
