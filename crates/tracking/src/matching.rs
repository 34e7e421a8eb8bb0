//! Greedy nearest-distance correspondence

use vehicle_detector::Detection;

/// Predicted position of an active track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub track_id: u64,
    pub x: f64,
    pub y: f64,
}

/// Outcome of one matching round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    /// `(track_id, detection_index)` pairs
    pub matches: Vec<(u64, usize)>,
    /// Tracks with no detection
    pub unmatched_tracks: Vec<u64>,
    /// Indices of detections with no track
    pub unmatched_detections: Vec<usize>,
}

/// Assign detections to predictions one-to-one.
///
/// Pairs farther apart than `max_distance` are never matched. Valid pairs are
/// taken in ascending distance; ties go to the lower track id, then the lower
/// detection index.
pub fn greedy_assign(predictions: &[Prediction], detections: &[Detection], max_distance: f64) -> Assignment {
    let mut candidates: Vec<(f64, u64, usize)> = Vec::new();
    for p in predictions {
        for (j, d) in detections.iter().enumerate() {
            let dist = d.distance_to(p.x, p.y);
            if dist.is_finite() && dist <= max_distance {
                candidates.push((dist, p.track_id, j));
            }
        }
    }

    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut track_taken: Vec<u64> = Vec::new();
    let mut detection_taken = vec![false; detections.len()];
    let mut matches = Vec::new();

    for (_, track_id, j) in candidates {
        if detection_taken[j] || track_taken.contains(&track_id) {
            continue;
        }
        detection_taken[j] = true;
        track_taken.push(track_id);
        matches.push((track_id, j));
    }

    let unmatched_tracks = predictions
        .iter()
        .map(|p| p.track_id)
        .filter(|id| !track_taken.contains(id))
        .collect();
    let unmatched_detections = detection_taken
        .iter()
        .enumerate()
        .filter_map(|(j, &taken)| (!taken).then_some(j))
        .collect();

    Assignment {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
