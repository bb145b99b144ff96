//! Track lifecycle and per-frame association.

use std::collections::BTreeMap;

use ndarray::Array2;
use tracing::{debug, trace};

use vigil_models::{BBox, RawDetection, TrackSummary};

use crate::kalman::{KalmanBox, KalmanParams};
use crate::matching::{min_cost_assignment, INFEASIBLE_COST};

/// Tracker behavior configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Consecutive matched frames before a track is confirmed
    pub n_init: u32,
    /// Frames without a match before a confirmed track is deleted
    pub max_age: u32,
    /// Maximum association cost (1 - IoU); pairs above this never match
    pub max_cost: f32,
    /// Kalman filter noise parameters
    pub kalman: KalmanParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            n_init: 3,
            max_age: 30,
            max_cost: 0.7,
            kalman: KalmanParams::default(),
        }
    }
}

/// Track lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Created, not yet trusted
    Tentative,
    /// Matched `n_init` consecutive frames
    Confirmed,
    /// Terminal; removed from the active set
    Deleted,
}

/// A persistent identity assigned to one physical object across frames.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub id: u64,
    /// Semantic class label; tracks never change class
    pub class_label: String,
    /// Lifecycle state
    pub state: TrackState,
    /// Predicted box for the current frame (matching input)
    pub predicted_bbox: BBox,
    /// Number of matched frames
    pub hits: u32,
    /// Frames since the last matched detection
    pub time_since_update: u32,
    /// Confidence of the last absorbed detection
    pub confidence: f32,
    /// First frame the track was observed in
    pub first_frame: u64,
    /// Last frame the track absorbed a detection in
    pub last_frame: u64,
    /// Matched (frame_index, bbox) observations in frame order
    pub history: Vec<(u64, BBox)>,
    kalman: KalmanBox,
    ever_confirmed: bool,
}

impl Track {
    fn new(id: u64, detection: &RawDetection, frame_index: u64) -> Self {
        let kalman = KalmanBox::new(&detection.bbox);
        Self {
            id,
            class_label: detection.class_label.clone(),
            state: TrackState::Tentative,
            predicted_bbox: detection.bbox,
            hits: 1,
            time_since_update: 0,
            confidence: detection.confidence,
            first_frame: frame_index,
            last_frame: frame_index,
            history: vec![(frame_index, detection.bbox)],
            kalman,
            ever_confirmed: false,
        }
    }

    /// Current smoothed box estimate.
    pub fn bbox(&self) -> BBox {
        self.kalman.bbox()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Whether the track ever reached the confirmed state.
    pub fn ever_confirmed(&self) -> bool {
        self.ever_confirmed
    }

    /// Lifetime summary for the tracking result.
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            class_label: self.class_label.clone(),
            first_frame: self.first_frame,
            last_frame: self.last_frame,
            hits: self.hits,
            confirmed: self.ever_confirmed,
        }
    }
}

/// Multi-object tracker.
///
/// One instance per video/session; `update` is called once per processed
/// frame with that frame's detections.
pub struct Tracker {
    config: TrackerConfig,
    /// Active tracks in creation order (ascending id)
    tracks: Vec<Track>,
    /// Deleted tracks, kept for the final result
    archive: Vec<Track>,
    next_id: u64,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            archive: Vec::new(),
            next_id: 0,
        }
    }

    /// Advance the tracker one frame and return all confirmed tracks.
    ///
    /// Detections with malformed boxes are discarded before matching.
    pub fn update(&mut self, detections: &[RawDetection], frame_index: u64) -> Vec<&Track> {
        let detections: Vec<&RawDetection> = detections
            .iter()
            .filter(|d| {
                if !d.is_well_formed() {
                    debug!(
                        frame = frame_index,
                        class = %d.class_label,
                        "discarding malformed detection box"
                    );
                    return false;
                }
                true
            })
            .collect();

        // Predict all tracks forward one step
        for track in &mut self.tracks {
            track.predicted_bbox = track.kalman.predict(&self.config.kalman);
            track.time_since_update += 1;
        }

        // Cost matrix: 1 - IoU, with cross-class and low-overlap pairs gated out
        let mut cost = Array2::<f32>::zeros((self.tracks.len(), detections.len()));
        for (i, track) in self.tracks.iter().enumerate() {
            for (j, det) in detections.iter().enumerate() {
                cost[[i, j]] = if track.class_label != det.class_label {
                    INFEASIBLE_COST
                } else {
                    let c = 1.0 - track.predicted_bbox.iou(&det.bbox);
                    if c > self.config.max_cost {
                        INFEASIBLE_COST
                    } else {
                        c
                    }
                };
            }
        }

        let assignment = min_cost_assignment(&cost, self.config.max_cost);
        trace!(
            frame = frame_index,
            matches = assignment.matches.len(),
            unmatched_tracks = assignment.unmatched_tracks.len(),
            unmatched_detections = assignment.unmatched_detections.len(),
            "association"
        );

        // Update matched tracks
        for &(track_idx, det_idx) in &assignment.matches {
            let track = &mut self.tracks[track_idx];
            let det = detections[det_idx];

            track.kalman.update(&det.bbox, &self.config.kalman);
            track.hits += 1;
            track.time_since_update = 0;
            track.confidence = det.confidence;
            track.last_frame = frame_index;
            track.history.push((frame_index, track.kalman.bbox()));

            if track.state == TrackState::Tentative && track.hits >= self.config.n_init {
                track.state = TrackState::Confirmed;
                track.ever_confirmed = true;
                debug!(track_id = track.id, class = %track.class_label, frame = frame_index, "track confirmed");
            }
        }

        // Age out unmatched tracks. A tentative track loses its identity on
        // the first miss (confirmation requires consecutive matches); a
        // confirmed track survives up to max_age frames without a match.
        let max_age = self.config.max_age;
        let mut removed = Vec::new();
        self.tracks.retain_mut(|track| {
            let dead = match track.state {
                TrackState::Tentative => track.time_since_update > 0,
                TrackState::Confirmed => track.time_since_update > max_age,
                TrackState::Deleted => true,
            };
            if dead {
                track.state = TrackState::Deleted;
                removed.push(track.clone());
            }
            !dead
        });
        for track in removed {
            debug!(track_id = track.id, class = %track.class_label, "track deleted");
            self.archive.push(track);
        }

        // Spawn tentative tracks for unmatched detections
        for det_idx in assignment.unmatched_detections {
            let det = detections[det_idx];
            let track = Track::new(self.next_id, det, frame_index);
            self.next_id += 1;
            self.tracks.push(track);
        }

        self.confirmed().collect()
    }

    /// Currently confirmed tracks.
    pub fn confirmed(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_confirmed())
    }

    /// Number of tracks in the active set.
    pub fn active_count(&self) -> usize {
        self.tracks.len()
    }

    /// Lifetime summaries of every track ever created, keyed by id.
    pub fn summaries(&self) -> BTreeMap<u64, TrackSummary> {
        self.archive
            .iter()
            .chain(self.tracks.iter())
            .map(|t| (t.id, t.summary()))
            .collect()
    }
}
