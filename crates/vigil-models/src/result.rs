//! Tracking result snapshots handed to the persistence collaborator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// One raw detection as recorded for a specific frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Frame index the detection was observed in
    pub frame: u64,
    /// Bounding box in pixel coordinates
    pub bbox: BBox,
    /// Semantic class label
    pub class_label: String,
    /// Detection confidence
    pub confidence: f32,
}

/// Summary of one track over its whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Semantic class label
    pub class_label: String,
    /// First frame the track was observed in
    pub first_frame: u64,
    /// Last frame the track absorbed a detection in
    pub last_frame: u64,
    /// Number of matched frames
    pub hits: u32,
    /// Whether the track ever reached the confirmed state
    pub confirmed: bool,
}

/// Immutable snapshot of one video/session run.
///
/// Built incrementally by the orchestrator or session manager and handed to
/// the persistence collaborator at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResult {
    /// All tracks ever created, keyed by track id
    pub tracks: BTreeMap<u64, TrackSummary>,
    /// Distinct confirmed "person" tracks
    pub person_count: u32,
    /// Distinct confirmed "animal" tracks
    pub animal_count: u32,
    /// Raw per-frame detections, in frame order
    pub per_frame_detections: Vec<DetectionRecord>,
    /// Total frames processed
    pub total_frames: u64,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl TrackingResult {
    /// Distinct confirmed tracks across all classes.
    pub fn total_objects(&self) -> usize {
        self.tracks.values().filter(|t| t.confirmed).count()
    }
}
