//! Multi-object tracking engine.
//!
//! Turns a stream of unordered, noisy per-frame detections into stable
//! identities with a confirm/delete lifecycle:
//! - **Kalman prediction**: constant-velocity motion estimate per track
//! - **Optimal association**: IoU cost matrix solved with LAPJV
//! - **Lifecycle**: Tentative -> Confirmed after `n_init` consecutive
//!   matches, Deleted after `max_age` frames without a match
//! - **Counting**: distinct confirmed tracks per class, never raw
//!   detections
//!
//! # Usage
//! ```rust
//! use vigil_models::{BBox, RawDetection};
//! use vigil_track::{ClassCounts, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default());
//! let mut counts = ClassCounts::default();
//!
//! let dets = vec![RawDetection::new(BBox::new(10.0, 10.0, 40.0, 80.0), "person", 0.9)];
//! for frame in 0..5 {
//!     let confirmed = tracker.update(&dets, frame);
//!     counts.observe(confirmed.iter().copied());
//! }
//! assert_eq!(counts.person_count(), 1);
//! ```

pub mod counts;
pub mod kalman;
pub mod matching;
pub mod tracker;

pub use counts::ClassCounts;
pub use kalman::KalmanBox;
pub use matching::{min_cost_assignment, AssignmentResult, INFEASIBLE_COST};
pub use tracker::{Track, TrackState, Tracker, TrackerConfig};
