//! Shared data models for the Vigil tracking engine.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes and raw detections
//! - Video jobs and their lifecycle
//! - Tracking results (per-video/session snapshots)
//! - Event payloads published on the event channel

pub mod bbox;
pub mod detection;
pub mod event;
pub mod job;
pub mod result;

// Re-export common types
pub use bbox::BBox;
pub use detection::RawDetection;
pub use event::{Event, EventTarget, ProcessingPhase, SessionStatus};
pub use job::{JobId, JobStatus, VideoJob};
pub use result::{DetectionRecord, TrackSummary, TrackingResult};
