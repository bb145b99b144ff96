//! Event payloads published on the event channel.
//!
//! The serialized shape (snake_case `type` tag) is the wire contract for
//! whatever transport relays these to clients.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Processing phase reported by `processing_status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPhase {
    /// Job picked up, before the first frame
    Started,
    /// Frames are being processed
    Processing,
    /// Non-fatal degradation attached to an otherwise successful run
    Warning,
    /// Job failed
    Error,
}

/// Live session status reported by `camera_status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Device open in progress
    Connecting,
    /// Device opened, frames flowing
    Connected,
    /// Session ended cooperatively
    Stopped,
    /// Device could not be opened
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job progress/status update
    ProcessingStatus {
        job_id: JobId,
        phase: ProcessingPhase,
        /// Progress in percent, 0..=100
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Job finished successfully
    ProcessingComplete {
        job_id: JobId,
        person_count: u32,
        animal_count: u32,
        /// Location of the annotated output
        output: String,
    },

    /// Live session status change
    CameraStatus {
        session_key: String,
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// One relayed live frame (base64 JPEG)
    CameraFrame {
        session_key: String,
        image: String,
    },

    /// Fatal stream error
    CameraError {
        session_key: String,
        error: String,
    },
}

impl Event {
    /// Create a `processing_status` event.
    pub fn processing_status(job_id: JobId, phase: ProcessingPhase, progress: u8) -> Self {
        Event::ProcessingStatus {
            job_id,
            phase,
            progress: progress.min(100),
            message: None,
        }
    }

    /// Create a `processing_status` warning attached to a successful run.
    pub fn processing_warning(job_id: JobId, message: impl Into<String>) -> Self {
        Event::ProcessingStatus {
            job_id,
            phase: ProcessingPhase::Warning,
            progress: 100,
            message: Some(message.into()),
        }
    }

    /// Create a `processing_status` error event.
    pub fn processing_error(job_id: JobId, message: impl Into<String>) -> Self {
        Event::ProcessingStatus {
            job_id,
            phase: ProcessingPhase::Error,
            progress: 0,
            message: Some(message.into()),
        }
    }

    /// Create a `camera_status` event.
    pub fn camera_status(session_key: impl Into<String>, status: SessionStatus) -> Self {
        Event::CameraStatus {
            session_key: session_key.into(),
            status,
            message: None,
        }
    }

    /// Create a `camera_error` event.
    pub fn camera_error(session_key: impl Into<String>, error: impl Into<String>) -> Self {
        Event::CameraError {
            session_key: session_key.into(),
            error: error.into(),
        }
    }

    /// Topic name for routing and logs.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::ProcessingStatus { .. } => "processing_status",
            Event::ProcessingComplete { .. } => "processing_complete",
            Event::CameraStatus { .. } => "camera_status",
            Event::CameraFrame { .. } => "camera_frame",
            Event::CameraError { .. } => "camera_error",
        }
    }
}

/// Delivery target for an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// All subscribers
    Broadcast,
    /// Subscribers of one session key
    Session(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let ev = Event::processing_status(JobId::from_string("j1"), ProcessingPhase::Processing, 42);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"processing_status\""));
        assert!(json.contains("\"phase\":\"processing\""));
        assert!(json.contains("\"progress\":42"));
    }

    #[test]
    fn test_progress_clamped() {
        let ev = Event::processing_status(JobId::new(), ProcessingPhase::Processing, 150);
        if let Event::ProcessingStatus { progress, .. } = ev {
            assert_eq!(progress, 100);
        } else {
            panic!("expected ProcessingStatus");
        }
    }

    #[test]
    fn test_topic_names() {
        let ev = Event::camera_error("c1", "boom");
        assert_eq!(ev.topic(), "camera_error");
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"session_key\":\"c1\""));
    }
}
