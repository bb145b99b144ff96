//! Video job definitions.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a video job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
///
/// `Completed` and `Error` are terminal; there are no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting to be picked up
    #[default]
    Queued,
    /// Job is being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video processing job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Input video path
    pub source_path: PathBuf,

    /// Annotated output path
    pub output_path: PathBuf,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Progress in percent, 0..=100
    #[serde(default)]
    pub progress: u8,

    /// Failure reason, set only when `status == Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Distinct confirmed person tracks, set on completion
    #[serde(default)]
    pub person_count: u32,

    /// Distinct confirmed animal tracks, set on completion
    #[serde(default)]
    pub animal_count: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoJob {
    pub fn new(source_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            source_path: source_path.into(),
            output_path: output_path.into(),
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            person_count: 0,
            animal_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
