//! Pipeline error types.
//!
//! Propagation policy: errors local to one frame (inference failures,
//! transient reads below the retry bound) never abort a job; errors
//! opening a resource are fatal to that job only. Codec degradation and
//! persistence failures are warnings, not errors, and never appear here.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input could not be opened; fatal to the job.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The output sink could not be created or written; fatal to the job.
    #[error("output sink failed: {0}")]
    Sink(String),

    /// Reads kept failing past the retry bound; fatal to the job.
    #[error("frame read failed after {retries} retries: {message}")]
    Read { message: String, retries: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
