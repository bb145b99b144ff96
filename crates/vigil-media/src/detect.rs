//! Black-box detection adapter interface.

use async_trait::async_trait;
use thiserror::Error;

use vigil_models::RawDetection;

use crate::frame::Frame;

/// Detector-side failures. Per-frame inference failures are recovered by
/// the caller (the frame is treated as empty); they never abort a job.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Per-frame object detector (neural model behind an ONNX runtime, a remote
/// service, or a test fixture).
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError>;
}
